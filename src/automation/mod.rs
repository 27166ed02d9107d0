pub mod conversation;
pub mod engine;
pub mod state;
