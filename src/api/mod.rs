pub mod http_client;
pub mod provider;
pub mod types;
