use async_trait::async_trait;

use crate::api::types::{AnalysisReply, ChatReply};
use crate::errors::ScreenLoopResult;

/// Boundary to the remote AI service. The scheduler does not care how the
/// image travels or which model answers; it only needs these two calls.
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Sends a conversational message. `previous_response_id` carries the
    /// context token from the prior exchange, or `None` for a fresh context.
    async fn send_message(
        &self,
        message: &str,
        previous_response_id: Option<&str>,
    ) -> ScreenLoopResult<ChatReply>;

    /// Submits a PNG screenshot for analysis under the given prompt.
    async fn analyze_image(&self, png: &[u8], prompt: &str) -> ScreenLoopResult<AnalysisReply>;
}
