use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::api::provider::AiProvider;
use crate::api::types::{
    AnalysisReply, AnalyzeImageResponse, ChatReply, LoginResponse, SendMessageRequest,
    SendMessageResponse, VerifyResponse,
};
use crate::config::ApiConfig;
use crate::errors::{ScreenLoopError, ScreenLoopResult};

/// HTTP client for the remote AI service. Holds the bearer token behind a
/// lock so a re-login does not require rebuilding the client.
pub struct HttpApiClient {
    base_url: String,
    client: reqwest::Client,
    auth_token: RwLock<Option<String>>,
}

impl HttpApiClient {
    pub fn new(config: &ApiConfig) -> ScreenLoopResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("screenloop/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            auth_token: RwLock::new(None),
        })
    }

    pub async fn set_token(&self, token: String) {
        *self.auth_token.write().await = Some(token);
    }

    async fn token(&self) -> ScreenLoopResult<String> {
        self.auth_token
            .read()
            .await
            .clone()
            .ok_or_else(|| ScreenLoopError::Auth("not authenticated".into()))
    }

    pub async fn login(&self, username: &str, password: &str) -> ScreenLoopResult<()> {
        let url = format!("{}/auth/login", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ScreenLoopError::Auth(format!("login failed: {status}: {body}")));
        }

        let result: LoginResponse = response.json().await?;
        match result.access_token {
            Some(token) => {
                self.set_token(token).await;
                tracing::info!("login successful");
                Ok(())
            }
            None => Err(ScreenLoopError::Auth(
                result.detail.unwrap_or_else(|| "login rejected".into()),
            )),
        }
    }

    pub async fn logout(&self) {
        *self.auth_token.write().await = None;
        tracing::info!("logged out");
    }

    pub async fn verify_token(&self) -> ScreenLoopResult<VerifyResponse> {
        let token = self.token().await?;
        let url = format!("{}/auth/verify", self.base_url);
        let response = self.client.get(&url).bearer_auth(&token).send().await?;

        if !response.status().is_success() {
            return Err(ScreenLoopError::Auth(format!(
                "token verification failed: HTTP {}",
                response.status()
            )));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl AiProvider for HttpApiClient {
    async fn send_message(
        &self,
        message: &str,
        previous_response_id: Option<&str>,
    ) -> ScreenLoopResult<ChatReply> {
        let token = self.token().await?;
        let url = format!("{}/chat/send", self.base_url);
        let body = SendMessageRequest {
            message,
            previous_response_id,
        };

        tracing::debug!(
            url = %url,
            has_context = previous_response_id.is_some(),
            chars = message.len(),
            "sending chat message"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let err_body = response.text().await.unwrap_or_default();
            return Err(ScreenLoopError::Api(format!("{status}: {err_body}")));
        }

        let result: SendMessageResponse = response.json().await?;
        match result.response {
            Some(text) => {
                tracing::info!(
                    response_id = ?result.response_id,
                    tokens = ?result.tokens_used,
                    "chat reply received"
                );
                Ok(ChatReply {
                    text,
                    response_id: result.response_id,
                    tokens_used: result.tokens_used,
                    model: result.model,
                })
            }
            None => Err(ScreenLoopError::Api(
                result.detail.unwrap_or_else(|| "empty chat response".into()),
            )),
        }
    }

    async fn analyze_image(&self, png: &[u8], prompt: &str) -> ScreenLoopResult<AnalysisReply> {
        let token = self.token().await?;
        let url = format!("{}/image/analyze", self.base_url);

        let file_part = reqwest::multipart::Part::bytes(png.to_vec())
            .file_name("screenshot.png")
            .mime_str("image/png")?;
        let form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("prompt", prompt.to_string());

        tracing::debug!(url = %url, bytes = png.len(), "submitting screenshot for analysis");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let err_body = response.text().await.unwrap_or_default();
            return Err(ScreenLoopError::Api(format!("{status}: {err_body}")));
        }

        let result: AnalyzeImageResponse = response.json().await?;
        match result.analysis {
            Some(text) => {
                tracing::info!(
                    model = ?result.model,
                    tokens = ?result.tokens_used,
                    "image analysis received"
                );
                Ok(AnalysisReply {
                    text,
                    model: result.model,
                    tokens_used: result.tokens_used,
                })
            }
            None => Err(ScreenLoopError::Api(
                result.error.unwrap_or_else(|| "analysis failed".into()),
            )),
        }
    }
}
