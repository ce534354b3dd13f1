//! LINE Messaging API push client

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{AppError, AppResult};
use crate::services::notification::{DeliveryReceipt, DispatchTarget, NotificationChannel};

const DEFAULT_API_BASE: &str = "https://api.line.me";

/// LINE Messaging API client
#[derive(Clone)]
pub struct LineMessagingClient {
    channel_access_token: String,
    api_base: String,
    http_client: reqwest::Client,
}

/// LINE message types
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum LineMessage {
    #[serde(rename = "text")]
    Text { text: String },
}

/// LINE push message request
#[derive(Debug, Serialize)]
struct LinePushRequest<'a> {
    to: &'a str,
    messages: Vec<LineMessage>,
}

/// LINE API error body
#[derive(Debug, Deserialize)]
struct LineApiResponse {
    #[serde(default)]
    message: Option<String>,
}

impl LineMessagingClient {
    /// Create a new LINE messaging client
    pub fn new(channel_access_token: String, timeout: Duration) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Configuration(format!("LINE client build failed: {}", e)))?;

        Ok(Self {
            channel_access_token,
            api_base: DEFAULT_API_BASE.to_string(),
            http_client,
        })
    }

    /// Point the client at a different API host
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Send a push message to a LINE user or group
    pub async fn send_push_message(
        &self,
        to: &str,
        message: LineMessage,
    ) -> AppResult<Option<String>> {
        let request = LinePushRequest {
            to,
            messages: vec![message],
        };

        let response = self
            .http_client
            .post(format!("{}/v2/bot/message/push", self.api_base))
            .bearer_auth(&self.channel_access_token)
            .json(&request)
            .send()
            .await
            .map_err(|e| delivery_error(format!("failed to send LINE message: {}", e)))?;

        if response.status().is_success() {
            let request_id = response
                .headers()
                .get("x-line-request-id")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            Ok(request_id)
        } else {
            let status = response.status();
            let error: LineApiResponse = response
                .json()
                .await
                .unwrap_or(LineApiResponse { message: None });
            Err(delivery_error(format!(
                "{}: {}",
                status,
                error.message.unwrap_or_else(|| "Unknown error".to_string())
            )))
        }
    }
}

fn delivery_error(message: String) -> AppError {
    AppError::ChannelDelivery {
        channel: "line".to_string(),
        message,
    }
}

#[async_trait]
impl NotificationChannel for LineMessagingClient {
    fn name(&self) -> &'static str {
        "line"
    }

    fn accepts(&self, target: &DispatchTarget) -> bool {
        target.chat_id.is_some()
    }

    async fn send(&self, target: &DispatchTarget, message: &str) -> AppResult<DeliveryReceipt> {
        let chat_id = target
            .chat_id
            .as_deref()
            .ok_or_else(|| delivery_error("target has no chat id".to_string()))?;

        let message_id = self
            .send_push_message(chat_id, LineMessage::Text { text: message.to_string() })
            .await?;

        Ok(DeliveryReceipt::new(self.name(), message_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_request_shape() {
        let request = LinePushRequest {
            to: "U123",
            messages: vec![LineMessage::Text { text: "hello".to_string() }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["to"], "U123");
        assert_eq!(json["messages"][0]["type"], "text");
        assert_eq!(json["messages"][0]["text"], "hello");
    }

    #[test]
    fn test_accepts_only_chat_targets() {
        let client = LineMessagingClient::new("token".to_string(), Duration::from_secs(1)).unwrap();
        let mut target = DispatchTarget {
            user_id: "u1".to_string(),
            ..Default::default()
        };
        assert!(!client.accepts(&target));
        target.chat_id = Some("U123".to_string());
        assert!(client.accepts(&target));
    }
}
