//! HTTP SMS gateway client

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{AppError, AppResult};
use crate::services::notification::{DeliveryReceipt, DispatchTarget, NotificationChannel};

/// SMS gateway client
#[derive(Clone)]
pub struct SmsGatewayClient {
    endpoint: String,
    api_key: String,
    sender_id: String,
    http_client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct SmsRequest<'a> {
    to: &'a str,
    from: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SmsResponse {
    #[serde(default, alias = "id")]
    message_id: Option<String>,
}

impl SmsGatewayClient {
    pub fn new(
        endpoint: String,
        api_key: String,
        sender_id: String,
        timeout: Duration,
    ) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Configuration(format!("SMS client build failed: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            sender_id,
            http_client,
        })
    }
}

fn delivery_error(message: String) -> AppError {
    AppError::ChannelDelivery {
        channel: "sms".to_string(),
        message,
    }
}

#[async_trait]
impl NotificationChannel for SmsGatewayClient {
    fn name(&self) -> &'static str {
        "sms"
    }

    fn accepts(&self, target: &DispatchTarget) -> bool {
        target.phone.is_some()
    }

    async fn send(&self, target: &DispatchTarget, message: &str) -> AppResult<DeliveryReceipt> {
        let phone = target
            .phone
            .as_deref()
            .ok_or_else(|| delivery_error("target has no phone number".to_string()))?;

        let response = self
            .http_client
            .post(format!("{}/messages", self.endpoint))
            .bearer_auth(&self.api_key)
            .json(&SmsRequest {
                to: phone,
                from: &self.sender_id,
                text: message,
            })
            .send()
            .await
            .map_err(|e| delivery_error(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(delivery_error(format!("gateway error: {} - {}", status, body)));
        }

        // Gateways differ in what they return; a missing id is not a failure
        let message_id = response
            .json::<SmsResponse>()
            .await
            .ok()
            .and_then(|r| r.message_id);

        Ok(DeliveryReceipt::new(self.name(), message_id))
    }
}
