//! Notification seams for alert delivery
//!
//! Synchronous channels (LINE chat, SMS) implement [`NotificationChannel`];
//! the batched in-app store implements [`InAppNotificationStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{AlertSeverity, PrecisionAlert};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::AppResult;

/// Who an alert is delivered to
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchTarget {
    pub user_id: String,
    pub chat_id: Option<String>,
    pub phone: Option<String>,
}

/// Provider acknowledgement of a delivered message
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryReceipt {
    pub channel: String,
    pub provider_message_id: Option<String>,
    pub delivered_at: DateTime<Utc>,
}

impl DeliveryReceipt {
    pub fn new(channel: &str, provider_message_id: Option<String>) -> Self {
        Self {
            channel: channel.to_string(),
            provider_message_id,
            delivered_at: Utc::now(),
        }
    }
}

/// A synchronous delivery channel
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Stable channel name used in logs and dispatch reports
    fn name(&self) -> &'static str;

    /// Whether the target has an address this channel can deliver to
    fn accepts(&self, target: &DispatchTarget) -> bool;

    async fn send(&self, target: &DispatchTarget, message: &str) -> AppResult<DeliveryReceipt>;
}

/// In-app notification row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InAppNotification {
    pub id: Uuid,
    pub user_id: String,
    pub field_id: String,
    pub alert_id: Uuid,
    pub severity: String,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl InAppNotification {
    pub fn from_alert(user_id: &str, alert: &PrecisionAlert) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            field_id: alert.field_id.clone(),
            alert_id: alert.id,
            severity: alert.severity.to_string(),
            title: alert.title(),
            message: alert.message.clone(),
            is_read: false,
            created_at: Utc::now(),
        }
    }
}

/// Batched in-app notification sink
#[async_trait]
pub trait InAppNotificationStore: Send + Sync {
    /// Insert all notifications in one batch, returning how many were stored
    async fn insert_batch(&self, notifications: Vec<InAppNotification>) -> AppResult<usize>;
}

/// Text sent over chat and SMS channels
pub fn format_alert_message(alert: &PrecisionAlert) -> String {
    let prefix = match alert.severity {
        AlertSeverity::Critical => "[URGENT] ",
        _ => "",
    };
    format!("{}{}\n\n{}", prefix, alert.title(), alert.message)
}
