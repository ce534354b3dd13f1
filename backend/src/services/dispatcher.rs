//! Severity-tiered alert delivery
//!
//! - critical: every synchronous channel that can reach the target, each
//!   bounded by a timeout and run in its own task
//! - high: one batched in-app insert, spawned and not awaited
//! - medium/low: not dispatched

use serde::Serialize;
use shared::{AlertSeverity, PrecisionAlert};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use super::notification::{
    format_alert_message, DispatchTarget, InAppNotification, InAppNotificationStore,
    NotificationChannel,
};

/// Outcome of one channel attempt for one alert
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelDelivery {
    pub alert_id: Uuid,
    pub channel: String,
    pub delivered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchReport {
    pub deliveries: Vec<ChannelDelivery>,
    pub in_app_queued: usize,
    pub skipped: usize,
}

impl DispatchReport {
    pub fn delivered_count(&self) -> usize {
        self.deliveries.iter().filter(|d| d.delivered).count()
    }

    pub fn failed_count(&self) -> usize {
        self.deliveries.iter().filter(|d| !d.delivered).count()
    }
}

pub struct AlertDispatcher {
    channels: Vec<Arc<dyn NotificationChannel>>,
    in_app: Option<Arc<dyn InAppNotificationStore>>,
    channel_timeout: Duration,
}

impl AlertDispatcher {
    pub fn new(channel_timeout: Duration) -> Self {
        Self {
            channels: Vec::new(),
            in_app: None,
            channel_timeout,
        }
    }

    pub fn with_channel(mut self, channel: Arc<dyn NotificationChannel>) -> Self {
        self.channels.push(channel);
        self
    }

    pub fn with_in_app_store(mut self, store: Arc<dyn InAppNotificationStore>) -> Self {
        self.in_app = Some(store);
        self
    }

    pub fn channel_names(&self) -> Vec<&'static str> {
        self.channels.iter().map(|c| c.name()).collect()
    }

    /// Deliver `alerts` to `target` according to severity
    pub async fn dispatch(&self, alerts: &[PrecisionAlert], target: &DispatchTarget) -> DispatchReport {
        let mut report = DispatchReport::default();
        let mut in_app_batch = Vec::new();

        for alert in alerts {
            match alert.severity {
                AlertSeverity::Critical => {
                    let deliveries = self.send_to_channels(alert, target).await;
                    if deliveries.is_empty() {
                        tracing::warn!(
                            alert_id = %alert.id,
                            user_id = %target.user_id,
                            "No channel can reach target for critical alert"
                        );
                    }
                    report.deliveries.extend(deliveries);
                }
                AlertSeverity::High => {
                    in_app_batch.push(InAppNotification::from_alert(&target.user_id, alert));
                }
                AlertSeverity::Medium | AlertSeverity::Low => report.skipped += 1,
            }
        }

        if !in_app_batch.is_empty() {
            match &self.in_app {
                Some(store) => {
                    report.in_app_queued = in_app_batch.len();
                    let store = store.clone();
                    tokio::spawn(async move {
                        let count = in_app_batch.len();
                        match store.insert_batch(in_app_batch).await {
                            Ok(stored) => tracing::debug!(stored, "In-app notifications stored"),
                            Err(e) => tracing::warn!(error = %e, count, "In-app notification insert failed"),
                        }
                    });
                }
                None => {
                    tracing::warn!(
                        count = in_app_batch.len(),
                        "No in-app store configured, dropping high severity notifications"
                    );
                    report.skipped += in_app_batch.len();
                }
            }
        }

        tracing::info!(
            user_id = %target.user_id,
            delivered = report.delivered_count(),
            failed = report.failed_count(),
            in_app_queued = report.in_app_queued,
            skipped = report.skipped,
            "Alert dispatch complete"
        );

        report
    }

    async fn send_to_channels(&self, alert: &PrecisionAlert, target: &DispatchTarget) -> Vec<ChannelDelivery> {
        let message = format_alert_message(alert);

        let handles: Vec<_> = self
            .channels
            .iter()
            .filter(|channel| channel.accepts(target))
            .map(|channel| {
                let channel = channel.clone();
                let target = target.clone();
                let message = message.clone();
                let timeout = self.channel_timeout;
                let name = channel.name();
                let handle = tokio::spawn(async move {
                    tokio::time::timeout(timeout, channel.send(&target, &message)).await
                });
                (name, handle)
            })
            .collect();

        let mut deliveries = Vec::with_capacity(handles.len());
        for (name, handle) in handles {
            let outcome = match handle.await {
                Ok(Ok(Ok(receipt))) => Ok(receipt.provider_message_id),
                Ok(Ok(Err(e))) => Err(e.to_string()),
                Ok(Err(_)) => Err(format!("timed out after {} ms", self.channel_timeout.as_millis())),
                Err(e) => Err(format!("channel task failed: {}", e)),
            };

            let delivery = match outcome {
                Ok(provider_message_id) => ChannelDelivery {
                    alert_id: alert.id,
                    channel: name.to_string(),
                    delivered: true,
                    provider_message_id,
                    error: None,
                },
                Err(error) => {
                    tracing::warn!(channel = name, alert_id = %alert.id, %error, "Alert delivery failed");
                    ChannelDelivery {
                        alert_id: alert.id,
                        channel: name.to_string(),
                        delivered: false,
                        provider_message_id: None,
                        error: Some(error),
                    }
                }
            };
            deliveries.push(delivery);
        }
        deliveries
    }
}
