//! Durable storage of alerts, analyses and in-app notifications

use async_trait::async_trait;
use serde::Serialize;
use shared::{FieldHealthAnalysis, PrecisionAlert};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::notification::{InAppNotification, InAppNotificationStore};
use crate::error::{AppError, AppResult};

/// Where monitoring results are recorded
#[async_trait]
pub trait PersistenceCollaborator: Send + Sync {
    async fn save_alert(&self, alert: &PrecisionAlert) -> AppResult<()>;
    async fn save_analysis(&self, field_id: &str, analysis: &FieldHealthAnalysis) -> AppResult<Uuid>;
}

/// PostgreSQL-backed persistence
#[derive(Clone)]
pub struct PgPersistence {
    db: PgPool,
}

impl PgPersistence {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Lowercase wire name of a serde enum
fn wire_name<T: Serialize>(value: &T) -> AppResult<String> {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .ok_or_else(|| AppError::Persistence("enum did not serialize to a string".to_string()))
}

#[async_trait]
impl PersistenceCollaborator for PgPersistence {
    async fn save_alert(&self, alert: &PrecisionAlert) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO precision_alerts (
                id, field_id, alert_type, severity, message, geometry,
                action_required, resolved, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(alert.id)
        .bind(&alert.field_id)
        .bind(wire_name(&alert.alert_type)?)
        .bind(wire_name(&alert.severity)?)
        .bind(&alert.message)
        .bind(alert.geometry.as_ref().map(Json))
        .bind(alert.action_required)
        .bind(alert.resolved)
        .bind(alert.created_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn save_analysis(&self, field_id: &str, analysis: &FieldHealthAnalysis) -> AppResult<Uuid> {
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO field_analyses (id, field_id, field_health, analysis_type, payload)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id)
        .bind(field_id)
        .bind(analysis.field_health)
        .bind(wire_name(&analysis.analysis_type)?)
        .bind(Json(analysis))
        .execute(&self.db)
        .await?;

        Ok(id)
    }
}

#[async_trait]
impl InAppNotificationStore for PgPersistence {
    async fn insert_batch(&self, notifications: Vec<InAppNotification>) -> AppResult<usize> {
        if notifications.is_empty() {
            return Ok(0);
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO in_app_notifications \
             (id, user_id, field_id, alert_id, severity, title, message, is_read, created_at) ",
        );
        builder.push_values(&notifications, |mut row, n| {
            row.push_bind(n.id)
                .push_bind(&n.user_id)
                .push_bind(&n.field_id)
                .push_bind(n.alert_id)
                .push_bind(&n.severity)
                .push_bind(&n.title)
                .push_bind(&n.message)
                .push_bind(n.is_read)
                .push_bind(n.created_at);
        });

        let result = builder.build().execute(&self.db).await?;
        Ok(result.rows_affected() as usize)
    }
}
