// src/db/audit_repo.rs

use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::audit::{NewAuditEntry, WorkOrderAuditLog},
};

/// Log de auditoria: só acrescenta, nunca atualiza nem apaga.
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn append(&self, entry: &NewAuditEntry) -> Result<WorkOrderAuditLog, AppError>;

    async fn list_for_work_order(&self, work_order_id: Uuid)
        -> Result<Vec<WorkOrderAuditLog>, AppError>;
}

#[derive(Clone)]
pub struct AuditRepository {
    pool: PgPool,
}

impl AuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditStore for AuditRepository {
    async fn append(&self, entry: &NewAuditEntry) -> Result<WorkOrderAuditLog, AppError> {
        let log = sqlx::query_as::<_, WorkOrderAuditLog>(
            r#"
            INSERT INTO work_order_audit_log (
                work_order_id, action, actor_id, actor_name,
                previous_value, new_value, description,
                ip_address, user_agent, source
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(entry.work_order_id)
        .bind(entry.action)
        .bind(entry.actor.id)
        .bind(&entry.actor.name)
        .bind(entry.previous_value.clone().map(Json))
        .bind(entry.new_value.clone().map(Json))
        .bind(&entry.description)
        .bind(&entry.origin.ip_address)
        .bind(&entry.origin.user_agent)
        .bind(entry.origin.source)
        .fetch_one(&self.pool)
        .await?;

        Ok(log)
    }

    async fn list_for_work_order(
        &self,
        work_order_id: Uuid,
    ) -> Result<Vec<WorkOrderAuditLog>, AppError> {
        let logs = sqlx::query_as::<_, WorkOrderAuditLog>(
            "SELECT * FROM work_order_audit_log WHERE work_order_id = $1 ORDER BY created_at ASC",
        )
        .bind(work_order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }
}
