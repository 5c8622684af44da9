// src/models/audit.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{types::Json, FromRow};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "audit_action", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Created,
    Updated,
    StatusChanged,
    Assigned,
    ExecutionStarted,
    ExecutionPaused,
    ExecutionResumed,
    Completed,
    Evaluated,
    Commented,
    Reopened,
    Cancelled,
    Approved,
    Rejected,
    AttachmentAdded,
}

// Canal de origem da ação
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "audit_source", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AuditSource {
    #[default]
    Web,
    Mobile,
    Api,
    System,
}

/// Registro imutável: uma linha por evento, nunca atualizada nem apagada.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrderAuditLog {
    pub id: Uuid,
    pub work_order_id: Uuid,
    pub action: AuditAction,
    pub actor_id: Option<Uuid>,
    #[schema(example = "Sistema")]
    pub actor_name: String,
    #[schema(value_type = Option<Object>)]
    pub previous_value: Option<Json<Value>>,
    #[schema(value_type = Option<Object>)]
    pub new_value: Option<Json<Value>>,
    pub description: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub source: AuditSource,
    pub created_at: DateTime<Utc>,
}

// Quem fez a ação
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditActor {
    pub id: Option<Uuid>,
    pub name: String,
}

impl AuditActor {
    pub const SYSTEM_NAME: &'static str = "Sistema";

    pub fn system() -> Self {
        Self { id: None, name: Self::SYSTEM_NAME.to_string() }
    }

    pub fn user(id: Uuid, name: impl Into<String>) -> Self {
        Self { id: Some(id), name: name.into() }
    }
}

// De onde veio a requisição
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOrigin {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub source: AuditSource,
}

impl RequestOrigin {
    pub fn system() -> Self {
        Self { ip_address: None, user_agent: None, source: AuditSource::System }
    }
}

// O que o AuditService entrega ao repositório
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub work_order_id: Uuid,
    pub action: AuditAction,
    pub actor: AuditActor,
    pub previous_value: Option<Value>,
    pub new_value: Option<Value>,
    pub description: String,
    pub origin: RequestOrigin,
}
