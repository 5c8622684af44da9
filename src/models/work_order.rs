// src/models/work_order.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// --- Enums ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "work_order_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WorkOrderStatus {
    Aberta,
    EmExecucao,
    Pausada,
    Vencida,
    Concluida,
    Cancelada,
}

impl WorkOrderStatus {
    /// Estados que ainda contam como "pendentes" (ordem em aberto).
    pub const OPEN: [WorkOrderStatus; 3] = [
        WorkOrderStatus::Aberta,
        WorkOrderStatus::EmExecucao,
        WorkOrderStatus::Pausada,
    ];

    pub fn is_open(self) -> bool {
        Self::OPEN.contains(&self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WorkOrderStatus::Aberta => "aberta",
            WorkOrderStatus::EmExecucao => "em_execucao",
            WorkOrderStatus::Pausada => "pausada",
            WorkOrderStatus::Vencida => "vencida",
            WorkOrderStatus::Concluida => "concluida",
            WorkOrderStatus::Cancelada => "cancelada",
        }
    }

    /// Tabela de transições permitidas do ciclo de vida.
    pub fn can_transition_to(self, next: WorkOrderStatus) -> bool {
        use WorkOrderStatus::*;
        matches!(
            (self, next),
            (Aberta, EmExecucao)
                | (EmExecucao, Pausada)
                | (Pausada, EmExecucao)
                | (EmExecucao, Concluida)
                | (Aberta | EmExecucao | Pausada | Vencida, Cancelada)
                | (Concluida | Cancelada | Vencida, Aberta)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "executed_by_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutedByType {
    Internal,
    ThirdParty,
}

// --- Ordem de Serviço ---
// Atraso/no prazo é sempre derivado de status + due_date + completed_at, nunca armazenado.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrder {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub site_id: Option<Uuid>,
    pub zone_id: Option<Uuid>,
    pub equipment_id: Option<Uuid>,
    pub module: Option<String>,
    #[schema(example = "Troca de filtro do chiller")]
    pub title: String,
    pub description: Option<String>,
    pub status: WorkOrderStatus,
    pub executed_by_type: ExecutedByType,
    pub third_party_company_id: Option<Uuid>,
    pub assigned_team_id: Option<Uuid>,
    pub assigned_operator_id: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub paused_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub evaluation_score: Option<i16>,
    pub evaluation_comment: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Dados para inserir uma nova ordem (status inicial sempre "aberta")
#[derive(Debug, Clone)]
pub struct NewWorkOrder {
    pub customer_id: Uuid,
    pub site_id: Option<Uuid>,
    pub zone_id: Option<Uuid>,
    pub equipment_id: Option<Uuid>,
    pub module: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,
}

// Filtro de listagem
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct WorkOrderFilter {
    pub customer_id: Uuid,
    pub third_party_company_id: Option<Uuid>,
    pub status: Option<WorkOrderStatus>,
    pub site_id: Option<Uuid>,
    pub zone_id: Option<Uuid>,
}

// --- Payloads ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkOrderPayload {
    pub customer_id: Uuid,
    pub site_id: Option<Uuid>,
    pub zone_id: Option<Uuid>,
    pub equipment_id: Option<Uuid>,
    pub module: Option<String>,
    #[validate(length(min = 1, message = "O título é obrigatório."))]
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

// Edição dos dados descritivos (status tem endpoints próprios)
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWorkOrderPayload {
    #[validate(length(min = 1, message = "O título não pode ser vazio."))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

// A atribuição pode apontar para uma empresa terceira, uma equipe ou um operador.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignWorkOrderPayload {
    pub third_party_company_id: Option<Uuid>,
    pub team_id: Option<Uuid>,
    pub operator_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CancelWorkOrderPayload {
    #[validate(length(min = 1, message = "Informe o motivo do cancelamento."))]
    pub reason: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentPayload {
    #[validate(length(min = 1, message = "O comentário não pode ser vazio."))]
    pub comment: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateWorkOrderPayload {
    #[validate(range(min = 1, max = 5, message = "A nota deve estar entre 1 e 5."))]
    pub score: i16,
    pub comment: Option<String>,
}
