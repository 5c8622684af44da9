// src/models/proposal.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// Plano de manutenção (vem de fornecedor) ou proposta de terceirizada
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "proposal_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProposalKind {
    MaintenancePlan,
    ThirdParty,
}

// em_espera -> aprovado | recusado (sem volta)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "proposal_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    EmEspera,
    Aprovado,
    Recusado,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub kind: ProposalKind,
    pub third_party_company_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    pub submitted_by: Uuid,
    pub work_order_id: Option<Uuid>,
    #[schema(example = "Plano preventivo trimestral - HVAC")]
    pub title: String,
    pub description: Option<String>,
    #[schema(example = "1500.00")]
    pub amount: Option<Decimal>,
    pub status: ProposalStatus,
    pub decided_by: Option<Uuid>,
    pub decided_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProposal {
    pub customer_id: Uuid,
    pub kind: ProposalKind,
    pub third_party_company_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    pub submitted_by: Uuid,
    pub work_order_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub amount: Option<Decimal>,
}

#[derive(Debug, Clone)]
pub struct ProposalDecision {
    pub status: ProposalStatus,
    pub decided_by: Uuid,
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitProposalPayload {
    pub customer_id: Uuid,
    pub work_order_id: Option<Uuid>,
    #[validate(length(min = 1, message = "O título é obrigatório."))]
    pub title: String,
    pub description: Option<String>,
    pub amount: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RejectProposalPayload {
    #[validate(length(min = 1, message = "Informe o motivo da recusa."))]
    pub reason: String,
}

#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct ProposalQuery {
    pub customer_id: Uuid,
    pub status: Option<ProposalStatus>,
    pub third_party_company_id: Option<Uuid>,
}
