// src/models/sla.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// Recorte sobre o qual as métricas são calculadas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlaScope {
    Customer(Uuid),
    ThirdPartyCompany(Uuid),
    Team(Uuid),
    Operator(Uuid),
}

// Eixo de agrupamento dos relatórios
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlaGrouping {
    ThirdPartyCompany,
    Team,
    Operator,
    ExecutionType,
}

// Período (sobre created_at), módulo e cliente opcionais.
// `customer_id` prende escopos de equipe/operador ao cliente de quem pergunta.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlaFilter {
    pub customer_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub module: Option<String>,
}

/// Contagens cruas vindas do banco (ou da agregação em memória).
#[derive(Debug, Clone, Copy, Default, PartialEq, FromRow)]
pub struct SlaAggregate {
    pub on_time: i64,
    pub late: i64,
    pub pending: i64,
    pub avg_response_minutes: Option<f64>,
    pub avg_completion_minutes: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct SlaGroupAggregate {
    pub group_id: Option<Uuid>,
    pub group_name: Option<String>,
    #[sqlx(flatten)]
    pub aggregate: SlaAggregate,
}

// --- Respostas da API ---

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SlaMetrics {
    pub total: i64,
    pub on_time: i64,
    pub late: i64,
    pub pending: i64,
    #[schema(example = "75.00")]
    pub sla_percentage: Decimal,
    pub avg_response_time_minutes: Option<f64>,
    pub avg_completion_time_minutes: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SlaGroupMetrics {
    pub group_id: Option<Uuid>,
    pub group_name: Option<String>,
    #[serde(flatten)]
    pub metrics: SlaMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionComparison {
    pub internal: SlaMetrics,
    pub third_party: SlaMetrics,
}

#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct SlaQuery {
    pub customer_id: Uuid,
    pub third_party_company_id: Option<Uuid>,
    pub team_id: Option<Uuid>,
    pub operator_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub module: Option<String>,
}

impl SlaQuery {
    pub fn filter(&self) -> SlaFilter {
        SlaFilter {
            customer_id: Some(self.customer_id),
            from: self.from,
            to: self.to,
            module: self.module.clone(),
        }
    }
}
