// src/models/location.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// Hierarquia física do cliente: Unidade (site) -> Zona -> Equipamento

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: Uuid,
    pub customer_id: Uuid,
    #[schema(example = "Unidade Centro")]
    pub name: String,
    #[schema(example = "facilities")]
    pub module: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub site_id: Uuid,
    #[schema(example = "Subsolo - Casa de Máquinas")]
    pub name: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Equipment {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub zone_id: Uuid,
    #[schema(example = "Chiller 02")]
    pub name: String,
    #[schema(example = "CH-02")]
    pub code: Option<String>,
    /// Empresas terceiras com contrato sobre este equipamento (usado em CONTRACT_ONLY).
    pub contracted_third_party_ids: Vec<Uuid>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

// Parâmetros das listagens (query string)
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct LocationQuery {
    pub customer_id: Uuid,
    pub site_id: Option<Uuid>,
    pub zone_id: Option<Uuid>,
    pub module: Option<String>,
}
