// src/models/third_party.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::auth::UserRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "company_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CompanyStatus {
    Active,
    Inactive,
}

// ALL: vê todos os equipamentos do escopo.
// CONTRACT_ONLY: vê apenas equipamentos contratados explicitamente com a empresa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "asset_visibility_mode", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetVisibilityMode {
    All,
    ContractOnly,
}

// ---
// ThirdPartyCompany (A "Terceirizada")
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ThirdPartyCompany {
    pub id: Uuid,
    pub customer_id: Uuid,
    #[schema(example = "Clima Frio Manutenções Ltda")]
    pub name: String,
    #[schema(example = "12.345.678/0001-99")]
    pub document_number: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: CompanyStatus,
    /// Lista vazia = sem restrição (todas as unidades).
    pub allowed_sites: Vec<Uuid>,
    /// Lista vazia = sem restrição (todas as zonas).
    pub allowed_zones: Vec<Uuid>,
    pub asset_visibility_mode: AssetVisibilityMode,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ThirdPartyCompany {
    pub fn is_active(&self) -> bool {
        self.status == CompanyStatus::Active
    }
}

// ---
// ThirdPartyContext
// ---
// Derivado da empresa uma vez por requisição e nunca alterado depois.
// Viaja explicitamente pelos handlers (extensão da requisição + extrator).
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ThirdPartyContext {
    pub company_id: Uuid,
    pub customer_id: Uuid,
    pub allowed_sites: Vec<Uuid>,
    pub allowed_zones: Vec<Uuid>,
    pub asset_visibility_mode: AssetVisibilityMode,
    pub role: UserRole,
}

impl ThirdPartyContext {
    pub fn from_company(company: &ThirdPartyCompany, role: UserRole) -> Self {
        Self {
            company_id: company.id,
            customer_id: company.customer_id,
            allowed_sites: company.allowed_sites.clone(),
            allowed_zones: company.allowed_zones.clone(),
            asset_visibility_mode: company.asset_visibility_mode,
            role,
        }
    }

    pub fn allows_site(&self, site_id: Uuid) -> bool {
        self.allowed_sites.is_empty() || self.allowed_sites.contains(&site_id)
    }

    pub fn allows_zone(&self, zone_id: Uuid) -> bool {
        self.allowed_zones.is_empty() || self.allowed_zones.contains(&zone_id)
    }

    /// Sob CONTRACT_ONLY uma lista de contratados vazia significa "negado",
    /// ao contrário das listas de unidades/zonas.
    pub fn allows_asset(&self, contracted_third_party_ids: &[Uuid]) -> bool {
        match self.asset_visibility_mode {
            AssetVisibilityMode::All => true,
            AssetVisibilityMode::ContractOnly => contracted_third_party_ids.contains(&self.company_id),
        }
    }
}

// ---
// Payloads de administração
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateThirdPartyCompanyPayload {
    #[validate(length(min = 1, message = "O nome da empresa é obrigatório."))]
    pub name: String,
    pub document_number: Option<String>,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub allowed_sites: Vec<Uuid>,
    #[serde(default)]
    pub allowed_zones: Vec<Uuid>,
    pub asset_visibility_mode: Option<AssetVisibilityMode>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCompanyScopePayload {
    pub allowed_sites: Vec<Uuid>,
    pub allowed_zones: Vec<Uuid>,
    pub asset_visibility_mode: AssetVisibilityMode,
}

// Resultado do cascateamento de uma empresa
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CleanupSummary {
    pub cancelled_work_orders: u64,
    pub deactivated_users: u64,
}

// Resultado da desativação do módulo inteiro para um cliente
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModuleCleanupSummary {
    pub cancelled_work_orders: u64,
    pub deactivated_users: u64,
    pub companies_processed: usize,
    pub failed_companies: Vec<Uuid>,
    pub module_disabled: bool,
}
