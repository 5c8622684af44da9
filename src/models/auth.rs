// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

// ---
// Tipo de usuário
// ---
// Substitui as comparações de string ("third_party_user"...) por um enum
// fechado: quem decide o que fazer com cada tipo é o `match`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    InternalUser,
    ThirdPartyUser,
    SupplierUser,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Manager,
    TeamLeader,
    Operator,
    Viewer,
}

impl UserRole {
    /// Papéis que recebem avisos de gestão (planos, propostas, atribuições à empresa).
    pub const SUPERVISORS: [UserRole; 3] = [UserRole::Admin, UserRole::Manager, UserRole::TeamLeader];
}

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub customer_id: Option<Uuid>,
    #[schema(example = "joao@empresa.com.br")]
    pub email: String,
    #[schema(example = "João da Silva")]
    pub name: String,
    pub user_type: UserType,
    pub role: UserRole,
    pub third_party_company_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    pub team_id: Option<Uuid>,

    #[serde(skip_serializing)] // Token de push nunca sai na API
    pub push_token: Option<String>,
    pub push_enabled: bool,

    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_third_party(&self) -> bool {
        matches!(self.user_type, UserType::ThirdPartyUser)
    }
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // Subject (ID do usuário)
    pub exp: usize, // Expiration time (quando o token expira)
    pub iat: usize, // Issued At (quando o token foi criado)
}
