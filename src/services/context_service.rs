// src/services/context_service.rs

use std::sync::Arc;

use crate::{
    common::error::AppError,
    db::ThirdPartyStore,
    models::{
        auth::{User, UserType},
        third_party::ThirdPartyContext,
    },
};

// Carrega o contexto de isolamento de um usuário terceiro.
#[derive(Clone)]
pub struct ContextService {
    companies: Arc<dyn ThirdPartyStore>,
}

impl ContextService {
    pub fn new(companies: Arc<dyn ThirdPartyStore>) -> Self {
        Self { companies }
    }

    /// `Ok(None)` para quem não é terceiro. Empresa ausente ou inativa falha
    /// fechado (403 com código próprio); erro de infraestrutura sobe como 500.
    pub async fn load_third_party_context(
        &self,
        user: &User,
    ) -> Result<Option<ThirdPartyContext>, AppError> {
        match user.user_type {
            UserType::InternalUser | UserType::SupplierUser => Ok(None),
            UserType::ThirdPartyUser => {
                let company_id = user
                    .third_party_company_id
                    .ok_or(AppError::ThirdPartyCompanyNotFound)?;

                let company = self
                    .companies
                    .find_company(company_id)
                    .await?
                    .ok_or(AppError::ThirdPartyCompanyNotFound)?;

                if !company.is_active() {
                    tracing::warn!(user_id = %user.id, company_id = %company.id, "Acesso de terceiro com empresa inativa");
                    return Err(AppError::ThirdPartyCompanyInactive);
                }

                Ok(Some(ThirdPartyContext::from_company(&company, user.role)))
            }
        }
    }
}
