// src/services/third_party_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::ThirdPartyStore,
    models::{
        audit::{AuditActor, RequestOrigin},
        auth::User,
        third_party::{
            CleanupSummary, CreateThirdPartyCompanyPayload, ModuleCleanupSummary,
            ThirdPartyCompany, UpdateCompanyScopePayload,
        },
    },
    services::{access_service::authorize_customer, cleanup_service::CleanupService},
};

// Administração das empresas terceiras pelo próprio cliente.
// O papel (admin/gerente) é checado no extrator da rota; aqui garantimos
// que é um usuário interno do mesmo cliente.
#[derive(Clone)]
pub struct ThirdPartyService {
    companies: Arc<dyn ThirdPartyStore>,
    cleanup: CleanupService,
}

impl ThirdPartyService {
    pub fn new(companies: Arc<dyn ThirdPartyStore>, cleanup: CleanupService) -> Self {
        Self { companies, cleanup }
    }

    fn ensure_customer_admin(user: &User, customer_id: Uuid) -> Result<(), AppError> {
        if user.is_third_party() {
            return Err(AppError::Forbidden);
        }
        authorize_customer(user, None, customer_id)
    }

    async fn owned_company(&self, user: &User, company_id: Uuid) -> Result<ThirdPartyCompany, AppError> {
        let company = self
            .companies
            .find_company(company_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("Empresa terceira {}", company_id)))?;
        Self::ensure_customer_admin(user, company.customer_id)?;
        Ok(company)
    }

    pub async fn create(
        &self,
        user: &User,
        customer_id: Uuid,
        payload: &CreateThirdPartyCompanyPayload,
    ) -> Result<ThirdPartyCompany, AppError> {
        Self::ensure_customer_admin(user, customer_id)?;
        let company = self.companies.create_company(customer_id, payload).await?;
        tracing::info!(company_id = %company.id, customer_id = %customer_id, "Empresa terceira criada");
        Ok(company)
    }

    pub async fn list(&self, user: &User, customer_id: Uuid) -> Result<Vec<ThirdPartyCompany>, AppError> {
        Self::ensure_customer_admin(user, customer_id)?;
        self.companies.list_companies(customer_id).await
    }

    pub async fn get(&self, user: &User, company_id: Uuid) -> Result<ThirdPartyCompany, AppError> {
        self.owned_company(user, company_id).await
    }

    pub async fn update_scope(
        &self,
        user: &User,
        company_id: Uuid,
        scope: &UpdateCompanyScopePayload,
    ) -> Result<ThirdPartyCompany, AppError> {
        self.owned_company(user, company_id).await?;
        self.companies
            .update_scope(company_id, scope)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("Empresa terceira {}", company_id)))
    }

    pub async fn deactivate(
        &self,
        user: &User,
        company_id: Uuid,
        origin: RequestOrigin,
    ) -> Result<CleanupSummary, AppError> {
        self.owned_company(user, company_id).await?;
        self.cleanup
            .deactivate_company(company_id, AuditActor::user(user.id, user.name.clone()), origin)
            .await
    }

    pub async fn reactivate(&self, user: &User, company_id: Uuid) -> Result<ThirdPartyCompany, AppError> {
        self.owned_company(user, company_id).await?;
        self.cleanup.reactivate_company(company_id).await
    }

    pub async fn disable_module(
        &self,
        user: &User,
        customer_id: Uuid,
        origin: RequestOrigin,
    ) -> Result<ModuleCleanupSummary, AppError> {
        Self::ensure_customer_admin(user, customer_id)?;
        self.cleanup
            .disable_module(customer_id, AuditActor::user(user.id, user.name.clone()), origin)
            .await
    }
}
