// src/db/third_party_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::third_party::{
        AssetVisibilityMode, CompanyStatus, CreateThirdPartyCompanyPayload, ThirdPartyCompany,
        UpdateCompanyScopePayload,
    },
};

/// Acesso às empresas terceiras (tabela `third_party_companies`).
#[async_trait]
pub trait ThirdPartyStore: Send + Sync {
    async fn find_company(&self, id: Uuid) -> Result<Option<ThirdPartyCompany>, AppError>;

    async fn list_companies(&self, customer_id: Uuid) -> Result<Vec<ThirdPartyCompany>, AppError>;

    async fn create_company(
        &self,
        customer_id: Uuid,
        payload: &CreateThirdPartyCompanyPayload,
    ) -> Result<ThirdPartyCompany, AppError>;

    async fn update_scope(
        &self,
        id: Uuid,
        scope: &UpdateCompanyScopePayload,
    ) -> Result<Option<ThirdPartyCompany>, AppError>;

    async fn set_status(&self, id: Uuid, status: CompanyStatus) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct ThirdPartyRepository {
    pool: PgPool,
}

impl ThirdPartyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ThirdPartyStore for ThirdPartyRepository {
    async fn find_company(&self, id: Uuid) -> Result<Option<ThirdPartyCompany>, AppError> {
        let company = sqlx::query_as::<_, ThirdPartyCompany>(
            "SELECT * FROM third_party_companies WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(company)
    }

    async fn list_companies(&self, customer_id: Uuid) -> Result<Vec<ThirdPartyCompany>, AppError> {
        let companies = sqlx::query_as::<_, ThirdPartyCompany>(
            "SELECT * FROM third_party_companies WHERE customer_id = $1 ORDER BY name ASC",
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(companies)
    }

    async fn create_company(
        &self,
        customer_id: Uuid,
        payload: &CreateThirdPartyCompanyPayload,
    ) -> Result<ThirdPartyCompany, AppError> {
        let company = sqlx::query_as::<_, ThirdPartyCompany>(
            r#"
            INSERT INTO third_party_companies (
                customer_id, name, document_number, email, phone,
                allowed_sites, allowed_zones, asset_visibility_mode
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(customer_id)
        .bind(&payload.name)
        .bind(&payload.document_number)
        .bind(&payload.email)
        .bind(&payload.phone)
        .bind(&payload.allowed_sites)
        .bind(&payload.allowed_zones)
        .bind(payload.asset_visibility_mode.unwrap_or(AssetVisibilityMode::All))
        .fetch_one(&self.pool)
        .await?;

        Ok(company)
    }

    async fn update_scope(
        &self,
        id: Uuid,
        scope: &UpdateCompanyScopePayload,
    ) -> Result<Option<ThirdPartyCompany>, AppError> {
        let company = sqlx::query_as::<_, ThirdPartyCompany>(
            r#"
            UPDATE third_party_companies
            SET allowed_sites = $2, allowed_zones = $3, asset_visibility_mode = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&scope.allowed_sites)
        .bind(&scope.allowed_zones)
        .bind(scope.asset_visibility_mode)
        .fetch_optional(&self.pool)
        .await?;

        Ok(company)
    }

    async fn set_status(&self, id: Uuid, status: CompanyStatus) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE third_party_companies SET status = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::ResourceNotFound(format!("Empresa terceira {}", id)));
        }

        Ok(())
    }
}
