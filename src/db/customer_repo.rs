// src/db/customer_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{common::error::AppError, models::customer::Customer};

#[async_trait]
pub trait CustomerStore: Send + Sync {
    async fn find_customer(&self, id: Uuid) -> Result<Option<Customer>, AppError>;

    async fn set_third_party_enabled(&self, id: Uuid, enabled: bool) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomerStore for CustomerRepository {
    async fn find_customer(&self, id: Uuid) -> Result<Option<Customer>, AppError> {
        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(customer)
    }

    async fn set_third_party_enabled(&self, id: Uuid, enabled: bool) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE customers SET third_party_enabled = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(enabled)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::ResourceNotFound(format!("Cliente {}", id)));
        }

        Ok(())
    }
}
