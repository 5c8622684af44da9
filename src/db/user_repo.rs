// src/db/user_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::auth::{User, UserRole},
};

/// Para quem uma notificação pode ser entregue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipientFilter {
    /// Usuários internos do cliente com algum dos papéis.
    CustomerStaff { customer_id: Uuid, roles: Vec<UserRole> },
    /// Usuários de uma empresa terceira com algum dos papéis.
    CompanyStaff { company_id: Uuid, roles: Vec<UserRole> },
    /// Operadores de uma equipe.
    TeamOperators { team_id: Uuid },
    /// Um único usuário.
    Single { user_id: Uuid },
}

// O repositório de usuários, responsável pelas interações com a tabela 'users'
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    async fn list_recipients(&self, filter: &RecipientFilter) -> Result<Vec<User>, AppError>;

    /// Desativa todos os usuários ativos ligados à empresa; devolve quantos mudaram.
    async fn deactivate_by_company(&self, company_id: Uuid) -> Result<u64, AppError>;
}

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    // Busca um usuário pelo seu ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn list_recipients(&self, filter: &RecipientFilter) -> Result<Vec<User>, AppError> {
        let users = match filter {
            RecipientFilter::CustomerStaff { customer_id, roles } => {
                sqlx::query_as::<_, User>(
                    r#"
                    SELECT * FROM users
                    WHERE customer_id = $1
                      AND user_type = 'internal_user'
                      AND role = ANY($2)
                      AND active = TRUE
                    "#,
                )
                .bind(customer_id)
                .bind(roles)
                .fetch_all(&self.pool)
                .await?
            }
            RecipientFilter::CompanyStaff { company_id, roles } => {
                sqlx::query_as::<_, User>(
                    r#"
                    SELECT * FROM users
                    WHERE third_party_company_id = $1
                      AND role = ANY($2)
                      AND active = TRUE
                    "#,
                )
                .bind(company_id)
                .bind(roles)
                .fetch_all(&self.pool)
                .await?
            }
            RecipientFilter::TeamOperators { team_id } => {
                sqlx::query_as::<_, User>(
                    "SELECT * FROM users WHERE team_id = $1 AND role = 'operator' AND active = TRUE",
                )
                .bind(team_id)
                .fetch_all(&self.pool)
                .await?
            }
            RecipientFilter::Single { user_id } => {
                sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 AND active = TRUE")
                    .bind(user_id)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(users)
    }

    async fn deactivate_by_company(&self, company_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET active = FALSE, updated_at = NOW()
            WHERE third_party_company_id = $1 AND active = TRUE
            "#,
        )
        .bind(company_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
