// src/db/proposal_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::proposal::{NewProposal, Proposal, ProposalDecision, ProposalQuery},
};

#[async_trait]
pub trait ProposalStore: Send + Sync {
    async fn insert(&self, new: &NewProposal) -> Result<Proposal, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Proposal>, AppError>;

    async fn list(&self, query: &ProposalQuery) -> Result<Vec<Proposal>, AppError>;

    /// Grava a decisão apenas se a proposta ainda estiver em espera.
    /// `None` quando outra decisão chegou antes.
    async fn decide(&self, id: Uuid, decision: &ProposalDecision)
        -> Result<Option<Proposal>, AppError>;
}

#[derive(Clone)]
pub struct ProposalRepository {
    pool: PgPool,
}

impl ProposalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProposalStore for ProposalRepository {
    async fn insert(&self, new: &NewProposal) -> Result<Proposal, AppError> {
        let proposal = sqlx::query_as::<_, Proposal>(
            r#"
            INSERT INTO proposals (
                customer_id, kind, third_party_company_id, supplier_id,
                submitted_by, work_order_id, title, description, amount
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(new.customer_id)
        .bind(new.kind)
        .bind(new.third_party_company_id)
        .bind(new.supplier_id)
        .bind(new.submitted_by)
        .bind(new.work_order_id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.amount)
        .fetch_one(&self.pool)
        .await?;

        Ok(proposal)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Proposal>, AppError> {
        let proposal = sqlx::query_as::<_, Proposal>("SELECT * FROM proposals WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(proposal)
    }

    async fn list(&self, query: &ProposalQuery) -> Result<Vec<Proposal>, AppError> {
        let proposals = sqlx::query_as::<_, Proposal>(
            r#"
            SELECT * FROM proposals
            WHERE customer_id = $1
              AND ($2::proposal_status IS NULL OR status = $2)
              AND ($3::uuid IS NULL OR third_party_company_id = $3)
            ORDER BY created_at DESC
            "#,
        )
        .bind(query.customer_id)
        .bind(query.status)
        .bind(query.third_party_company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(proposals)
    }

    async fn decide(
        &self,
        id: Uuid,
        decision: &ProposalDecision,
    ) -> Result<Option<Proposal>, AppError> {
        // O filtro por 'em_espera' garante que só a primeira decisão vale
        let proposal = sqlx::query_as::<_, Proposal>(
            r#"
            UPDATE proposals
            SET status = $2, decided_by = $3, decided_at = NOW(),
                rejection_reason = $4, updated_at = NOW()
            WHERE id = $1 AND status = 'em_espera'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(decision.status)
        .bind(decision.decided_by)
        .bind(&decision.rejection_reason)
        .fetch_optional(&self.pool)
        .await?;

        Ok(proposal)
    }
}
