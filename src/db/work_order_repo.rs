// src/db/work_order_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::work_order::{NewWorkOrder, WorkOrder, WorkOrderFilter, WorkOrderStatus},
};

#[async_trait]
pub trait WorkOrderStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<WorkOrder>, AppError>;

    async fn list(&self, filter: &WorkOrderFilter) -> Result<Vec<WorkOrder>, AppError>;

    async fn insert(&self, new: &NewWorkOrder) -> Result<WorkOrder, AppError>;

    /// Grava o estado completo da ordem. Última escrita vence.
    async fn save(&self, work_order: &WorkOrder) -> Result<WorkOrder, AppError>;

    /// Ordens em aberto (aberta, em_execucao, pausada) atribuídas à empresa.
    async fn list_open_by_company(&self, company_id: Uuid) -> Result<Vec<WorkOrder>, AppError>;

    /// Cancela em lote as que ainda estão abertas; devolve quantas mudaram.
    async fn cancel_many(&self, ids: &[Uuid], reason: &str) -> Result<u64, AppError>;
}

#[derive(Clone)]
pub struct WorkOrderRepository {
    pool: PgPool,
}

impl WorkOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WorkOrderStore for WorkOrderRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<WorkOrder>, AppError> {
        let work_order = sqlx::query_as::<_, WorkOrder>("SELECT * FROM work_orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(work_order)
    }

    async fn list(&self, filter: &WorkOrderFilter) -> Result<Vec<WorkOrder>, AppError> {
        let work_orders = sqlx::query_as::<_, WorkOrder>(
            r#"
            SELECT * FROM work_orders
            WHERE customer_id = $1
              AND ($2::uuid IS NULL OR third_party_company_id = $2)
              AND ($3::work_order_status IS NULL OR status = $3)
              AND ($4::uuid IS NULL OR site_id = $4)
              AND ($5::uuid IS NULL OR zone_id = $5)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filter.customer_id)
        .bind(filter.third_party_company_id)
        .bind(filter.status)
        .bind(filter.site_id)
        .bind(filter.zone_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(work_orders)
    }

    async fn insert(&self, new: &NewWorkOrder) -> Result<WorkOrder, AppError> {
        let work_order = sqlx::query_as::<_, WorkOrder>(
            r#"
            INSERT INTO work_orders (
                customer_id, site_id, zone_id, equipment_id, module,
                title, description, due_date, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(new.customer_id)
        .bind(new.site_id)
        .bind(new.zone_id)
        .bind(new.equipment_id)
        .bind(&new.module)
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.due_date)
        .bind(new.created_by)
        .fetch_one(&self.pool)
        .await?;

        Ok(work_order)
    }

    async fn save(&self, wo: &WorkOrder) -> Result<WorkOrder, AppError> {
        let work_order = sqlx::query_as::<_, WorkOrder>(
            r#"
            UPDATE work_orders SET
                title = $2, description = $3, status = $4, executed_by_type = $5,
                third_party_company_id = $6, assigned_team_id = $7, assigned_operator_id = $8,
                due_date = $9, started_at = $10, paused_at = $11, completed_at = $12,
                cancelled_at = $13, cancellation_reason = $14,
                evaluation_score = $15, evaluation_comment = $16,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(wo.id)
        .bind(&wo.title)
        .bind(&wo.description)
        .bind(wo.status)
        .bind(wo.executed_by_type)
        .bind(wo.third_party_company_id)
        .bind(wo.assigned_team_id)
        .bind(wo.assigned_operator_id)
        .bind(wo.due_date)
        .bind(wo.started_at)
        .bind(wo.paused_at)
        .bind(wo.completed_at)
        .bind(wo.cancelled_at)
        .bind(&wo.cancellation_reason)
        .bind(wo.evaluation_score)
        .bind(&wo.evaluation_comment)
        .fetch_optional(&self.pool)
        .await?;

        work_order.ok_or_else(|| AppError::ResourceNotFound(format!("Ordem de serviço {}", wo.id)))
    }

    async fn list_open_by_company(&self, company_id: Uuid) -> Result<Vec<WorkOrder>, AppError> {
        let open: Vec<WorkOrderStatus> = WorkOrderStatus::OPEN.to_vec();

        let work_orders = sqlx::query_as::<_, WorkOrder>(
            "SELECT * FROM work_orders WHERE third_party_company_id = $1 AND status = ANY($2)",
        )
        .bind(company_id)
        .bind(open)
        .fetch_all(&self.pool)
        .await?;

        Ok(work_orders)
    }

    async fn cancel_many(&self, ids: &[Uuid], reason: &str) -> Result<u64, AppError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let open: Vec<WorkOrderStatus> = WorkOrderStatus::OPEN.to_vec();

        let result = sqlx::query(
            r#"
            UPDATE work_orders
            SET status = 'cancelada', cancelled_at = NOW(), cancellation_reason = $2, updated_at = NOW()
            WHERE id = ANY($1) AND status = ANY($3)
            "#,
        )
        .bind(ids)
        .bind(reason)
        .bind(open)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
