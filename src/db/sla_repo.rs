// src/db/sla_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    models::sla::{SlaAggregate, SlaFilter, SlaGroupAggregate, SlaGrouping, SlaScope},
};

/// Agregações de SLA (somente leitura, sem efeitos colaterais).
#[async_trait]
pub trait SlaStore: Send + Sync {
    async fn aggregate(&self, scope: SlaScope, filter: &SlaFilter) -> Result<SlaAggregate, AppError>;

    async fn aggregate_grouped(
        &self,
        scope: SlaScope,
        grouping: SlaGrouping,
        filter: &SlaFilter,
    ) -> Result<Vec<SlaGroupAggregate>, AppError>;
}

// As regras de no prazo / atrasado / pendente, escritas uma vez em SQL.
// Atraso é derivado de status + due_date + completed_at; nada é armazenado.
const AGGREGATE_COLUMNS: &str = r#"
    COUNT(*) FILTER (
        WHERE wo.status = 'concluida'
          AND (wo.due_date IS NULL OR wo.completed_at <= wo.due_date)
    ) AS on_time,
    COUNT(*) FILTER (
        WHERE wo.status = 'vencida'
           OR (wo.status = 'concluida' AND wo.due_date IS NOT NULL AND wo.completed_at > wo.due_date)
    ) AS late,
    COUNT(*) FILTER (
        WHERE wo.status IN ('aberta', 'em_execucao', 'pausada')
    ) AS pending,
    (AVG(EXTRACT(EPOCH FROM (wo.started_at - wo.created_at)) / 60.0)
        FILTER (WHERE wo.started_at IS NOT NULL))::float8 AS avg_response_minutes,
    (AVG(EXTRACT(EPOCH FROM (wo.completed_at - wo.started_at)) / 60.0)
        FILTER (WHERE wo.started_at IS NOT NULL AND wo.completed_at IS NOT NULL))::float8 AS avg_completion_minutes
"#;

// $1 = id do escopo, $2/$3 = período, $4 = módulo, $5 = cliente
const FILTER_CLAUSE: &str = r#"
      AND ($5::uuid IS NULL OR wo.customer_id = $5)
      AND ($2::timestamptz IS NULL OR wo.created_at >= $2)
      AND ($3::timestamptz IS NULL OR wo.created_at <= $3)
      AND ($4::text IS NULL OR wo.module = $4)
"#;

fn scope_column(scope: SlaScope) -> (&'static str, uuid::Uuid) {
    match scope {
        SlaScope::Customer(id) => ("wo.customer_id", id),
        SlaScope::ThirdPartyCompany(id) => ("wo.third_party_company_id", id),
        SlaScope::Team(id) => ("wo.assigned_team_id", id),
        SlaScope::Operator(id) => ("wo.assigned_operator_id", id),
    }
}

// (colunas de grupo, JOIN, condição extra, GROUP BY)
fn grouping_parts(grouping: SlaGrouping) -> (&'static str, &'static str, &'static str) {
    match grouping {
        SlaGrouping::ThirdPartyCompany => (
            "wo.third_party_company_id AS group_id, g.name AS group_name",
            "LEFT JOIN third_party_companies g ON g.id = wo.third_party_company_id",
            "AND wo.third_party_company_id IS NOT NULL",
        ),
        SlaGrouping::Team => (
            "wo.assigned_team_id AS group_id, g.name AS group_name",
            "LEFT JOIN teams g ON g.id = wo.assigned_team_id",
            "AND wo.assigned_team_id IS NOT NULL",
        ),
        SlaGrouping::Operator => (
            "wo.assigned_operator_id AS group_id, g.name AS group_name",
            "LEFT JOIN users g ON g.id = wo.assigned_operator_id",
            "AND wo.assigned_operator_id IS NOT NULL",
        ),
        SlaGrouping::ExecutionType => (
            "NULL::uuid AS group_id, wo.executed_by_type::text AS group_name",
            "",
            "",
        ),
    }
}

#[derive(Clone)]
pub struct SlaRepository {
    pool: PgPool,
}

impl SlaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SlaStore for SlaRepository {
    async fn aggregate(&self, scope: SlaScope, filter: &SlaFilter) -> Result<SlaAggregate, AppError> {
        let (column, scope_id) = scope_column(scope);

        let sql = format!(
            "SELECT {AGGREGATE_COLUMNS} FROM work_orders wo WHERE {column} = $1 {FILTER_CLAUSE}"
        );

        let aggregate = sqlx::query_as::<_, SlaAggregate>(&sql)
            .bind(scope_id)
            .bind(filter.from)
            .bind(filter.to)
            .bind(&filter.module)
            .bind(filter.customer_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(aggregate)
    }

    async fn aggregate_grouped(
        &self,
        scope: SlaScope,
        grouping: SlaGrouping,
        filter: &SlaFilter,
    ) -> Result<Vec<SlaGroupAggregate>, AppError> {
        let (column, scope_id) = scope_column(scope);
        let (group_columns, join, condition) = grouping_parts(grouping);

        let sql = format!(
            r#"
            SELECT {group_columns}, {AGGREGATE_COLUMNS}
            FROM work_orders wo
            {join}
            WHERE {column} = $1 {condition} {FILTER_CLAUSE}
            GROUP BY 1, 2
            ORDER BY 2 ASC
            "#
        );

        let rows = sqlx::query_as::<_, SlaGroupAggregate>(&sql)
            .bind(scope_id)
            .bind(filter.from)
            .bind(filter.to)
            .bind(&filter.module)
            .bind(filter.customer_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }
}
