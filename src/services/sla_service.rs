// src/services/sla_service.rs

use std::sync::Arc;

use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::SlaStore,
    models::{
        auth::User,
        sla::{
            ExecutionComparison, SlaAggregate, SlaFilter, SlaGroupAggregate, SlaGroupMetrics,
            SlaGrouping, SlaMetrics, SlaQuery, SlaScope,
        },
        third_party::ThirdPartyContext,
        work_order::{WorkOrder, WorkOrderStatus},
    },
    services::access_service::authorize_customer,
};

// Classificação de uma ordem para fins de SLA
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlaOutcome {
    OnTime,
    Late,
    Pending,
    /// Cancelada: não entra em nenhuma conta.
    Excluded,
}

/// no prazo: concluida e (sem prazo ou concluída até o prazo)
/// atrasada: vencida, ou concluida depois do prazo
pub fn classify_work_order(wo: &WorkOrder) -> SlaOutcome {
    match wo.status {
        WorkOrderStatus::Concluida => match (wo.due_date, wo.completed_at) {
            (None, _) => SlaOutcome::OnTime,
            (Some(due), Some(done)) if done <= due => SlaOutcome::OnTime,
            (Some(_), Some(_)) => SlaOutcome::Late,
            // Concluída sem data de conclusão: a comparação SQL (NULL <= due)
            // não é verdadeira em nenhum dos lados.
            (Some(_), None) => SlaOutcome::Excluded,
        },
        WorkOrderStatus::Vencida => SlaOutcome::Late,
        WorkOrderStatus::Aberta | WorkOrderStatus::EmExecucao | WorkOrderStatus::Pausada => {
            SlaOutcome::Pending
        }
        WorkOrderStatus::Cancelada => SlaOutcome::Excluded,
    }
}

/// Mesma agregação que o SQL com FILTER faz, sobre ordens já carregadas.
pub fn aggregate_work_orders<'a, I>(work_orders: I) -> SlaAggregate
where
    I: IntoIterator<Item = &'a WorkOrder>,
{
    let mut aggregate = SlaAggregate::default();
    let mut response_sum = 0.0;
    let mut response_count = 0u32;
    let mut completion_sum = 0.0;
    let mut completion_count = 0u32;

    for wo in work_orders {
        match classify_work_order(wo) {
            SlaOutcome::OnTime => aggregate.on_time += 1,
            SlaOutcome::Late => aggregate.late += 1,
            SlaOutcome::Pending => aggregate.pending += 1,
            SlaOutcome::Excluded => {}
        }

        if let Some(started) = wo.started_at {
            response_sum += minutes_between(wo.created_at, started);
            response_count += 1;

            if let Some(completed) = wo.completed_at {
                completion_sum += minutes_between(started, completed);
                completion_count += 1;
            }
        }
    }

    aggregate.avg_response_minutes =
        (response_count > 0).then(|| response_sum / f64::from(response_count));
    aggregate.avg_completion_minutes =
        (completion_count > 0).then(|| completion_sum / f64::from(completion_count));

    aggregate
}

fn minutes_between(start: chrono::DateTime<chrono::Utc>, end: chrono::DateTime<chrono::Utc>) -> f64 {
    (end - start).num_milliseconds() as f64 / 60_000.0
}

/// round(onTime / total * 100, 2). Período vazio conta como 100% (aprovação vacuosa).
pub fn calculate_sla_percentage(on_time: i64, total: i64) -> Decimal {
    if total <= 0 {
        return Decimal::ONE_HUNDRED;
    }

    (Decimal::from(on_time) * Decimal::ONE_HUNDRED / Decimal::from(total))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn round_minutes(value: Option<f64>) -> Option<f64> {
    value.map(|v| (v * 100.0).round() / 100.0)
}

impl From<SlaAggregate> for SlaMetrics {
    fn from(aggregate: SlaAggregate) -> Self {
        // Só estados terminais (concluida/vencida) entram na razão
        let total = aggregate.on_time + aggregate.late;
        SlaMetrics {
            total,
            on_time: aggregate.on_time,
            late: aggregate.late,
            pending: aggregate.pending,
            sla_percentage: calculate_sla_percentage(aggregate.on_time, total),
            avg_response_time_minutes: round_minutes(aggregate.avg_response_minutes),
            avg_completion_time_minutes: round_minutes(aggregate.avg_completion_minutes),
        }
    }
}

impl From<SlaGroupAggregate> for SlaGroupMetrics {
    fn from(row: SlaGroupAggregate) -> Self {
        SlaGroupMetrics {
            group_id: row.group_id,
            group_name: row.group_name,
            metrics: row.aggregate.into(),
        }
    }
}

// ---
// O serviço
// ---
// Só leitura: pode ser chamado em paralelo e repetidamente sem efeitos.
#[derive(Clone)]
pub struct SlaService {
    store: Arc<dyn SlaStore>,
}

impl SlaService {
    pub fn new(store: Arc<dyn SlaStore>) -> Self {
        Self { store }
    }

    pub async fn metrics(&self, scope: SlaScope, filter: &SlaFilter) -> Result<SlaMetrics, AppError> {
        let aggregate = self.store.aggregate(scope, filter).await?;
        Ok(aggregate.into())
    }

    pub async fn customer_metrics(
        &self,
        customer_id: Uuid,
        filter: &SlaFilter,
    ) -> Result<SlaMetrics, AppError> {
        self.metrics(SlaScope::Customer(customer_id), filter).await
    }

    pub async fn grouped(
        &self,
        scope: SlaScope,
        grouping: SlaGrouping,
        filter: &SlaFilter,
    ) -> Result<Vec<SlaGroupMetrics>, AppError> {
        let rows = self.store.aggregate_grouped(scope, grouping, filter).await?;
        Ok(rows.into_iter().map(SlaGroupMetrics::from).collect())
    }

    pub async fn by_third_party_company(
        &self,
        scope: SlaScope,
        filter: &SlaFilter,
    ) -> Result<Vec<SlaGroupMetrics>, AppError> {
        self.grouped(scope, SlaGrouping::ThirdPartyCompany, filter).await
    }

    pub async fn by_team(
        &self,
        scope: SlaScope,
        filter: &SlaFilter,
    ) -> Result<Vec<SlaGroupMetrics>, AppError> {
        self.grouped(scope, SlaGrouping::Team, filter).await
    }

    pub async fn by_operator(
        &self,
        scope: SlaScope,
        filter: &SlaFilter,
    ) -> Result<Vec<SlaGroupMetrics>, AppError> {
        self.grouped(scope, SlaGrouping::Operator, filter).await
    }

    /// Interno x terceirizado. Um lado sem ordens aparece com 100% e zeros.
    pub async fn internal_vs_third_party(
        &self,
        scope: SlaScope,
        filter: &SlaFilter,
    ) -> Result<ExecutionComparison, AppError> {
        let rows = self
            .store
            .aggregate_grouped(scope, SlaGrouping::ExecutionType, filter)
            .await?;

        let pick = |label: &str| {
            rows.iter()
                .find(|row| row.group_name.as_deref() == Some(label))
                .map(|row| row.aggregate)
                .unwrap_or_default()
        };

        Ok(ExecutionComparison {
            internal: pick("INTERNAL").into(),
            third_party: pick("THIRD_PARTY").into(),
        })
    }
}

/// Escopo efetivo de uma consulta de SLA. O mais específico vence
/// (operador > equipe > empresa > cliente); terceiros ficam presos à própria empresa.
pub fn resolve_scope(
    user: &User,
    context: Option<&ThirdPartyContext>,
    query: &SlaQuery,
) -> Result<SlaScope, AppError> {
    authorize_customer(user, context, query.customer_id)?;

    if let Some(ctx) = context {
        return Ok(SlaScope::ThirdPartyCompany(ctx.company_id));
    }

    Ok(match (query.operator_id, query.team_id, query.third_party_company_id) {
        (Some(operator), _, _) => SlaScope::Operator(operator),
        (None, Some(team), _) => SlaScope::Team(team),
        (None, None, Some(company)) => SlaScope::ThirdPartyCompany(company),
        (None, None, None) => SlaScope::Customer(query.customer_id),
    })
}
