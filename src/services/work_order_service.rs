// src/services/work_order_service.rs

use std::{collections::HashSet, sync::Arc};

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

use crate::{
    common::error::AppError,
    db::{LocationStore, ThirdPartyStore, UserStore, WorkOrderStore},
    models::{
        audit::{AuditAction, AuditActor, RequestOrigin, WorkOrderAuditLog},
        auth::User,
        third_party::{AssetVisibilityMode, ThirdPartyContext},
        work_order::{
            AssignWorkOrderPayload, CreateWorkOrderPayload, EvaluateWorkOrderPayload,
            ExecutedByType, NewWorkOrder, UpdateWorkOrderPayload, WorkOrder, WorkOrderFilter,
            WorkOrderStatus,
        },
    },
    services::{
        access_service::{
            authorize_customer, validate_third_party_data_access, validate_requested_scope,
            RequestedScope, ResourceRef,
        },
        audit_service::{AuditEvent, AuditService},
        notification_service::{NotificationEvent, NotificationService},
    },
};

/// Comandos do ciclo de vida. Cada um é uma transição da tabela de status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleCommand {
    Start,
    Pause,
    Resume,
    Complete,
    Cancel { reason: String },
    Reopen,
}

impl LifecycleCommand {
    pub fn target(&self) -> WorkOrderStatus {
        match self {
            LifecycleCommand::Start | LifecycleCommand::Resume => WorkOrderStatus::EmExecucao,
            LifecycleCommand::Pause => WorkOrderStatus::Pausada,
            LifecycleCommand::Complete => WorkOrderStatus::Concluida,
            LifecycleCommand::Cancel { .. } => WorkOrderStatus::Cancelada,
            LifecycleCommand::Reopen => WorkOrderStatus::Aberta,
        }
    }

    fn audit_action(&self) -> AuditAction {
        match self {
            LifecycleCommand::Start => AuditAction::ExecutionStarted,
            LifecycleCommand::Pause => AuditAction::ExecutionPaused,
            LifecycleCommand::Resume => AuditAction::ExecutionResumed,
            LifecycleCommand::Complete => AuditAction::Completed,
            LifecycleCommand::Cancel { .. } => AuditAction::Cancelled,
            LifecycleCommand::Reopen => AuditAction::Reopened,
        }
    }

    // Cancelar e reabrir são decisões do cliente, não de quem executa.
    fn requires_internal(&self) -> bool {
        matches!(self, LifecycleCommand::Cancel { .. } | LifecycleCommand::Reopen)
    }

    // Quais mudanças avisam os supervisores do cliente
    fn notifies(&self) -> bool {
        matches!(
            self,
            LifecycleCommand::Complete | LifecycleCommand::Cancel { .. } | LifecycleCommand::Reopen
        )
    }
}

fn actor_of(user: &User) -> AuditActor {
    AuditActor::user(user.id, user.name.clone())
}

fn require_internal(user: &User) -> Result<(), AppError> {
    if user.is_third_party() {
        Err(AppError::Forbidden)
    } else {
        Ok(())
    }
}

fn snapshot(wo: &WorkOrder) -> serde_json::Value {
    serde_json::to_value(wo).unwrap_or_default()
}

#[derive(Clone)]
pub struct WorkOrderService {
    work_orders: Arc<dyn WorkOrderStore>,
    locations: Arc<dyn LocationStore>,
    companies: Arc<dyn ThirdPartyStore>,
    users: Arc<dyn UserStore>,
    audit: AuditService,
    notifications: NotificationService,
}

impl WorkOrderService {
    pub fn new(
        work_orders: Arc<dyn WorkOrderStore>,
        locations: Arc<dyn LocationStore>,
        companies: Arc<dyn ThirdPartyStore>,
        users: Arc<dyn UserStore>,
        audit: AuditService,
        notifications: NotificationService,
    ) -> Self {
        Self { work_orders, locations, companies, users, audit, notifications }
    }

    // ---
    // Visibilidade
    // ---
    // Terceiro só enxerga ordens da própria empresa, dentro do escopo
    // (unidade, zona e, para equipamentos, o modo de visibilidade).
    async fn ensure_visible(
        &self,
        user: &User,
        context: Option<&ThirdPartyContext>,
        wo: &WorkOrder,
    ) -> Result<(), AppError> {
        authorize_customer(user, context, wo.customer_id)?;

        let Some(ctx) = context else {
            return Ok(());
        };

        if wo.third_party_company_id != Some(ctx.company_id) {
            return Err(AppError::DataAccessDenied(
                "ordem atribuída a outra empresa".into(),
            ));
        }

        let equipment = match wo.equipment_id {
            Some(id) => self.locations.find_equipment(id).await?,
            None => None,
        };

        validate_third_party_data_access(
            Some(ctx),
            &ResourceRef {
                customer_id: wo.customer_id,
                site_id: wo.site_id,
                zone_id: wo.zone_id,
                contracted_third_party_ids: equipment
                    .as_ref()
                    .map(|e| e.contracted_third_party_ids.as_slice()),
            },
        )
        .into_result()
    }

    async fn load_visible(
        &self,
        user: &User,
        context: Option<&ThirdPartyContext>,
        id: Uuid,
    ) -> Result<WorkOrder, AppError> {
        let wo = self
            .work_orders
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("Ordem de serviço {}", id)))?;
        self.ensure_visible(user, context, &wo).await?;
        Ok(wo)
    }

    pub async fn get(
        &self,
        user: &User,
        context: Option<&ThirdPartyContext>,
        id: Uuid,
    ) -> Result<WorkOrder, AppError> {
        self.load_visible(user, context, id).await
    }

    pub async fn list(
        &self,
        user: &User,
        context: Option<&ThirdPartyContext>,
        mut filter: WorkOrderFilter,
    ) -> Result<Vec<WorkOrder>, AppError> {
        authorize_customer(user, context, filter.customer_id)?;

        let Some(ctx) = context else {
            return self.work_orders.list(&filter).await;
        };

        validate_requested_scope(
            Some(ctx),
            &RequestedScope {
                customer_id: Some(filter.customer_id),
                site_id: filter.site_id,
                zone_id: filter.zone_id,
            },
        )?;

        filter.third_party_company_id = Some(ctx.company_id);
        let rows = self.work_orders.list(&filter).await?;

        let rows: Vec<WorkOrder> = rows
            .into_iter()
            .filter(|wo| wo.site_id.is_none_or(|s| ctx.allows_site(s)))
            .filter(|wo| wo.zone_id.is_none_or(|z| ctx.allows_zone(z)))
            .collect();

        if ctx.asset_visibility_mode == AssetVisibilityMode::All {
            return Ok(rows);
        }

        // CONTRACT_ONLY: ordem de equipamento não contratado some da lista
        let equipment_ids: Vec<Uuid> = rows.iter().filter_map(|wo| wo.equipment_id).collect();
        let contracted: HashSet<Uuid> = self
            .locations
            .find_equipment_many(&equipment_ids)
            .await?
            .into_iter()
            .filter(|e| ctx.allows_asset(&e.contracted_third_party_ids))
            .map(|e| e.id)
            .collect();

        Ok(rows
            .into_iter()
            .filter(|wo| wo.equipment_id.is_none_or(|id| contracted.contains(&id)))
            .collect())
    }

    pub async fn create(
        &self,
        user: &User,
        context: Option<&ThirdPartyContext>,
        payload: CreateWorkOrderPayload,
        origin: RequestOrigin,
    ) -> Result<WorkOrder, AppError> {
        require_internal(user)?;
        authorize_customer(user, context, payload.customer_id)?;

        let new = NewWorkOrder {
            customer_id: payload.customer_id,
            site_id: payload.site_id,
            zone_id: payload.zone_id,
            equipment_id: payload.equipment_id,
            module: payload.module,
            title: payload.title,
            description: payload.description,
            due_date: payload.due_date,
            created_by: Some(user.id),
        };
        let wo = self.work_orders.insert(&new).await?;

        self.audit
            .record(
                AuditEvent::new(wo.id, AuditAction::Created, actor_of(user), origin)
                    .values(None, Some(snapshot(&wo))),
            )
            .await
            .log();

        tracing::info!(work_order_id = %wo.id, customer_id = %wo.customer_id, "Ordem de serviço criada");
        Ok(wo)
    }

    pub async fn update(
        &self,
        user: &User,
        context: Option<&ThirdPartyContext>,
        id: Uuid,
        payload: UpdateWorkOrderPayload,
        origin: RequestOrigin,
    ) -> Result<WorkOrder, AppError> {
        require_internal(user)?;
        let before = self.load_visible(user, context, id).await?;

        let mut next = before.clone();
        if let Some(title) = payload.title {
            next.title = title;
        }
        if payload.description.is_some() {
            next.description = payload.description;
        }
        if payload.due_date.is_some() {
            next.due_date = payload.due_date;
        }

        let saved = self.work_orders.save(&next).await?;
        if let Some(effect) = self
            .audit
            .record_update(saved.id, actor_of(user), &snapshot(&before), &snapshot(&saved), origin)
            .await
        {
            effect.log();
        }
        Ok(saved)
    }

    pub async fn assign(
        &self,
        user: &User,
        context: Option<&ThirdPartyContext>,
        id: Uuid,
        payload: AssignWorkOrderPayload,
        origin: RequestOrigin,
    ) -> Result<WorkOrder, AppError> {
        require_internal(user)?;

        if payload.third_party_company_id.is_none()
            && payload.team_id.is_none()
            && payload.operator_id.is_none()
        {
            let mut err = ValidationError::new("assignment_target");
            err.message = Some("Informe uma empresa, equipe ou operador.".into());
            let mut errors = ValidationErrors::new();
            errors.add("thirdPartyCompanyId", err);
            return Err(AppError::ValidationError(errors));
        }

        let before = self.load_visible(user, context, id).await?;
        let mut next = before.clone();

        if let Some(company_id) = payload.third_party_company_id {
            let company = self
                .companies
                .find_company(company_id)
                .await?
                .filter(|c| c.customer_id == before.customer_id)
                .ok_or(AppError::ThirdPartyCompanyNotFound)?;
            if !company.is_active() {
                return Err(AppError::ThirdPartyCompanyInactive);
            }
            next.third_party_company_id = Some(company.id);
            next.executed_by_type = ExecutedByType::ThirdParty;
        } else {
            next.third_party_company_id = None;
            next.executed_by_type = ExecutedByType::Internal;
        }

        if let Some(operator_id) = payload.operator_id {
            self.users
                .find_by_id(operator_id)
                .await?
                .filter(|u| u.active)
                .ok_or_else(|| AppError::ResourceNotFound(format!("Operador {}", operator_id)))?;
        }
        next.assigned_team_id = payload.team_id;
        next.assigned_operator_id = payload.operator_id;

        let saved = self.work_orders.save(&next).await?;

        let assignment = |wo: &WorkOrder| {
            json!({
                "thirdPartyCompanyId": wo.third_party_company_id,
                "assignedTeamId": wo.assigned_team_id,
                "assignedOperatorId": wo.assigned_operator_id,
                "executedByType": wo.executed_by_type,
            })
        };
        self.audit
            .record(
                AuditEvent::new(saved.id, AuditAction::Assigned, actor_of(user), origin)
                    .values(Some(assignment(&before)), Some(assignment(&saved))),
            )
            .await
            .log();

        if let Some(company_id) = saved.third_party_company_id {
            self.notifications
                .dispatch(NotificationEvent::WorkOrderAssignedToCompany {
                    company_id,
                    work_order_id: saved.id,
                    title: saved.title.clone(),
                })
                .await;
        }
        match (saved.assigned_operator_id, saved.assigned_team_id) {
            (Some(operator_id), _) => {
                self.notifications
                    .dispatch(NotificationEvent::WorkOrderAssignedToOperator {
                        operator_id,
                        work_order_id: saved.id,
                        title: saved.title.clone(),
                    })
                    .await;
            }
            (None, Some(team_id)) => {
                self.notifications
                    .dispatch(NotificationEvent::WorkOrderAssignedToTeam {
                        team_id,
                        work_order_id: saved.id,
                        title: saved.title.clone(),
                    })
                    .await;
            }
            (None, None) => {}
        }

        Ok(saved)
    }

    pub async fn transition(
        &self,
        user: &User,
        context: Option<&ThirdPartyContext>,
        id: Uuid,
        command: LifecycleCommand,
        origin: RequestOrigin,
    ) -> Result<WorkOrder, AppError> {
        if command.requires_internal() {
            require_internal(user)?;
        }

        let before = self.load_visible(user, context, id).await?;
        let target = command.target();

        if !before.status.can_transition_to(target) {
            return Err(AppError::InvalidStatusTransition { from: before.status, to: target });
        }

        let now = Utc::now();
        let mut next = before.clone();
        next.status = target;

        match &command {
            LifecycleCommand::Start => {
                next.started_at = before.started_at.or(Some(now));
                next.paused_at = None;
            }
            LifecycleCommand::Pause => next.paused_at = Some(now),
            LifecycleCommand::Resume => next.paused_at = None,
            LifecycleCommand::Complete => {
                next.completed_at = Some(now);
                next.paused_at = None;
            }
            LifecycleCommand::Cancel { reason } => {
                next.cancelled_at = Some(now);
                next.cancellation_reason = Some(reason.clone());
            }
            LifecycleCommand::Reopen => {
                next.started_at = None;
                next.paused_at = None;
                next.completed_at = None;
                next.cancelled_at = None;
                next.cancellation_reason = None;
                next.evaluation_score = None;
                next.evaluation_comment = None;
            }
        }

        let saved = self.work_orders.save(&next).await?;

        let mut event = AuditEvent::new(saved.id, command.audit_action(), actor_of(user), origin)
            .values(
                Some(json!({ "status": before.status })),
                Some(json!({ "status": saved.status })),
            );
        if let LifecycleCommand::Cancel { reason } = &command {
            event = event.description(format!("Ordem de serviço cancelada: {}", reason));
        }
        self.audit.record(event).await.log();

        if command.notifies() {
            self.notifications
                .dispatch(NotificationEvent::WorkOrderStatusChanged {
                    customer_id: saved.customer_id,
                    work_order_id: saved.id,
                    title: saved.title.clone(),
                    status: saved.status,
                })
                .await;
        }

        Ok(saved)
    }

    pub async fn comment(
        &self,
        user: &User,
        context: Option<&ThirdPartyContext>,
        id: Uuid,
        comment: String,
        origin: RequestOrigin,
    ) -> Result<WorkOrderAuditLog, AppError> {
        let wo = self.load_visible(user, context, id).await?;
        let event = AuditEvent::new(wo.id, AuditAction::Commented, actor_of(user), origin)
            .values(None, Some(json!({ "comment": comment })))
            .description(comment);

        // O comentário só existe no log: aqui a falha precisa aparecer.
        self.audit.record(event).await.log().ok_or_else(|| {
            AppError::InternalServerError(anyhow::anyhow!("comentário não registrado"))
        })
    }

    pub async fn evaluate(
        &self,
        user: &User,
        context: Option<&ThirdPartyContext>,
        id: Uuid,
        payload: EvaluateWorkOrderPayload,
        origin: RequestOrigin,
    ) -> Result<WorkOrder, AppError> {
        require_internal(user)?;
        let before = self.load_visible(user, context, id).await?;

        if before.status != WorkOrderStatus::Concluida {
            return Err(AppError::InvalidStatusTransition {
                from: before.status,
                to: WorkOrderStatus::Concluida,
            });
        }

        let mut next = before.clone();
        next.evaluation_score = Some(payload.score);
        next.evaluation_comment = payload.comment;
        let saved = self.work_orders.save(&next).await?;

        self.audit
            .record(
                AuditEvent::new(saved.id, AuditAction::Evaluated, actor_of(user), origin).values(
                    Some(json!({ "evaluationScore": before.evaluation_score })),
                    Some(json!({
                        "evaluationScore": saved.evaluation_score,
                        "evaluationComment": saved.evaluation_comment,
                    })),
                ),
            )
            .await
            .log();

        Ok(saved)
    }

    pub async fn history(
        &self,
        user: &User,
        context: Option<&ThirdPartyContext>,
        id: Uuid,
    ) -> Result<Vec<WorkOrderAuditLog>, AppError> {
        let wo = self.load_visible(user, context, id).await?;
        self.audit.history(wo.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::{fixtures, MemoryStore};
    use crate::models::{
        auth::{UserRole, UserType},
        notification::NotificationType,
        third_party::{AssetVisibilityMode, CompanyStatus},
    };

    struct Setup {
        store: Arc<MemoryStore>,
        service: WorkOrderService,
        customer: Uuid,
        manager: User,
    }

    fn setup() -> Setup {
        let store = MemoryStore::new();
        let audit = AuditService::new(store.clone());
        let notifications = NotificationService::new(store.clone(), store.clone(), None, 4);
        let service = WorkOrderService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            audit,
            notifications,
        );
        let customer = Uuid::new_v4();
        let manager = fixtures::user(customer, UserType::InternalUser, UserRole::Manager);
        store.add_user(manager.clone());
        Setup { store, service, customer, manager }
    }

    fn create_payload(customer_id: Uuid) -> CreateWorkOrderPayload {
        CreateWorkOrderPayload {
            customer_id,
            site_id: None,
            zone_id: None,
            equipment_id: None,
            module: Some("hvac".into()),
            title: "Troca de filtro".into(),
            description: None,
            due_date: None,
        }
    }

    #[tokio::test]
    async fn full_lifecycle_is_audited() {
        let s = setup();
        let origin = RequestOrigin::default();
        let wo = s
            .service
            .create(&s.manager, None, create_payload(s.customer), origin.clone())
            .await
            .unwrap();
        assert_eq!(wo.status, WorkOrderStatus::Aberta);

        for command in [
            LifecycleCommand::Start,
            LifecycleCommand::Pause,
            LifecycleCommand::Resume,
            LifecycleCommand::Complete,
        ] {
            s.service
                .transition(&s.manager, None, wo.id, command, origin.clone())
                .await
                .unwrap();
        }

        let done = s.store.work_order(wo.id);
        assert_eq!(done.status, WorkOrderStatus::Concluida);
        assert!(done.started_at.is_some());
        assert!(done.completed_at.is_some());
        assert!(done.paused_at.is_none());

        let history = s.service.history(&s.manager, None, wo.id).await.unwrap();
        let actions: Vec<AuditAction> = history.iter().map(|l| l.action).collect();
        assert_eq!(
            actions,
            vec![
                AuditAction::Created,
                AuditAction::ExecutionStarted,
                AuditAction::ExecutionPaused,
                AuditAction::ExecutionResumed,
                AuditAction::Completed,
            ]
        );
        assert!(history.iter().all(|l| l.actor_id == Some(s.manager.id)));
    }

    #[tokio::test]
    async fn invalid_transitions_are_rejected() {
        let s = setup();
        let wo = fixtures::work_order(s.customer);
        s.store.add_work_order(wo.clone());

        let err = s
            .service
            .transition(&s.manager, None, wo.id, LifecycleCommand::Complete, RequestOrigin::default())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_STATUS_TRANSITION");
        assert_eq!(s.store.audit_count(), 0);
    }

    #[tokio::test]
    async fn cancel_and_reopen() {
        let s = setup();
        let wo = fixtures::work_order(s.customer);
        s.store.add_work_order(wo.clone());

        let cancelled = s
            .service
            .transition(
                &s.manager,
                None,
                wo.id,
                LifecycleCommand::Cancel { reason: "Duplicada".into() },
                RequestOrigin::default(),
            )
            .await
            .unwrap();
        assert_eq!(cancelled.status, WorkOrderStatus::Cancelada);
        assert_eq!(cancelled.cancellation_reason.as_deref(), Some("Duplicada"));

        let reopened = s
            .service
            .transition(&s.manager, None, wo.id, LifecycleCommand::Reopen, RequestOrigin::default())
            .await
            .unwrap();
        assert_eq!(reopened.status, WorkOrderStatus::Aberta);
        assert!(reopened.cancellation_reason.is_none());

        let history = s.service.history(&s.manager, None, wo.id).await.unwrap();
        assert_eq!(history[0].description, "Ordem de serviço cancelada: Duplicada");
        assert_eq!(history[1].action, AuditAction::Reopened);
    }

    #[tokio::test]
    async fn assignment_to_company_notifies_its_supervisors() {
        let s = setup();
        let company = fixtures::company(s.customer);
        s.store.add_company(company.clone());
        let leader = fixtures::third_party_user(&company, UserRole::TeamLeader);
        s.store.add_user(leader.clone());

        let wo = fixtures::work_order(s.customer);
        s.store.add_work_order(wo.clone());

        let assigned = s
            .service
            .assign(
                &s.manager,
                None,
                wo.id,
                AssignWorkOrderPayload { third_party_company_id: Some(company.id), ..Default::default() },
                RequestOrigin::default(),
            )
            .await
            .unwrap();

        assert_eq!(assigned.executed_by_type, ExecutedByType::ThirdParty);
        assert_eq!(assigned.third_party_company_id, Some(company.id));
        let inbox = s.store.notifications_for(leader.id);
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].notification_type, NotificationType::WorkOrderAssigned);
        assert_eq!(s.store.audit_count(), 1);
    }

    #[tokio::test]
    async fn assignment_needs_a_target_and_an_active_company() {
        let s = setup();
        let wo = fixtures::work_order(s.customer);
        s.store.add_work_order(wo.clone());

        let err = s
            .service
            .assign(&s.manager, None, wo.id, AssignWorkOrderPayload::default(), RequestOrigin::default())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");

        let mut company = fixtures::company(s.customer);
        company.status = CompanyStatus::Inactive;
        s.store.add_company(company.clone());
        let err = s
            .service
            .assign(
                &s.manager,
                None,
                wo.id,
                AssignWorkOrderPayload { third_party_company_id: Some(company.id), ..Default::default() },
                RequestOrigin::default(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "THIRD_PARTY_COMPANY_INACTIVE");
    }

    #[tokio::test]
    async fn operator_assignment_notifies_the_operator() {
        let s = setup();
        let mut operator = fixtures::user(s.customer, UserType::InternalUser, UserRole::Operator);
        operator.team_id = Some(Uuid::new_v4());
        s.store.add_user(operator.clone());
        let wo = fixtures::work_order(s.customer);
        s.store.add_work_order(wo.clone());

        let assigned = s
            .service
            .assign(
                &s.manager,
                None,
                wo.id,
                AssignWorkOrderPayload { operator_id: Some(operator.id), team_id: operator.team_id, ..Default::default() },
                RequestOrigin::default(),
            )
            .await
            .unwrap();
        assert_eq!(assigned.executed_by_type, ExecutedByType::Internal);
        assert_eq!(s.store.notifications_for(operator.id).len(), 1);
    }

    #[tokio::test]
    async fn third_party_sees_only_own_company_inside_scope() {
        let s = setup();
        let site_in = Uuid::new_v4();
        let mut company = fixtures::company(s.customer);
        company.allowed_sites = vec![site_in];
        s.store.add_company(company.clone());
        let other = fixtures::company(s.customer);

        let operator = fixtures::third_party_user(&company, UserRole::Operator);
        let ctx = ThirdPartyContext::from_company(&company, UserRole::Operator);

        let mut mine = fixtures::company_work_order(&company, WorkOrderStatus::Aberta);
        mine.site_id = Some(site_in);
        let mut out_of_scope = fixtures::company_work_order(&company, WorkOrderStatus::Aberta);
        out_of_scope.site_id = Some(Uuid::new_v4());
        let theirs = fixtures::company_work_order(&other, WorkOrderStatus::Aberta);
        for wo in [&mine, &out_of_scope, &theirs] {
            s.store.add_work_order(wo.clone());
        }

        let list = s
            .service
            .list(&operator, Some(&ctx), WorkOrderFilter { customer_id: s.customer, ..Default::default() })
            .await
            .unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, mine.id);

        assert!(s.service.get(&operator, Some(&ctx), mine.id).await.is_ok());
        assert_eq!(
            s.service.get(&operator, Some(&ctx), theirs.id).await.unwrap_err().code(),
            "DATA_ACCESS_DENIED"
        );
        assert_eq!(
            s.service.get(&operator, Some(&ctx), out_of_scope.id).await.unwrap_err().code(),
            "DATA_ACCESS_DENIED"
        );

        // Terceiro executa, mas não cancela
        s.service
            .transition(&operator, Some(&ctx), mine.id, LifecycleCommand::Start, RequestOrigin::default())
            .await
            .unwrap();
        let err = s
            .service
            .transition(
                &operator,
                Some(&ctx),
                mine.id,
                LifecycleCommand::Cancel { reason: "x".into() },
                RequestOrigin::default(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "FORBIDDEN");
    }

    #[tokio::test]
    async fn contract_only_hides_uncontracted_equipment_orders() {
        let s = setup();
        let mut company = fixtures::company(s.customer);
        company.asset_visibility_mode = AssetVisibilityMode::ContractOnly;
        s.store.add_company(company.clone());
        let operator = fixtures::third_party_user(&company, UserRole::Operator);
        let ctx = ThirdPartyContext::from_company(&company, UserRole::Operator);

        let site = fixtures::site(s.customer);
        let zone = fixtures::zone(&site);
        let equipment = fixtures::equipment(&zone, vec![]);
        s.store.add_equipment(equipment.clone());

        let contracted = fixtures::equipment(&zone, vec![company.id]);
        s.store.add_equipment(contracted.clone());

        let mut wo = fixtures::company_work_order(&company, WorkOrderStatus::Aberta);
        wo.equipment_id = Some(equipment.id);
        s.store.add_work_order(wo.clone());
        let mut visible = fixtures::company_work_order(&company, WorkOrderStatus::Aberta);
        visible.equipment_id = Some(contracted.id);
        s.store.add_work_order(visible.clone());
        let without_equipment = fixtures::company_work_order(&company, WorkOrderStatus::Aberta);
        s.store.add_work_order(without_equipment.clone());

        let err = s.service.get(&operator, Some(&ctx), wo.id).await.unwrap_err();
        assert_eq!(err.code(), "DATA_ACCESS_DENIED");

        let mut listed: Vec<Uuid> = s
            .service
            .list(&operator, Some(&ctx), WorkOrderFilter { customer_id: s.customer, ..Default::default() })
            .await
            .unwrap()
            .into_iter()
            .map(|wo| wo.id)
            .collect();
        listed.sort();
        let mut expected = vec![visible.id, without_equipment.id];
        expected.sort();
        assert_eq!(listed, expected);
    }

    #[tokio::test]
    async fn evaluation_requires_completion_and_is_audited() {
        let s = setup();
        let mut wo = fixtures::work_order(s.customer);
        s.store.add_work_order(wo.clone());

        let payload = || EvaluateWorkOrderPayload { score: 5, comment: Some("Ótimo".into()) };
        let err = s
            .service
            .evaluate(&s.manager, None, wo.id, payload(), RequestOrigin::default())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_STATUS_TRANSITION");

        wo.status = WorkOrderStatus::Concluida;
        s.store.work_orders.lock().unwrap()[0] = wo.clone();
        let evaluated = s
            .service
            .evaluate(&s.manager, None, wo.id, payload(), RequestOrigin::default())
            .await
            .unwrap();
        assert_eq!(evaluated.evaluation_score, Some(5));
        assert_eq!(s.store.audit_count(), 1);
    }

    #[tokio::test]
    async fn update_logs_only_the_changed_fields() {
        let s = setup();
        let wo = fixtures::work_order(s.customer);
        s.store.add_work_order(wo.clone());

        s.service
            .update(
                &s.manager,
                None,
                wo.id,
                UpdateWorkOrderPayload { title: Some("Novo título".into()), ..Default::default() },
                RequestOrigin::default(),
            )
            .await
            .unwrap();

        let history = s.service.history(&s.manager, None, wo.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].action, AuditAction::Updated);
        assert_eq!(
            history[0].new_value.as_ref().map(|v| v.0.clone()),
            Some(json!({ "title": "Novo título" }))
        );
    }

    #[tokio::test]
    async fn comments_are_stored_in_the_audit_trail() {
        let s = setup();
        let wo = fixtures::work_order(s.customer);
        s.store.add_work_order(wo.clone());

        let log = s
            .service
            .comment(&s.manager, None, wo.id, "Peça encomendada".into(), RequestOrigin::default())
            .await
            .unwrap();
        assert_eq!(log.action, AuditAction::Commented);
        assert_eq!(log.description, "Peça encomendada");
    }

    #[tokio::test]
    async fn other_customer_is_denied() {
        let s = setup();
        let wo = fixtures::work_order(Uuid::new_v4());
        s.store.add_work_order(wo.clone());
        let err = s.service.get(&s.manager, None, wo.id).await.unwrap_err();
        assert_eq!(err.code(), "CUSTOMER_ACCESS_DENIED");
    }
}
