// src/services/notification_service.rs

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        side_channel::{best_effort, SideEffect},
    },
    db::{NotificationStore, RecipientFilter, UserStore},
    models::{
        auth::{User, UserRole},
        notification::{NewNotification, Notification, NotificationType, PushMessage},
        proposal::ProposalStatus,
        third_party::CleanupSummary,
        work_order::WorkOrderStatus,
    },
};

// ---
// Gateway de push
// ---
#[async_trait]
pub trait PushGateway: Send + Sync {
    async fn send(&self, message: &PushMessage) -> Result<(), AppError>;
}

/// POST JSON `{to, sound, title, body, data}` para o gateway (padrão: Expo).
/// Resposta fora de 2xx é erro; não há retry.
pub struct ExpoPushGateway {
    client: reqwest::Client,
    url: String,
}

impl ExpoPushGateway {
    pub fn new(url: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), url: url.into() }
    }
}

#[async_trait]
impl PushGateway for ExpoPushGateway {
    async fn send(&self, message: &PushMessage) -> Result<(), AppError> {
        let response = self
            .client
            .post(&self.url)
            .json(message)
            .send()
            .await
            .map_err(anyhow::Error::from)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::InternalServerError(anyhow::anyhow!(
                "gateway de push respondeu {}",
                status
            )));
        }
        Ok(())
    }
}

// ---
// Eventos
// ---
// Cada evento sabe para quem vai e como se apresenta.
#[derive(Debug, Clone)]
pub enum NotificationEvent {
    /// Gestores da empresa terceira recebem a ordem.
    WorkOrderAssignedToCompany { company_id: Uuid, work_order_id: Uuid, title: String },
    /// Todos os operadores da equipe.
    WorkOrderAssignedToTeam { team_id: Uuid, work_order_id: Uuid, title: String },
    /// Um operador específico.
    WorkOrderAssignedToOperator { operator_id: Uuid, work_order_id: Uuid, title: String },
    WorkOrderStatusChanged { customer_id: Uuid, work_order_id: Uuid, title: String, status: WorkOrderStatus },
    ProposalSubmitted { customer_id: Uuid, proposal_id: Uuid, title: String },
    ProposalDecided { submitted_by: Uuid, proposal_id: Uuid, title: String, status: ProposalStatus },
    MaintenancePlanApproved { customer_id: Uuid, proposal_id: Uuid, title: String },
    ThirdPartyCompanyDeactivated { customer_id: Uuid, company_id: Uuid, company_name: String, summary: CleanupSummary },
}

impl NotificationEvent {
    pub fn recipients(&self) -> RecipientFilter {
        match self {
            NotificationEvent::WorkOrderAssignedToCompany { company_id, .. } => {
                RecipientFilter::CompanyStaff {
                    company_id: *company_id,
                    roles: vec![UserRole::Admin, UserRole::Manager, UserRole::TeamLeader],
                }
            }
            NotificationEvent::WorkOrderAssignedToTeam { team_id, .. } => {
                RecipientFilter::TeamOperators { team_id: *team_id }
            }
            NotificationEvent::WorkOrderAssignedToOperator { operator_id, .. } => {
                RecipientFilter::Single { user_id: *operator_id }
            }
            NotificationEvent::WorkOrderStatusChanged { customer_id, .. }
            | NotificationEvent::ThirdPartyCompanyDeactivated { customer_id, .. } => {
                RecipientFilter::CustomerStaff {
                    customer_id: *customer_id,
                    roles: UserRole::SUPERVISORS.to_vec(),
                }
            }
            NotificationEvent::ProposalSubmitted { customer_id, .. } => RecipientFilter::CustomerStaff {
                customer_id: *customer_id,
                roles: vec![UserRole::Admin, UserRole::Manager],
            },
            NotificationEvent::MaintenancePlanApproved { customer_id, .. } => {
                RecipientFilter::CustomerStaff {
                    customer_id: *customer_id,
                    roles: vec![UserRole::Manager, UserRole::TeamLeader],
                }
            }
            NotificationEvent::ProposalDecided { submitted_by, .. } => {
                RecipientFilter::Single { user_id: *submitted_by }
            }
        }
    }

    pub fn notification_type(&self) -> NotificationType {
        match self {
            NotificationEvent::WorkOrderAssignedToCompany { .. }
            | NotificationEvent::WorkOrderAssignedToTeam { .. }
            | NotificationEvent::WorkOrderAssignedToOperator { .. } => NotificationType::WorkOrderAssigned,
            NotificationEvent::WorkOrderStatusChanged { .. } => NotificationType::WorkOrderStatusChanged,
            NotificationEvent::ProposalSubmitted { .. } => NotificationType::ProposalSubmitted,
            NotificationEvent::ProposalDecided { .. } => NotificationType::ProposalDecided,
            NotificationEvent::MaintenancePlanApproved { .. } => NotificationType::MaintenancePlanApproved,
            NotificationEvent::ThirdPartyCompanyDeactivated { .. } => {
                NotificationType::ThirdPartyCompanyDeactivated
            }
        }
    }

    /// (título, mensagem, payload)
    pub fn render(&self) -> (String, String, Value) {
        let kind = self.notification_type();
        match self {
            NotificationEvent::WorkOrderAssignedToCompany { work_order_id, title, .. }
            | NotificationEvent::WorkOrderAssignedToTeam { work_order_id, title, .. }
            | NotificationEvent::WorkOrderAssignedToOperator { work_order_id, title, .. } => (
                "Nova ordem de serviço".into(),
                format!("A ordem \"{}\" foi atribuída a você.", title),
                json!({ "type": kind, "workOrderId": work_order_id }),
            ),
            NotificationEvent::WorkOrderStatusChanged { work_order_id, title, status, .. } => (
                "Status da ordem alterado".into(),
                format!("A ordem \"{}\" agora está {}.", title, status.as_str()),
                json!({ "type": kind, "workOrderId": work_order_id, "status": status }),
            ),
            NotificationEvent::ProposalSubmitted { proposal_id, title, .. } => (
                "Nova proposta recebida".into(),
                format!("A proposta \"{}\" aguarda avaliação.", title),
                json!({ "type": kind, "proposalId": proposal_id }),
            ),
            NotificationEvent::ProposalDecided { proposal_id, title, status, .. } => {
                let verb = match status {
                    ProposalStatus::Aprovado => "aprovada",
                    ProposalStatus::Recusado => "recusada",
                    ProposalStatus::EmEspera => "atualizada",
                };
                (
                    "Proposta avaliada".into(),
                    format!("A proposta \"{}\" foi {}.", title, verb),
                    json!({ "type": kind, "proposalId": proposal_id, "status": status }),
                )
            }
            NotificationEvent::MaintenancePlanApproved { proposal_id, title, .. } => (
                "Plano de manutenção aprovado".into(),
                format!("O plano \"{}\" foi aprovado.", title),
                json!({ "type": kind, "proposalId": proposal_id }),
            ),
            NotificationEvent::ThirdPartyCompanyDeactivated { company_id, company_name, summary, .. } => (
                "Empresa terceira desativada".into(),
                format!(
                    "{} foi desativada: {} ordens canceladas, {} usuários desativados.",
                    company_name, summary.cancelled_work_orders, summary.deactivated_users
                ),
                json!({
                    "type": kind,
                    "companyId": company_id,
                    "cancelledWorkOrders": summary.cancelled_work_orders,
                    "deactivatedUsers": summary.deactivated_users,
                }),
            ),
        }
    }
}

/// Quantos destinatários, quantos registros gravados, quantos pushes aceitos.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub recipients: usize,
    pub persisted: usize,
    pub pushed: usize,
}

// ---
// O serviço
// ---
#[derive(Clone)]
pub struct NotificationService {
    users: Arc<dyn UserStore>,
    notifications: Arc<dyn NotificationStore>,
    push: Option<Arc<dyn PushGateway>>,
    fanout_limit: usize,
}

impl NotificationService {
    pub fn new(
        users: Arc<dyn UserStore>,
        notifications: Arc<dyn NotificationStore>,
        push: Option<Arc<dyn PushGateway>>,
        fanout_limit: usize,
    ) -> Self {
        Self { users, notifications, push, fanout_limit: fanout_limit.max(1) }
    }

    /// Nunca falha: cada etapa tem sua própria fronteira de erro.
    pub async fn dispatch(&self, event: NotificationEvent) -> DispatchReport {
        let filter = event.recipients();
        let Some(recipients) =
            best_effort("notification", self.users.list_recipients(&filter)).await
        else {
            return DispatchReport::default();
        };

        let kind = event.notification_type();
        let (title, message, payload) = event.render();

        let total = recipients.len();
        let outcomes: Vec<(bool, bool)> = stream::iter(recipients)
            .map(|user| {
                let this = self.clone();
                let (title, message, payload) = (title.clone(), message.clone(), payload.clone());
                async move { this.deliver(&user, kind, &title, &message, &payload).await }
            })
            .buffer_unordered(self.fanout_limit)
            .collect()
            .await;

        let report = DispatchReport {
            recipients: total,
            persisted: outcomes.iter().filter(|(saved, _)| *saved).count(),
            pushed: outcomes.iter().filter(|(_, pushed)| *pushed).count(),
        };
        tracing::debug!(notification_type = ?kind, ?report, "Notificações despachadas");
        report
    }

    // Grava primeiro, depois tenta o push. Devolve (gravou, enviou push).
    async fn deliver(
        &self,
        user: &User,
        kind: NotificationType,
        title: &str,
        message: &str,
        payload: &Value,
    ) -> (bool, bool) {
        let new = NewNotification {
            user_id: user.id,
            notification_type: kind,
            title: title.to_string(),
            message: message.to_string(),
            payload: Some(payload.clone()),
        };
        let saved = SideEffect::new("notification", self.notifications.create(&new).await)
            .for_entity(user.id)
            .log()
            .is_some();

        let pushed = match (&self.push, &user.push_token) {
            (Some(gateway), Some(token)) if user.push_enabled => {
                let push = PushMessage {
                    to: token.clone(),
                    sound: "default".into(),
                    title: title.to_string(),
                    body: message.to_string(),
                    data: payload.clone(),
                };
                best_effort("push", gateway.send(&push)).await.is_some()
            }
            _ => false,
        };

        (saved, pushed)
    }

    // --- Caixa de entrada ---

    pub async fn inbox(&self, user_id: Uuid, unread_only: bool) -> Result<Vec<Notification>, AppError> {
        self.notifications.list_for_user(user_id, unread_only).await
    }

    pub async fn mark_read(&self, notification_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        if self.notifications.mark_read(notification_id, user_id).await? {
            Ok(())
        } else {
            Err(AppError::ResourceNotFound(format!("Notificação {}", notification_id)))
        }
    }
}
