// src/services/proposal_service.rs

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{ProposalStore, WorkOrderStore},
    models::{
        audit::{AuditAction, AuditActor, RequestOrigin},
        auth::{User, UserType},
        proposal::{
            NewProposal, Proposal, ProposalDecision, ProposalKind, ProposalQuery, ProposalStatus,
            SubmitProposalPayload,
        },
        third_party::ThirdPartyContext,
    },
    services::{
        access_service::authorize_customer,
        audit_service::{AuditEvent, AuditService},
        notification_service::{NotificationEvent, NotificationService},
    },
};

// em_espera -> aprovado | recusado. Decidir duas vezes é conflito.
#[derive(Clone)]
pub struct ProposalService {
    proposals: Arc<dyn ProposalStore>,
    work_orders: Arc<dyn WorkOrderStore>,
    audit: AuditService,
    notifications: NotificationService,
}

impl ProposalService {
    pub fn new(
        proposals: Arc<dyn ProposalStore>,
        work_orders: Arc<dyn WorkOrderStore>,
        audit: AuditService,
        notifications: NotificationService,
    ) -> Self {
        Self { proposals, work_orders, audit, notifications }
    }

    pub async fn submit(
        &self,
        user: &User,
        context: Option<&ThirdPartyContext>,
        payload: SubmitProposalPayload,
    ) -> Result<Proposal, AppError> {
        authorize_customer(user, context, payload.customer_id)?;

        // Quem submete define o tipo: fornecedor -> plano, terceiro -> proposta de terceiro
        let (kind, third_party_company_id, supplier_id) = match user.user_type {
            UserType::SupplierUser => (ProposalKind::MaintenancePlan, None, user.supplier_id),
            UserType::ThirdPartyUser => {
                let ctx = context.ok_or(AppError::ThirdPartyContextMissing)?;
                (ProposalKind::ThirdParty, Some(ctx.company_id), None)
            }
            UserType::InternalUser => return Err(AppError::Forbidden),
        };

        if let Some(work_order_id) = payload.work_order_id {
            let wo = self
                .work_orders
                .find_by_id(work_order_id)
                .await?
                .filter(|wo| wo.customer_id == payload.customer_id)
                .ok_or_else(|| AppError::ResourceNotFound(format!("Ordem de serviço {}", work_order_id)))?;
            if third_party_company_id.is_some() && wo.third_party_company_id != third_party_company_id {
                return Err(AppError::DataAccessDenied("ordem atribuída a outra empresa".into()));
            }
        }

        let proposal = self
            .proposals
            .insert(&NewProposal {
                customer_id: payload.customer_id,
                kind,
                third_party_company_id,
                supplier_id,
                submitted_by: user.id,
                work_order_id: payload.work_order_id,
                title: payload.title,
                description: payload.description,
                amount: payload.amount,
            })
            .await?;

        self.notifications
            .dispatch(NotificationEvent::ProposalSubmitted {
                customer_id: proposal.customer_id,
                proposal_id: proposal.id,
                title: proposal.title.clone(),
            })
            .await;

        Ok(proposal)
    }

    pub async fn list(
        &self,
        user: &User,
        context: Option<&ThirdPartyContext>,
        mut query: ProposalQuery,
    ) -> Result<Vec<Proposal>, AppError> {
        authorize_customer(user, context, query.customer_id)?;

        if let Some(ctx) = context {
            query.third_party_company_id = Some(ctx.company_id);
        }
        let proposals = self.proposals.list(&query).await?;

        Ok(match user.user_type {
            UserType::SupplierUser => proposals
                .into_iter()
                .filter(|p| p.supplier_id.is_some() && p.supplier_id == user.supplier_id)
                .collect(),
            UserType::InternalUser | UserType::ThirdPartyUser => proposals,
        })
    }

    pub async fn approve(
        &self,
        user: &User,
        proposal_id: Uuid,
        origin: RequestOrigin,
    ) -> Result<Proposal, AppError> {
        self.decide(user, proposal_id, ProposalStatus::Aprovado, None, origin).await
    }

    pub async fn reject(
        &self,
        user: &User,
        proposal_id: Uuid,
        reason: String,
        origin: RequestOrigin,
    ) -> Result<Proposal, AppError> {
        self.decide(user, proposal_id, ProposalStatus::Recusado, Some(reason), origin)
            .await
    }

    async fn decide(
        &self,
        user: &User,
        proposal_id: Uuid,
        status: ProposalStatus,
        rejection_reason: Option<String>,
        origin: RequestOrigin,
    ) -> Result<Proposal, AppError> {
        if user.user_type != UserType::InternalUser {
            return Err(AppError::Forbidden);
        }

        let current = self
            .proposals
            .find_by_id(proposal_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("Proposta {}", proposal_id)))?;
        authorize_customer(user, None, current.customer_id)?;

        let decision = ProposalDecision { status, decided_by: user.id, rejection_reason };
        let proposal = self
            .proposals
            .decide(proposal_id, &decision)
            .await?
            .ok_or(AppError::ProposalAlreadyDecided)?;

        tracing::info!(proposal_id = %proposal.id, status = ?proposal.status, "Proposta decidida");

        if let Some(work_order_id) = proposal.work_order_id {
            let action = match status {
                ProposalStatus::Aprovado => AuditAction::Approved,
                _ => AuditAction::Rejected,
            };
            let mut event = AuditEvent::new(
                work_order_id,
                action,
                AuditActor::user(user.id, user.name.clone()),
                origin,
            )
            .values(
                Some(json!({ "proposalId": proposal.id, "status": ProposalStatus::EmEspera })),
                Some(json!({ "proposalId": proposal.id, "status": proposal.status })),
            );
            if let Some(reason) = &proposal.rejection_reason {
                event = event.description(format!("Proposta \"{}\" recusada: {}", proposal.title, reason));
            }
            self.audit.record(event).await.log();
        }

        self.notifications
            .dispatch(NotificationEvent::ProposalDecided {
                submitted_by: proposal.submitted_by,
                proposal_id: proposal.id,
                title: proposal.title.clone(),
                status: proposal.status,
            })
            .await;

        if proposal.kind == ProposalKind::MaintenancePlan && proposal.status == ProposalStatus::Aprovado {
            self.notifications
                .dispatch(NotificationEvent::MaintenancePlanApproved {
                    customer_id: proposal.customer_id,
                    proposal_id: proposal.id,
                    title: proposal.title.clone(),
                })
                .await;
        }

        Ok(proposal)
    }
}
