// src/services.rs

use std::sync::Arc;

use crate::db::Stores;

pub mod access_service;
pub mod audit_service;
pub mod auth;
pub mod cleanup_service;
pub mod context_service;
pub mod notification_service;
pub mod proposal_service;
pub mod scope_service;
pub mod sla_service;
pub mod third_party_service;
pub mod work_order_service;

use audit_service::AuditService;
use auth::AuthService;
use cleanup_service::CleanupService;
use context_service::ContextService;
use notification_service::{NotificationService, PushGateway};
use proposal_service::ProposalService;
use scope_service::ScopeService;
use sla_service::SlaService;
use third_party_service::ThirdPartyService;
use work_order_service::WorkOrderService;

// O grafo de serviços, montado uma vez na subida
#[derive(Clone)]
pub struct Services {
    pub auth: AuthService,
    pub context: ContextService,
    pub scope: ScopeService,
    pub notifications: NotificationService,
    pub third_parties: ThirdPartyService,
    pub work_orders: WorkOrderService,
    pub proposals: ProposalService,
    pub sla: SlaService,
}

impl Services {
    pub fn new(
        stores: &Stores,
        jwt_secret: String,
        push: Option<Arc<dyn PushGateway>>,
        fanout_limit: usize,
    ) -> Self {
        let audit = AuditService::new(stores.audit.clone());
        let notifications = NotificationService::new(
            stores.users.clone(),
            stores.notifications.clone(),
            push,
            fanout_limit,
        );
        let cleanup = CleanupService::new(
            stores.third_parties.clone(),
            stores.customers.clone(),
            stores.users.clone(),
            stores.work_orders.clone(),
            audit.clone(),
            notifications.clone(),
        );

        Self {
            auth: AuthService::new(stores.users.clone(), jwt_secret),
            context: ContextService::new(stores.third_parties.clone()),
            scope: ScopeService::new(stores.locations.clone()),
            third_parties: ThirdPartyService::new(stores.third_parties.clone(), cleanup),
            work_orders: WorkOrderService::new(
                stores.work_orders.clone(),
                stores.locations.clone(),
                stores.third_parties.clone(),
                stores.users.clone(),
                audit.clone(),
                notifications.clone(),
            ),
            proposals: ProposalService::new(
                stores.proposals.clone(),
                stores.work_orders.clone(),
                audit,
                notifications.clone(),
            ),
            sla: SlaService::new(stores.sla.clone()),
            notifications,
        }
    }
}
