use std::sync::Arc;

use sqlx::PgPool;

pub mod audit_repo;
pub use audit_repo::{AuditRepository, AuditStore};
pub mod customer_repo;
pub use customer_repo::{CustomerRepository, CustomerStore};
pub mod location_repo;
pub use location_repo::{LocationRepository, LocationStore};
pub mod notification_repo;
pub use notification_repo::{NotificationRepository, NotificationStore};
pub mod proposal_repo;
pub use proposal_repo::{ProposalRepository, ProposalStore};
pub mod sla_repo;
pub use sla_repo::{SlaRepository, SlaStore};
pub mod third_party_repo;
pub use third_party_repo::{ThirdPartyRepository, ThirdPartyStore};
pub mod user_repo;
pub use user_repo::{RecipientFilter, UserRepository, UserStore};
pub mod work_order_repo;
pub use work_order_repo::{WorkOrderRepository, WorkOrderStore};

#[cfg(test)]
pub mod memory;

// Todos os colaboradores de persistência, como capacidades trocáveis.
// Em produção são os repositórios Postgres; nos testes, o MemoryStore.
#[derive(Clone)]
pub struct Stores {
    pub audit: Arc<dyn AuditStore>,
    pub customers: Arc<dyn CustomerStore>,
    pub locations: Arc<dyn LocationStore>,
    pub notifications: Arc<dyn NotificationStore>,
    pub proposals: Arc<dyn ProposalStore>,
    pub sla: Arc<dyn SlaStore>,
    pub third_parties: Arc<dyn ThirdPartyStore>,
    pub users: Arc<dyn UserStore>,
    pub work_orders: Arc<dyn WorkOrderStore>,
}

impl Stores {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            audit: Arc::new(AuditRepository::new(pool.clone())),
            customers: Arc::new(CustomerRepository::new(pool.clone())),
            locations: Arc::new(LocationRepository::new(pool.clone())),
            notifications: Arc::new(NotificationRepository::new(pool.clone())),
            proposals: Arc::new(ProposalRepository::new(pool.clone())),
            sla: Arc::new(SlaRepository::new(pool.clone())),
            third_parties: Arc::new(ThirdPartyRepository::new(pool.clone())),
            users: Arc::new(UserRepository::new(pool.clone())),
            work_orders: Arc::new(WorkOrderRepository::new(pool)),
        }
    }
}
