// src/services/cleanup_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CustomerStore, ThirdPartyStore, UserStore, WorkOrderStore},
    models::{
        audit::{AuditAction, AuditActor, RequestOrigin},
        third_party::{CleanupSummary, CompanyStatus, ModuleCleanupSummary, ThirdPartyCompany},
        work_order::WorkOrderStatus,
    },
    services::{
        audit_service::AuditService,
        notification_service::{NotificationEvent, NotificationService},
    },
};

pub const COMPANY_DEACTIVATED_REASON: &str = "Empresa terceira desativada";
pub const MODULE_DISABLED_REASON: &str = "Módulo de terceiros desativado para o cliente";

// ---
// Ciclo de vida da empresa terceira
// ---
// active -> (desativar) -> inactive -> (reativar) -> active
//
// Desativar é uma saga sem transação: audita cada ordem aberta, cancela
// todas de uma vez, desativa os usuários e só então marca a empresa.
// Reativar só troca o status; ordens e usuários ficam como estão.
#[derive(Clone)]
pub struct CleanupService {
    companies: Arc<dyn ThirdPartyStore>,
    customers: Arc<dyn CustomerStore>,
    users: Arc<dyn UserStore>,
    work_orders: Arc<dyn WorkOrderStore>,
    audit: AuditService,
    notifications: NotificationService,
}

impl CleanupService {
    pub fn new(
        companies: Arc<dyn ThirdPartyStore>,
        customers: Arc<dyn CustomerStore>,
        users: Arc<dyn UserStore>,
        work_orders: Arc<dyn WorkOrderStore>,
        audit: AuditService,
        notifications: NotificationService,
    ) -> Self {
        Self { companies, customers, users, work_orders, audit, notifications }
    }

    async fn find_company(&self, company_id: Uuid) -> Result<ThirdPartyCompany, AppError> {
        self.companies
            .find_company(company_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("Empresa terceira {}", company_id)))
    }

    pub async fn deactivate_company(
        &self,
        company_id: Uuid,
        actor: AuditActor,
        origin: RequestOrigin,
    ) -> Result<CleanupSummary, AppError> {
        let company = self.find_company(company_id).await?;
        let summary = self
            .cascade(&company, COMPANY_DEACTIVATED_REASON, &actor, &origin)
            .await?;

        self.notifications
            .dispatch(NotificationEvent::ThirdPartyCompanyDeactivated {
                customer_id: company.customer_id,
                company_id: company.id,
                company_name: company.name.clone(),
                summary,
            })
            .await;

        Ok(summary)
    }

    pub async fn reactivate_company(&self, company_id: Uuid) -> Result<ThirdPartyCompany, AppError> {
        let mut company = self.find_company(company_id).await?;
        self.companies.set_status(company_id, CompanyStatus::Active).await?;
        company.status = CompanyStatus::Active;

        tracing::info!(company_id = %company_id, "Empresa terceira reativada (ordens e usuários não são restaurados)");
        Ok(company)
    }

    /// Repete a saga para cada empresa do cliente. Sem rollback entre empresas:
    /// somamos só cascatas concluídas e a flag do cliente só vira quando todas deram certo.
    pub async fn disable_module(
        &self,
        customer_id: Uuid,
        actor: AuditActor,
        origin: RequestOrigin,
    ) -> Result<ModuleCleanupSummary, AppError> {
        self.customers
            .find_customer(customer_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("Cliente {}", customer_id)))?;

        let companies = self.companies.list_companies(customer_id).await?;
        let mut result = ModuleCleanupSummary::default();

        for company in &companies {
            match self.cascade(company, MODULE_DISABLED_REASON, &actor, &origin).await {
                Ok(summary) => {
                    result.cancelled_work_orders += summary.cancelled_work_orders;
                    result.deactivated_users += summary.deactivated_users;
                    result.companies_processed += 1;
                }
                Err(e) => {
                    tracing::error!(company_id = %company.id, error = %e, "🔥 Cascata de limpeza falhou");
                    result.failed_companies.push(company.id);
                }
            }
        }

        if result.failed_companies.is_empty() {
            self.customers.set_third_party_enabled(customer_id, false).await?;
            result.module_disabled = true;
        }

        tracing::info!(
            customer_id = %customer_id,
            cancelled = result.cancelled_work_orders,
            deactivated = result.deactivated_users,
            failed = result.failed_companies.len(),
            "Módulo de terceiros desativado"
        );
        Ok(result)
    }

    async fn cascade(
        &self,
        company: &ThirdPartyCompany,
        reason: &str,
        actor: &AuditActor,
        origin: &RequestOrigin,
    ) -> Result<CleanupSummary, AppError> {
        let open = self.work_orders.list_open_by_company(company.id).await?;

        for wo in &open {
            self.audit
                .record_status_change(
                    wo.id,
                    AuditAction::StatusChanged,
                    actor.clone(),
                    wo.status,
                    WorkOrderStatus::Cancelada,
                    origin.clone(),
                )
                .await
                .log();
        }

        let ids: Vec<Uuid> = open.iter().map(|wo| wo.id).collect();
        let cancelled_work_orders = self.work_orders.cancel_many(&ids, reason).await?;
        let deactivated_users = self.users.deactivate_by_company(company.id).await?;
        self.companies.set_status(company.id, CompanyStatus::Inactive).await?;

        tracing::info!(
            company_id = %company.id,
            cancelled_work_orders,
            deactivated_users,
            "Empresa terceira desativada"
        );

        Ok(CleanupSummary { cancelled_work_orders, deactivated_users })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::{fixtures, MemoryStore};
    use crate::models::auth::{UserRole, UserType};

    fn service(store: &Arc<MemoryStore>) -> CleanupService {
        CleanupService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            AuditService::new(store.clone()),
            NotificationService::new(store.clone(), store.clone(), None, 4),
        )
    }

    // Empresa com `open` ordens abertas, `users` usuários e algumas ordens já encerradas
    fn seed_company(store: &MemoryStore, customer_id: Uuid, open: usize, users: usize) -> ThirdPartyCompany {
        let company = fixtures::company(customer_id);
        store.add_company(company.clone());

        let statuses = [WorkOrderStatus::Aberta, WorkOrderStatus::EmExecucao, WorkOrderStatus::Pausada];
        for i in 0..open {
            store.add_work_order(fixtures::company_work_order(&company, statuses[i % 3]));
        }
        store.add_work_order(fixtures::company_work_order(&company, WorkOrderStatus::Concluida));
        for _ in 0..users {
            store.add_user(fixtures::third_party_user(&company, UserRole::Operator));
        }
        company
    }

    #[tokio::test]
    async fn deactivation_cascades_to_work_orders_and_users() {
        let store = MemoryStore::new();
        let customer = fixtures::customer();
        store.add_customer(customer.clone());
        let company = seed_company(&store, customer.id, 4, 2);

        let summary = service(&store)
            .deactivate_company(company.id, AuditActor::system(), RequestOrigin::system())
            .await
            .unwrap();

        assert_eq!(summary, CleanupSummary { cancelled_work_orders: 4, deactivated_users: 2 });
        assert_eq!(store.audit_count(), 4);
        assert!(store
            .audit_logs
            .lock()
            .unwrap()
            .iter()
            .all(|l| l.action == AuditAction::StatusChanged && l.actor_name == "Sistema"));

        let work_orders = store.work_orders.lock().unwrap().clone();
        assert_eq!(work_orders.iter().filter(|w| w.status == WorkOrderStatus::Cancelada).count(), 4);
        assert!(work_orders
            .iter()
            .filter(|w| w.status == WorkOrderStatus::Cancelada)
            .all(|w| w.cancellation_reason.as_deref() == Some(COMPANY_DEACTIVATED_REASON)));
        assert_eq!(work_orders.iter().filter(|w| w.status == WorkOrderStatus::Concluida).count(), 1);

        assert!(store.users.lock().unwrap().iter().all(|u| !u.active));
        assert_eq!(store.company(company.id).status, CompanyStatus::Inactive);
    }

    #[tokio::test]
    async fn bulk_cancel_leaves_orders_closed_in_the_meantime() {
        let store = MemoryStore::new();
        let company = seed_company(&store, Uuid::new_v4(), 2, 0);
        let open = store.list_open_by_company(company.id).await.unwrap();
        let ids: Vec<Uuid> = open.iter().map(|wo| wo.id).collect();

        // concluída entre a listagem e o cancelamento
        store.work_orders.lock().unwrap().iter_mut().find(|w| w.id == ids[0]).unwrap().status =
            WorkOrderStatus::Concluida;

        assert_eq!(store.cancel_many(&ids, COMPANY_DEACTIVATED_REASON).await.unwrap(), 1);
        assert_eq!(store.work_order(ids[0]).status, WorkOrderStatus::Concluida);
        assert_eq!(store.work_order(ids[0]).cancellation_reason, None);
        assert_eq!(store.work_order(ids[1]).status, WorkOrderStatus::Cancelada);
    }

    #[tokio::test]
    async fn deactivation_notifies_customer_supervisors() {
        let store = MemoryStore::new();
        let customer = fixtures::customer();
        store.add_customer(customer.clone());
        let admin = fixtures::user(customer.id, UserType::InternalUser, UserRole::Admin);
        store.add_user(admin.clone());
        let company = seed_company(&store, customer.id, 1, 0);

        service(&store)
            .deactivate_company(company.id, AuditActor::user(admin.id, "Admin"), RequestOrigin::default())
            .await
            .unwrap();

        let inbox = store.notifications_for(admin.id);
        assert_eq!(inbox.len(), 1);
        assert!(inbox[0].message.contains("1 ordens canceladas"));
    }

    #[tokio::test]
    async fn audit_outage_does_not_block_the_cascade() {
        let store = MemoryStore::new();
        let company = seed_company(&store, Uuid::new_v4(), 3, 1);
        *store.fail_audit.lock().unwrap() = true;

        let summary = service(&store)
            .deactivate_company(company.id, AuditActor::system(), RequestOrigin::system())
            .await
            .unwrap();
        assert_eq!(summary.cancelled_work_orders, 3);
        assert_eq!(store.audit_count(), 0);
    }

    #[tokio::test]
    async fn reactivation_only_flips_status() {
        let store = MemoryStore::new();
        let company = seed_company(&store, Uuid::new_v4(), 2, 2);
        let service = service(&store);

        service
            .deactivate_company(company.id, AuditActor::system(), RequestOrigin::system())
            .await
            .unwrap();
        let before_orders = store.work_orders.lock().unwrap().clone();

        let reactivated = service.reactivate_company(company.id).await.unwrap();
        assert_eq!(reactivated.status, CompanyStatus::Active);
        assert_eq!(store.company(company.id).status, CompanyStatus::Active);

        let after_orders = store.work_orders.lock().unwrap().clone();
        for (before, after) in before_orders.iter().zip(after_orders.iter()) {
            assert_eq!(before.status, after.status);
        }
        assert!(store.users.lock().unwrap().iter().all(|u| !u.active));
    }

    #[tokio::test]
    async fn unknown_company_is_not_found() {
        let store = MemoryStore::new();
        let err = service(&store)
            .deactivate_company(Uuid::new_v4(), AuditActor::system(), RequestOrigin::system())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "RESOURCE_NOT_FOUND");
    }

    #[tokio::test]
    async fn disabling_the_module_sums_every_company() {
        let store = MemoryStore::new();
        let customer = fixtures::customer();
        store.add_customer(customer.clone());
        let a = seed_company(&store, customer.id, 3, 2);
        let b = seed_company(&store, customer.id, 5, 4);

        let summary = service(&store)
            .disable_module(customer.id, AuditActor::system(), RequestOrigin::system())
            .await
            .unwrap();

        assert_eq!(summary.cancelled_work_orders, 8);
        assert_eq!(summary.deactivated_users, 6);
        assert_eq!(summary.companies_processed, 2);
        assert!(summary.failed_companies.is_empty());
        assert!(summary.module_disabled);
        assert!(!store.customer(customer.id).third_party_enabled);
        assert_eq!(store.company(a.id).status, CompanyStatus::Inactive);
        assert_eq!(store.company(b.id).status, CompanyStatus::Inactive);
    }

    #[tokio::test]
    async fn partial_failure_keeps_counts_honest_and_module_enabled() {
        let store = MemoryStore::new();
        let customer = fixtures::customer();
        store.add_customer(customer.clone());
        let ok = seed_company(&store, customer.id, 3, 1);
        let broken = seed_company(&store, customer.id, 5, 2);
        store.failing_companies.lock().unwrap().insert(broken.id);

        let summary = service(&store)
            .disable_module(customer.id, AuditActor::system(), RequestOrigin::system())
            .await
            .unwrap();

        assert_eq!(summary.cancelled_work_orders, 3);
        assert_eq!(summary.deactivated_users, 1);
        assert_eq!(summary.companies_processed, 1);
        assert_eq!(summary.failed_companies, vec![broken.id]);
        assert!(!summary.module_disabled);
        assert!(store.customer(customer.id).third_party_enabled);
        assert_eq!(store.company(ok.id).status, CompanyStatus::Inactive);
        assert_eq!(store.company(broken.id).status, CompanyStatus::Active);
    }
}
