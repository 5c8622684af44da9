// src/db/memory.rs
//
// Implementação em memória de todos os Stores, usada apenas nos testes.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        AuditStore, CustomerStore, LocationStore, NotificationStore, ProposalStore,
        RecipientFilter, SlaStore, Stores, ThirdPartyStore, UserStore, WorkOrderStore,
    },
    models::{
        audit::{NewAuditEntry, WorkOrderAuditLog},
        auth::{User, UserRole},
        customer::Customer,
        location::{Equipment, Site, Zone},
        notification::{NewNotification, Notification},
        proposal::{NewProposal, Proposal, ProposalDecision, ProposalQuery, ProposalStatus},
        sla::{SlaAggregate, SlaFilter, SlaGroupAggregate, SlaGrouping, SlaScope},
        third_party::{
            AssetVisibilityMode, CompanyStatus, CreateThirdPartyCompanyPayload,
            ThirdPartyCompany, UpdateCompanyScopePayload,
        },
        work_order::{ExecutedByType, NewWorkOrder, WorkOrder, WorkOrderFilter, WorkOrderStatus},
    },
    services::sla_service::aggregate_work_orders,
};

#[derive(Default)]
pub struct MemoryStore {
    pub customers: Mutex<Vec<Customer>>,
    pub companies: Mutex<Vec<ThirdPartyCompany>>,
    pub users: Mutex<Vec<User>>,
    pub sites: Mutex<Vec<Site>>,
    pub zones: Mutex<Vec<Zone>>,
    pub equipment: Mutex<Vec<Equipment>>,
    pub work_orders: Mutex<Vec<WorkOrder>>,
    pub audit_logs: Mutex<Vec<WorkOrderAuditLog>>,
    pub notifications: Mutex<Vec<Notification>>,
    pub proposals: Mutex<Vec<Proposal>>,
    /// Empresas cujo cascateamento deve falhar (simula erro de infraestrutura).
    pub failing_companies: Mutex<HashSet<Uuid>>,
    pub fail_audit: Mutex<bool>,
    pub fail_notifications: Mutex<bool>,
    pub fail_locations: Mutex<bool>,
    pub fail_companies: Mutex<bool>,
}

fn infra_error(what: &str) -> AppError {
    AppError::InternalServerError(anyhow::anyhow!("falha simulada: {}", what))
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn stores(self: &Arc<Self>) -> Stores {
        Stores {
            audit: self.clone(),
            customers: self.clone(),
            locations: self.clone(),
            notifications: self.clone(),
            proposals: self.clone(),
            sla: self.clone(),
            third_parties: self.clone(),
            users: self.clone(),
            work_orders: self.clone(),
        }
    }

    pub fn add_customer(&self, customer: Customer) {
        self.customers.lock().unwrap().push(customer);
    }

    pub fn add_company(&self, company: ThirdPartyCompany) {
        self.companies.lock().unwrap().push(company);
    }

    pub fn add_user(&self, user: User) {
        self.users.lock().unwrap().push(user);
    }

    pub fn add_site(&self, site: Site) {
        self.sites.lock().unwrap().push(site);
    }

    pub fn add_zone(&self, zone: Zone) {
        self.zones.lock().unwrap().push(zone);
    }

    pub fn add_equipment(&self, equipment: Equipment) {
        self.equipment.lock().unwrap().push(equipment);
    }

    pub fn add_work_order(&self, work_order: WorkOrder) {
        self.work_orders.lock().unwrap().push(work_order);
    }

    pub fn company(&self, id: Uuid) -> ThirdPartyCompany {
        self.companies.lock().unwrap().iter().find(|c| c.id == id).cloned().unwrap()
    }

    pub fn customer(&self, id: Uuid) -> Customer {
        self.customers.lock().unwrap().iter().find(|c| c.id == id).cloned().unwrap()
    }

    pub fn user(&self, id: Uuid) -> User {
        self.users.lock().unwrap().iter().find(|u| u.id == id).cloned().unwrap()
    }

    pub fn work_order(&self, id: Uuid) -> WorkOrder {
        self.work_orders.lock().unwrap().iter().find(|w| w.id == id).cloned().unwrap()
    }

    pub fn audit_count(&self) -> usize {
        self.audit_logs.lock().unwrap().len()
    }

    pub fn notifications_for(&self, user_id: Uuid) -> Vec<Notification> {
        self.notifications
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect()
    }

    fn scoped_work_orders(&self, scope: SlaScope, filter: &SlaFilter) -> Vec<WorkOrder> {
        self.work_orders
            .lock()
            .unwrap()
            .iter()
            .filter(|wo| match scope {
                SlaScope::Customer(id) => wo.customer_id == id,
                SlaScope::ThirdPartyCompany(id) => wo.third_party_company_id == Some(id),
                SlaScope::Team(id) => wo.assigned_team_id == Some(id),
                SlaScope::Operator(id) => wo.assigned_operator_id == Some(id),
            })
            .filter(|wo| filter.customer_id.is_none_or(|id| wo.customer_id == id))
            .filter(|wo| filter.from.is_none_or(|from| wo.created_at >= from))
            .filter(|wo| filter.to.is_none_or(|to| wo.created_at <= to))
            .filter(|wo| {
                filter
                    .module
                    .as_ref()
                    .is_none_or(|module| wo.module.as_ref() == Some(module))
            })
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ThirdPartyStore for MemoryStore {
    async fn find_company(&self, id: Uuid) -> Result<Option<ThirdPartyCompany>, AppError> {
        if *self.fail_companies.lock().unwrap() {
            return Err(infra_error("third_party_companies"));
        }
        Ok(self.companies.lock().unwrap().iter().find(|c| c.id == id).cloned())
    }

    async fn list_companies(&self, customer_id: Uuid) -> Result<Vec<ThirdPartyCompany>, AppError> {
        Ok(self
            .companies
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.customer_id == customer_id)
            .cloned()
            .collect())
    }

    async fn create_company(
        &self,
        customer_id: Uuid,
        payload: &CreateThirdPartyCompanyPayload,
    ) -> Result<ThirdPartyCompany, AppError> {
        let mut company = fixtures::company(customer_id);
        company.name = payload.name.clone();
        company.document_number = payload.document_number.clone();
        company.email = payload.email.clone();
        company.phone = payload.phone.clone();
        company.allowed_sites = payload.allowed_sites.clone();
        company.allowed_zones = payload.allowed_zones.clone();
        company.asset_visibility_mode =
            payload.asset_visibility_mode.unwrap_or(AssetVisibilityMode::All);
        self.add_company(company.clone());
        Ok(company)
    }

    async fn update_scope(
        &self,
        id: Uuid,
        scope: &UpdateCompanyScopePayload,
    ) -> Result<Option<ThirdPartyCompany>, AppError> {
        let mut companies = self.companies.lock().unwrap();
        Ok(companies.iter_mut().find(|c| c.id == id).map(|c| {
            c.allowed_sites = scope.allowed_sites.clone();
            c.allowed_zones = scope.allowed_zones.clone();
            c.asset_visibility_mode = scope.asset_visibility_mode;
            c.updated_at = Utc::now();
            c.clone()
        }))
    }

    async fn set_status(&self, id: Uuid, status: CompanyStatus) -> Result<(), AppError> {
        let mut companies = self.companies.lock().unwrap();
        let company = companies
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| AppError::ResourceNotFound(format!("Empresa terceira {}", id)))?;
        company.status = status;
        Ok(())
    }
}

#[async_trait]
impl LocationStore for MemoryStore {
    async fn list_active_sites(
        &self,
        customer_id: Uuid,
        module: Option<&str>,
    ) -> Result<Vec<Site>, AppError> {
        if *self.fail_locations.lock().unwrap() {
            return Err(infra_error("sites"));
        }
        Ok(self
            .sites
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.customer_id == customer_id && s.active)
            .filter(|s| module.is_none_or(|m| s.module.as_deref() == Some(m)))
            .cloned()
            .collect())
    }

    async fn list_active_zones(&self, site_ids: &[Uuid]) -> Result<Vec<Zone>, AppError> {
        Ok(self
            .zones
            .lock()
            .unwrap()
            .iter()
            .filter(|z| site_ids.contains(&z.site_id) && z.active)
            .cloned()
            .collect())
    }

    async fn list_active_equipment(&self, zone_ids: &[Uuid]) -> Result<Vec<Equipment>, AppError> {
        Ok(self
            .equipment
            .lock()
            .unwrap()
            .iter()
            .filter(|e| zone_ids.contains(&e.zone_id) && e.active)
            .cloned()
            .collect())
    }

    async fn find_equipment(&self, id: Uuid) -> Result<Option<Equipment>, AppError> {
        Ok(self.equipment.lock().unwrap().iter().find(|e| e.id == id).cloned())
    }

    async fn find_equipment_many(&self, ids: &[Uuid]) -> Result<Vec<Equipment>, AppError> {
        Ok(self
            .equipment
            .lock()
            .unwrap()
            .iter()
            .filter(|e| ids.contains(&e.id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CustomerStore for MemoryStore {
    async fn find_customer(&self, id: Uuid) -> Result<Option<Customer>, AppError> {
        Ok(self.customers.lock().unwrap().iter().find(|c| c.id == id).cloned())
    }

    async fn set_third_party_enabled(&self, id: Uuid, enabled: bool) -> Result<(), AppError> {
        let mut customers = self.customers.lock().unwrap();
        let customer = customers
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| AppError::ResourceNotFound(format!("Cliente {}", id)))?;
        customer.third_party_enabled = enabled;
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn list_recipients(&self, filter: &RecipientFilter) -> Result<Vec<User>, AppError> {
        use crate::models::auth::UserType;

        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.active)
            .filter(|u| match filter {
                RecipientFilter::CustomerStaff { customer_id, roles } => {
                    u.customer_id == Some(*customer_id)
                        && u.user_type == UserType::InternalUser
                        && roles.contains(&u.role)
                }
                RecipientFilter::CompanyStaff { company_id, roles } => {
                    u.third_party_company_id == Some(*company_id) && roles.contains(&u.role)
                }
                RecipientFilter::TeamOperators { team_id } => {
                    u.team_id == Some(*team_id) && u.role == UserRole::Operator
                }
                RecipientFilter::Single { user_id } => u.id == *user_id,
            })
            .cloned()
            .collect())
    }

    async fn deactivate_by_company(&self, company_id: Uuid) -> Result<u64, AppError> {
        let mut count = 0;
        for user in self.users.lock().unwrap().iter_mut() {
            if user.third_party_company_id == Some(company_id) && user.active {
                user.active = false;
                count += 1;
            }
        }
        Ok(count)
    }
}

#[async_trait]
impl WorkOrderStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<WorkOrder>, AppError> {
        Ok(self.work_orders.lock().unwrap().iter().find(|w| w.id == id).cloned())
    }

    async fn list(&self, filter: &WorkOrderFilter) -> Result<Vec<WorkOrder>, AppError> {
        Ok(self
            .work_orders
            .lock()
            .unwrap()
            .iter()
            .filter(|w| w.customer_id == filter.customer_id)
            .filter(|w| filter.third_party_company_id.is_none_or(|c| w.third_party_company_id == Some(c)))
            .filter(|w| filter.status.is_none_or(|s| w.status == s))
            .filter(|w| filter.site_id.is_none_or(|s| w.site_id == Some(s)))
            .filter(|w| filter.zone_id.is_none_or(|z| w.zone_id == Some(z)))
            .cloned()
            .collect())
    }

    async fn insert(&self, new: &NewWorkOrder) -> Result<WorkOrder, AppError> {
        let mut wo = fixtures::work_order(new.customer_id);
        wo.site_id = new.site_id;
        wo.zone_id = new.zone_id;
        wo.equipment_id = new.equipment_id;
        wo.module = new.module.clone();
        wo.title = new.title.clone();
        wo.description = new.description.clone();
        wo.due_date = new.due_date;
        wo.created_by = new.created_by;
        self.add_work_order(wo.clone());
        Ok(wo)
    }

    async fn save(&self, work_order: &WorkOrder) -> Result<WorkOrder, AppError> {
        let mut work_orders = self.work_orders.lock().unwrap();
        let slot = work_orders
            .iter_mut()
            .find(|w| w.id == work_order.id)
            .ok_or_else(|| AppError::ResourceNotFound(format!("Ordem de serviço {}", work_order.id)))?;
        *slot = work_order.clone();
        slot.updated_at = Utc::now();
        Ok(slot.clone())
    }

    async fn list_open_by_company(&self, company_id: Uuid) -> Result<Vec<WorkOrder>, AppError> {
        if self.failing_companies.lock().unwrap().contains(&company_id) {
            return Err(infra_error("work_orders"));
        }
        Ok(self
            .work_orders
            .lock()
            .unwrap()
            .iter()
            .filter(|w| w.third_party_company_id == Some(company_id) && w.status.is_open())
            .cloned()
            .collect())
    }

    async fn cancel_many(&self, ids: &[Uuid], reason: &str) -> Result<u64, AppError> {
        let mut count = 0;
        for wo in self.work_orders.lock().unwrap().iter_mut() {
            if ids.contains(&wo.id) && wo.status.is_open() {
                wo.status = WorkOrderStatus::Cancelada;
                wo.cancelled_at = Some(Utc::now());
                wo.cancellation_reason = Some(reason.to_string());
                count += 1;
            }
        }
        Ok(count)
    }
}

#[async_trait]
impl AuditStore for MemoryStore {
    async fn append(&self, entry: &NewAuditEntry) -> Result<WorkOrderAuditLog, AppError> {
        if *self.fail_audit.lock().unwrap() {
            return Err(infra_error("audit"));
        }
        let log = WorkOrderAuditLog {
            id: Uuid::new_v4(),
            work_order_id: entry.work_order_id,
            action: entry.action,
            actor_id: entry.actor.id,
            actor_name: entry.actor.name.clone(),
            previous_value: entry.previous_value.clone().map(sqlx::types::Json),
            new_value: entry.new_value.clone().map(sqlx::types::Json),
            description: entry.description.clone(),
            ip_address: entry.origin.ip_address.clone(),
            user_agent: entry.origin.user_agent.clone(),
            source: entry.origin.source,
            created_at: Utc::now(),
        };
        self.audit_logs.lock().unwrap().push(log.clone());
        Ok(log)
    }

    async fn list_for_work_order(
        &self,
        work_order_id: Uuid,
    ) -> Result<Vec<WorkOrderAuditLog>, AppError> {
        Ok(self
            .audit_logs
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.work_order_id == work_order_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn create(&self, new: &NewNotification) -> Result<Notification, AppError> {
        if *self.fail_notifications.lock().unwrap() {
            return Err(infra_error("notifications"));
        }
        let notification = Notification {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            notification_type: new.notification_type,
            title: new.title.clone(),
            message: new.message.clone(),
            payload: new.payload.clone().map(sqlx::types::Json),
            read: false,
            created_at: Utc::now(),
        };
        self.notifications.lock().unwrap().push(notification.clone());
        Ok(notification)
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
    ) -> Result<Vec<Notification>, AppError> {
        Ok(self
            .notifications
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.user_id == user_id && (!unread_only || !n.read))
            .cloned()
            .collect())
    }

    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let mut notifications = self.notifications.lock().unwrap();
        match notifications.iter_mut().find(|n| n.id == id && n.user_id == user_id) {
            Some(n) => {
                n.read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl ProposalStore for MemoryStore {
    async fn insert(&self, new: &NewProposal) -> Result<Proposal, AppError> {
        let now = Utc::now();
        let proposal = Proposal {
            id: Uuid::new_v4(),
            customer_id: new.customer_id,
            kind: new.kind,
            third_party_company_id: new.third_party_company_id,
            supplier_id: new.supplier_id,
            submitted_by: new.submitted_by,
            work_order_id: new.work_order_id,
            title: new.title.clone(),
            description: new.description.clone(),
            amount: new.amount,
            status: ProposalStatus::EmEspera,
            decided_by: None,
            decided_at: None,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        };
        self.proposals.lock().unwrap().push(proposal.clone());
        Ok(proposal)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Proposal>, AppError> {
        Ok(self.proposals.lock().unwrap().iter().find(|p| p.id == id).cloned())
    }

    async fn list(&self, query: &ProposalQuery) -> Result<Vec<Proposal>, AppError> {
        Ok(self
            .proposals
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.customer_id == query.customer_id)
            .filter(|p| query.status.is_none_or(|s| p.status == s))
            .filter(|p| {
                query
                    .third_party_company_id
                    .is_none_or(|c| p.third_party_company_id == Some(c))
            })
            .cloned()
            .collect())
    }

    async fn decide(
        &self,
        id: Uuid,
        decision: &ProposalDecision,
    ) -> Result<Option<Proposal>, AppError> {
        let mut proposals = self.proposals.lock().unwrap();
        Ok(proposals
            .iter_mut()
            .find(|p| p.id == id && p.status == ProposalStatus::EmEspera)
            .map(|p| {
                p.status = decision.status;
                p.decided_by = Some(decision.decided_by);
                p.decided_at = Some(Utc::now());
                p.rejection_reason = decision.rejection_reason.clone();
                p.clone()
            }))
    }
}

#[async_trait]
impl SlaStore for MemoryStore {
    async fn aggregate(&self, scope: SlaScope, filter: &SlaFilter) -> Result<SlaAggregate, AppError> {
        let rows = self.scoped_work_orders(scope, filter);
        Ok(aggregate_work_orders(&rows))
    }

    async fn aggregate_grouped(
        &self,
        scope: SlaScope,
        grouping: SlaGrouping,
        filter: &SlaFilter,
    ) -> Result<Vec<SlaGroupAggregate>, AppError> {
        let rows = self.scoped_work_orders(scope, filter);

        let key = |wo: &WorkOrder| -> Option<(Option<Uuid>, Option<String>)> {
            match grouping {
                SlaGrouping::ThirdPartyCompany => wo.third_party_company_id.map(|id| (Some(id), None)),
                SlaGrouping::Team => wo.assigned_team_id.map(|id| (Some(id), None)),
                SlaGrouping::Operator => wo.assigned_operator_id.map(|id| (Some(id), None)),
                SlaGrouping::ExecutionType => Some((
                    None,
                    Some(match wo.executed_by_type {
                        ExecutedByType::Internal => "INTERNAL".to_string(),
                        ExecutedByType::ThirdParty => "THIRD_PARTY".to_string(),
                    }),
                )),
            }
        };

        let mut keys: Vec<(Option<Uuid>, Option<String>)> = Vec::new();
        for wo in &rows {
            if let Some(k) = key(wo) {
                if !keys.contains(&k) {
                    keys.push(k);
                }
            }
        }

        Ok(keys
            .into_iter()
            .map(|k| {
                let members: Vec<&WorkOrder> =
                    rows.iter().filter(|wo| key(*wo).as_ref() == Some(&k)).collect();
                SlaGroupAggregate {
                    group_id: k.0,
                    group_name: k.1,
                    aggregate: aggregate_work_orders(members),
                }
            })
            .collect())
    }
}

// ---
// Fábricas de dados de teste
// ---
pub mod fixtures {
    use super::*;
    use crate::models::auth::UserType;

    pub fn customer() -> Customer {
        let now = Utc::now();
        Customer {
            id: Uuid::new_v4(),
            name: "Cliente Teste".into(),
            third_party_enabled: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn company(customer_id: Uuid) -> ThirdPartyCompany {
        let now = Utc::now();
        ThirdPartyCompany {
            id: Uuid::new_v4(),
            customer_id,
            name: "Terceirizada Teste".into(),
            document_number: None,
            email: None,
            phone: None,
            status: CompanyStatus::Active,
            allowed_sites: vec![],
            allowed_zones: vec![],
            asset_visibility_mode: AssetVisibilityMode::All,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn user(customer_id: Uuid, user_type: UserType, role: UserRole) -> User {
        let now = Utc::now();
        let id = Uuid::new_v4();
        User {
            id,
            customer_id: Some(customer_id),
            email: format!("{}@teste.com", id),
            name: "Usuário Teste".into(),
            user_type,
            role,
            third_party_company_id: None,
            supplier_id: None,
            team_id: None,
            push_token: None,
            push_enabled: true,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn third_party_user(company: &ThirdPartyCompany, role: UserRole) -> User {
        let mut u = user(company.customer_id, UserType::ThirdPartyUser, role);
        u.third_party_company_id = Some(company.id);
        u
    }

    pub fn site(customer_id: Uuid) -> Site {
        Site {
            id: Uuid::new_v4(),
            customer_id,
            name: "Unidade".into(),
            module: None,
            active: true,
            created_at: Utc::now(),
        }
    }

    pub fn zone(site: &Site) -> Zone {
        Zone {
            id: Uuid::new_v4(),
            customer_id: site.customer_id,
            site_id: site.id,
            name: "Zona".into(),
            active: true,
            created_at: Utc::now(),
        }
    }

    pub fn equipment(zone: &Zone, contracted: Vec<Uuid>) -> Equipment {
        Equipment {
            id: Uuid::new_v4(),
            customer_id: zone.customer_id,
            zone_id: zone.id,
            name: "Equipamento".into(),
            code: None,
            contracted_third_party_ids: contracted,
            active: true,
            created_at: Utc::now(),
        }
    }

    pub fn work_order(customer_id: Uuid) -> WorkOrder {
        let now = Utc::now();
        WorkOrder {
            id: Uuid::new_v4(),
            customer_id,
            site_id: None,
            zone_id: None,
            equipment_id: None,
            module: None,
            title: "Ordem de teste".into(),
            description: None,
            status: WorkOrderStatus::Aberta,
            executed_by_type: ExecutedByType::Internal,
            third_party_company_id: None,
            assigned_team_id: None,
            assigned_operator_id: None,
            due_date: None,
            started_at: None,
            paused_at: None,
            completed_at: None,
            cancelled_at: None,
            cancellation_reason: None,
            evaluation_score: None,
            evaluation_comment: None,
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn company_work_order(company: &ThirdPartyCompany, status: WorkOrderStatus) -> WorkOrder {
        let mut wo = work_order(company.customer_id);
        wo.third_party_company_id = Some(company.id);
        wo.executed_by_type = ExecutedByType::ThirdParty;
        wo.status = status;
        wo
    }
}
