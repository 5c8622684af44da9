// src/services/audit_service.rs

use std::sync::Arc;

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{
    common::{error::AppError, side_channel::SideEffect},
    db::AuditStore,
    models::{
        audit::{AuditAction, AuditActor, NewAuditEntry, RequestOrigin, WorkOrderAuditLog},
        work_order::WorkOrderStatus,
    },
};

// Campos que mudam a cada escrita e só poluiriam o diff
const IGNORED_DIFF_KEYS: [&str; 2] = ["updatedAt", "updated_at"];

// Um evento do ciclo de vida, antes de virar linha no log
#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub work_order_id: Uuid,
    pub action: AuditAction,
    pub actor: AuditActor,
    pub previous_value: Option<Value>,
    pub new_value: Option<Value>,
    pub description: Option<String>,
    pub origin: RequestOrigin,
}

impl AuditEvent {
    pub fn new(work_order_id: Uuid, action: AuditAction, actor: AuditActor, origin: RequestOrigin) -> Self {
        Self {
            work_order_id,
            action,
            actor,
            previous_value: None,
            new_value: None,
            description: None,
            origin,
        }
    }

    pub fn values(mut self, previous: Option<Value>, new: Option<Value>) -> Self {
        self.previous_value = previous;
        self.new_value = new;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Descrição legível gerada quando o chamador não informa uma.
pub fn default_description(action: AuditAction, new_value: Option<&Value>) -> String {
    let status = new_value
        .and_then(|v| v.get("status"))
        .and_then(Value::as_str);

    match action {
        AuditAction::Created => "Ordem de serviço criada".into(),
        AuditAction::Updated => "Ordem de serviço atualizada".into(),
        AuditAction::StatusChanged => match status {
            Some(s) => format!("Status alterado para {}", s),
            None => "Status alterado".into(),
        },
        AuditAction::Assigned => "Ordem de serviço atribuída".into(),
        AuditAction::ExecutionStarted => "Execução iniciada".into(),
        AuditAction::ExecutionPaused => "Execução pausada".into(),
        AuditAction::ExecutionResumed => "Execução retomada".into(),
        AuditAction::Completed => "Ordem de serviço concluída".into(),
        AuditAction::Evaluated => "Ordem de serviço avaliada".into(),
        AuditAction::Commented => "Comentário adicionado".into(),
        AuditAction::Reopened => "Ordem de serviço reaberta".into(),
        AuditAction::Cancelled => "Ordem de serviço cancelada".into(),
        AuditAction::Approved => "Proposta aprovada".into(),
        AuditAction::Rejected => "Proposta recusada".into(),
        AuditAction::AttachmentAdded => "Anexo adicionado".into(),
    }
}

/// Diff campo a campo de dois objetos JSON. Só as chaves que mudaram entram,
/// `updatedAt` fica de fora. `None` quando nada relevante mudou.
pub fn diff_fields(before: &Value, after: &Value) -> Option<(Value, Value)> {
    let empty = Map::new();
    let before = before.as_object().unwrap_or(&empty);
    let after = after.as_object().unwrap_or(&empty);

    let mut previous = Map::new();
    let mut new = Map::new();

    let keys = before.keys().chain(after.keys().filter(|k| !before.contains_key(*k)));
    for key in keys {
        if IGNORED_DIFF_KEYS.contains(&key.as_str()) {
            continue;
        }
        let old = before.get(key).cloned().unwrap_or(Value::Null);
        let cur = after.get(key).cloned().unwrap_or(Value::Null);
        if old != cur {
            previous.insert(key.clone(), old);
            new.insert(key.clone(), cur);
        }
    }

    if new.is_empty() {
        None
    } else {
        Some((Value::Object(previous), Value::Object(new)))
    }
}

fn status_value(status: WorkOrderStatus) -> Value {
    serde_json::json!({ "status": status.as_str() })
}

// ---
// O serviço
// ---
// Escrita é sempre best-effort: uma falha no log nunca derruba a operação
// que ele descreve. Leitura do histórico, por outro lado, propaga o erro.
#[derive(Clone)]
pub struct AuditService {
    store: Arc<dyn AuditStore>,
}

impl AuditService {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self { store }
    }

    pub async fn record(&self, event: AuditEvent) -> SideEffect<WorkOrderAuditLog> {
        let description = event
            .description
            .unwrap_or_else(|| default_description(event.action, event.new_value.as_ref()));

        let entry = NewAuditEntry {
            work_order_id: event.work_order_id,
            action: event.action,
            actor: event.actor,
            previous_value: event.previous_value,
            new_value: event.new_value,
            description,
            origin: event.origin,
        };

        SideEffect::new("audit", self.store.append(&entry).await).for_entity(entry.work_order_id)
    }

    /// Atalho para mudanças de status: `{status: anterior}` -> `{status: novo}`.
    pub async fn record_status_change(
        &self,
        work_order_id: Uuid,
        action: AuditAction,
        actor: AuditActor,
        from: WorkOrderStatus,
        to: WorkOrderStatus,
        origin: RequestOrigin,
    ) -> SideEffect<WorkOrderAuditLog> {
        let event = AuditEvent::new(work_order_id, action, actor, origin)
            .values(Some(status_value(from)), Some(status_value(to)));
        self.record(event).await
    }

    /// Atualização genérica: grava só o diff. Nada a registrar quando nada mudou.
    pub async fn record_update(
        &self,
        work_order_id: Uuid,
        actor: AuditActor,
        before: &Value,
        after: &Value,
        origin: RequestOrigin,
    ) -> Option<SideEffect<WorkOrderAuditLog>> {
        let (previous, new) = diff_fields(before, after)?;
        let event = AuditEvent::new(work_order_id, AuditAction::Updated, actor, origin)
            .values(Some(previous), Some(new));
        Some(self.record(event).await)
    }

    pub async fn history(&self, work_order_id: Uuid) -> Result<Vec<WorkOrderAuditLog>, AppError> {
        self.store.list_for_work_order(work_order_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::models::audit::AuditSource;
    use serde_json::json;

    #[test]
    fn diff_records_only_changed_keys_and_skips_updated_at() {
        let before = json!({"title": "A", "priority": 1, "updatedAt": "2024-01-01"});
        let after = json!({"title": "B", "priority": 1, "updatedAt": "2024-02-02", "notes": "x"});

        let (previous, new) = diff_fields(&before, &after).unwrap();
        assert_eq!(previous, json!({"title": "A", "notes": null}));
        assert_eq!(new, json!({"title": "B", "notes": "x"}));
    }

    #[test]
    fn diff_of_only_timestamps_is_empty() {
        let before = json!({"updatedAt": "1", "updated_at": "1"});
        let after = json!({"updatedAt": "2", "updated_at": "2"});
        assert!(diff_fields(&before, &after).is_none());
    }

    #[test]
    fn descriptions_are_generated_per_action() {
        assert_eq!(
            default_description(AuditAction::StatusChanged, Some(&json!({"status": "cancelada"}))),
            "Status alterado para cancelada"
        );
        assert_eq!(default_description(AuditAction::Created, None), "Ordem de serviço criada");
    }

    #[tokio::test]
    async fn system_actor_and_auto_description_are_persisted() {
        let store = MemoryStore::new();
        let service = AuditService::new(store.clone());
        let wo = Uuid::new_v4();

        let log = service
            .record_status_change(
                wo,
                AuditAction::StatusChanged,
                AuditActor::system(),
                WorkOrderStatus::Aberta,
                WorkOrderStatus::Cancelada,
                RequestOrigin::system(),
            )
            .await
            .log()
            .unwrap();

        assert_eq!(log.actor_name, "Sistema");
        assert_eq!(log.actor_id, None);
        assert_eq!(log.source, AuditSource::System);
        assert_eq!(log.description, "Status alterado para cancelada");
        assert_eq!(service.history(wo).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn explicit_description_wins() {
        let store = MemoryStore::new();
        let service = AuditService::new(store.clone());
        let event = AuditEvent::new(
            Uuid::new_v4(),
            AuditAction::Commented,
            AuditActor::user(Uuid::new_v4(), "Ana"),
            RequestOrigin::default(),
        )
        .description("Trocar também a correia");

        let log = service.record(event).await.log().unwrap();
        assert_eq!(log.description, "Trocar também a correia");
        assert_eq!(log.actor_name, "Ana");
    }

    #[tokio::test]
    async fn store_failure_is_swallowed() {
        let store = MemoryStore::new();
        *store.fail_audit.lock().unwrap() = true;
        let service = AuditService::new(store.clone());

        let effect = service
            .record(AuditEvent::new(
                Uuid::new_v4(),
                AuditAction::Created,
                AuditActor::system(),
                RequestOrigin::system(),
            ))
            .await;
        assert!(!effect.is_ok());
        assert!(effect.log().is_none());
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn audit_outage_is_logged_once_with_the_work_order() {
        let store = MemoryStore::new();
        *store.fail_audit.lock().unwrap() = true;
        let service = AuditService::new(store.clone());
        let work_order_id = Uuid::new_v4();

        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            futures::executor::block_on(async {
                let event = AuditEvent::new(
                    work_order_id,
                    AuditAction::Created,
                    AuditActor::system(),
                    RequestOrigin::system(),
                );
                service.record(event).await.log();
            })
        });

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert_eq!(output.lines().count(), 1, "{output}");
        assert!(output.contains("audit"));
        assert!(output.contains(&work_order_id.to_string()));
    }

    #[tokio::test]
    async fn unchanged_update_is_not_logged() {
        let store = MemoryStore::new();
        let service = AuditService::new(store.clone());
        let value = json!({"title": "A"});
        let out = service
            .record_update(Uuid::new_v4(), AuditActor::system(), &value, &value, RequestOrigin::system())
            .await;
        assert!(out.is_none());
        assert_eq!(store.audit_count(), 0);
    }
}
