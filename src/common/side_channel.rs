// src/common/side_channel.rs

use uuid::Uuid;

use crate::common::error::AppError;

// ---
// Canal lateral não-bloqueante
// ---
// Auditoria, notificação e push nunca podem derrubar a operação principal.
// Em vez de um try/catch implícito, o resultado desses efeitos vira um
// `SideEffect`: ele pode ser observado (logado) mas não tem conversão para
// `AppError`, então não dá para propagá-lo com `?` por engano.
#[must_use = "efeitos colaterais devem ser observados com `.log()`"]
#[derive(Debug)]
pub struct SideEffect<T> {
    channel: &'static str,
    entity_id: Option<Uuid>,
    result: Result<T, AppError>,
}

impl<T> SideEffect<T> {
    pub fn new(channel: &'static str, result: Result<T, AppError>) -> Self {
        Self { channel, entity_id: None, result }
    }

    /// Entidade afetada, só para o log.
    pub fn for_entity(mut self, entity_id: Uuid) -> Self {
        self.entity_id = Some(entity_id);
        self
    }

    /// Registra a falha (se houver) e devolve o valor apenas quando deu certo.
    pub fn log(self) -> Option<T> {
        match self.result {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(
                    channel = self.channel,
                    entity_id = ?self.entity_id,
                    error = %e,
                    "⚠️ Efeito colateral falhou (ignorado)"
                );
                None
            }
        }
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Executa um efeito colateral assíncrono dentro da sua própria fronteira de erro.
pub async fn best_effort<T, F>(channel: &'static str, fut: F) -> Option<T>
where
    F: std::future::Future<Output = Result<T, AppError>>,
{
    SideEffect::new(channel, fut.await).log()
}
