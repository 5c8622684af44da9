// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::common::i18n::I18nStore;
use crate::middleware::i18n::Locale;
use crate::models::work_order::WorkOrderStatus;

// Nosso tipo de erro de domínio. Cada variante sabe o seu status HTTP e o seu código.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Recurso não encontrado: {0}")]
    ResourceNotFound(String),

    #[error("Acesso negado")]
    Forbidden,

    // --- Isolamento de terceiros ---
    #[error("Empresa terceira não encontrada")]
    ThirdPartyCompanyNotFound,

    #[error("Empresa terceira inativa")]
    ThirdPartyCompanyInactive,

    #[error("Contexto de terceiro ausente")]
    ThirdPartyContextMissing,

    #[error("Acesso negado ao cliente")]
    CustomerAccessDenied,

    #[error("Acesso negado à unidade")]
    SiteAccessDenied,

    #[error("Acesso negado à zona")]
    ZoneAccessDenied,

    #[error("Acesso negado ao recurso: {0}")]
    DataAccessDenied(String),

    // --- Regras de negócio ---
    #[error("Transição inválida de {from:?} para {to:?}")]
    InvalidStatusTransition {
        from: WorkOrderStatus,
        to: WorkOrderStatus,
    },

    #[error("Proposta já decidida")]
    ProposalAlreadyDecided,

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::UserNotFound => StatusCode::UNAUTHORIZED,
            AppError::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            // Não encontrado no carregamento do contexto também é 403:
            // não confirmamos nem negamos a existência para quem não tem acesso.
            AppError::Forbidden
            | AppError::ThirdPartyCompanyNotFound
            | AppError::ThirdPartyCompanyInactive
            | AppError::ThirdPartyContextMissing
            | AppError::CustomerAccessDenied
            | AppError::SiteAccessDenied
            | AppError::ZoneAccessDenied
            | AppError::DataAccessDenied(_) => StatusCode::FORBIDDEN,
            AppError::InvalidStatusTransition { .. } | AppError::ProposalAlreadyDecided => {
                StatusCode::CONFLICT
            }
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Código legível por máquina enviado no corpo do erro.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::InvalidToken => "INVALID_TOKEN",
            AppError::UserNotFound => "USER_NOT_FOUND",
            AppError::ResourceNotFound(_) => "RESOURCE_NOT_FOUND",
            AppError::Forbidden => "FORBIDDEN",
            AppError::ThirdPartyCompanyNotFound => "THIRD_PARTY_COMPANY_NOT_FOUND",
            AppError::ThirdPartyCompanyInactive => "THIRD_PARTY_COMPANY_INACTIVE",
            AppError::ThirdPartyContextMissing => "THIRD_PARTY_CONTEXT_MISSING",
            AppError::CustomerAccessDenied => "CUSTOMER_ACCESS_DENIED",
            AppError::SiteAccessDenied => "SITE_ACCESS_DENIED",
            AppError::ZoneAccessDenied => "ZONE_ACCESS_DENIED",
            AppError::DataAccessDenied(_) => "DATA_ACCESS_DENIED",
            AppError::InvalidStatusTransition { .. } => "INVALID_STATUS_TRANSITION",
            AppError::ProposalAlreadyDecided => "PROPOSAL_ALREADY_DECIDED",
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => "INTERNAL_ERROR",
        }
    }

    /// Converte para a resposta HTTP, traduzindo a mensagem para o idioma do cliente.
    /// Detalhes internos (SQL, anyhow, ids) ficam só no log.
    pub fn to_api_error(&self, locale: &Locale, store: &I18nStore) -> ApiError {
        let status = self.status();
        let code = self.code();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Erro Interno do Servidor: {:?}", self);
        }

        let details = match self {
            AppError::ValidationError(errors) => {
                let mut details = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<Value> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| Value::String(m.to_string())))
                        .collect();
                    details.insert(field.to_string(), Value::Array(messages));
                }
                Some(Value::Object(details))
            }
            _ => None,
        };

        ApiError {
            status,
            error: store.translate(&locale.0, status_key(status)),
            message: store.translate(&locale.0, code),
            code,
            details,
        }
    }
}

fn status_key(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => "error.bad_request",
        StatusCode::UNAUTHORIZED => "error.unauthorized",
        StatusCode::FORBIDDEN => "error.forbidden",
        StatusCode::NOT_FOUND => "error.not_found",
        StatusCode::CONFLICT => "error.conflict",
        _ => "error.internal",
    }
}

// ---
// ApiError: o formato que sai na resposta HTTP
// ---
// Corpo: {error, message, code, details?}
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub message: String,
    pub code: &'static str,
    pub details: Option<Value>,
}

#[derive(Debug, Serialize)]
struct ApiErrorBody<'a> {
    error: &'a str,
    message: &'a str,
    code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ApiErrorBody {
            error: &self.error,
            message: &self.message,
            code: self.code,
            details: self.details.as_ref(),
        });
        (self.status, body).into_response()
    }
}

// Sem contexto de idioma (extratores, middlewares internos): usa o idioma padrão.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let store = I18nStore::default();
        let locale = Locale(store.default_locale().to_string());
        self.to_api_error(&locale, &store).into_response()
    }
}
