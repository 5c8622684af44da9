// src/middleware/third_party.rs

use axum::{
    body::{to_bytes, Body},
    extract::{FromRequestParts, Query, RawPathParams, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use serde_json::Value;
use validator::{ValidationError, ValidationErrors};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::third_party::ThirdPartyContext,
    services::access_service::{validate_requested_scope, RequestedScope, ScopeSource},
};

const SCOPE_BODY_LIMIT: usize = 2 * 1024 * 1024;

// ---
// Contexto de terceiro
// ---
// Carregado uma vez por requisição, depois do auth_guard. `None` para usuários internos
// e fornecedores. Empresa ausente ou inativa encerra a requisição com 403.
#[derive(Debug, Clone)]
pub struct ThirdPartyScope(pub Option<ThirdPartyContext>);

impl ThirdPartyScope {
    pub fn context(&self) -> Option<&ThirdPartyContext> {
        self.0.as_ref()
    }
}

pub async fn third_party_context(
    State(app_state): State<AppState>,
    locale: Locale,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(AuthenticatedUser(user)) = request.extensions().get::<AuthenticatedUser>().cloned()
    else {
        return Err(AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store));
    };

    let context = app_state
        .services
        .context
        .load_third_party_context(&user)
        .await
        .map_err(|e| {
            tracing::warn!(user_id = %user.id, code = e.code(), "Contexto de terceiro recusado");
            e.to_api_error(&locale, &app_state.i18n_store)
        })?;

    if let Some(ctx) = &context {
        tracing::debug!(user_id = %user.id, company_id = %ctx.company_id, "Contexto de terceiro carregado");
    }

    request.extensions_mut().insert(ThirdPartyScope(context));
    Ok(next.run(request).await)
}

// Se o middleware de contexto não rodou, um terceiro não pode seguir sem escopo.
impl<S> FromRequestParts<S> for ThirdPartyScope
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(scope) = parts.extensions.get::<ThirdPartyScope>() {
            return Ok(scope.clone());
        }
        match parts.extensions.get::<AuthenticatedUser>() {
            Some(AuthenticatedUser(user)) if user.is_third_party() => {
                Err(AppError::ThirdPartyContextMissing)
            }
            _ => Ok(ThirdPartyScope(None)),
        }
    }
}

// ---
// Guardião de escopo
// ---
// Lê customerId/siteId/zoneId do path, do corpo JSON e da query (nessa precedência)
// e aplica a cadeia cliente -> unidade -> zona. Para quem não tem contexto, passa direto.
pub async fn scope_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    scope: ThirdPartyScope,
    path_params: Result<RawPathParams, axum::extract::rejection::RawPathParamsRejection>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(ctx) = scope.0 else {
        return Ok(next.run(request).await);
    };

    let from_path = path_params
        .map(|params| ScopeSource::from_pairs(params.iter()))
        .unwrap_or_default();

    let from_query = Query::<Vec<(String, String)>>::try_from_uri(request.uri())
        .map(|Query(pairs)| {
            ScopeSource::from_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        })
        .unwrap_or_default();

    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, SCOPE_BODY_LIMIT).await.map_err(|_| {
        let mut errors = ValidationErrors::new();
        errors.add("body", ValidationError::new("payload_too_large"));
        AppError::ValidationError(errors).to_api_error(&locale, &app_state.i18n_store)
    })?;

    let from_body = serde_json::from_slice::<Value>(&bytes)
        .map(|body| ScopeSource::from_json(&body))
        .unwrap_or_default();

    let requested = RequestedScope::resolve(from_path, from_body, from_query);
    validate_requested_scope(Some(&ctx), &requested).map_err(|e| {
        tracing::warn!(
            company_id = %ctx.company_id,
            code = e.code(),
            "Acesso fora do escopo da empresa terceira"
        );
        e.to_api_error(&locale, &app_state.i18n_store)
    })?;

    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}
