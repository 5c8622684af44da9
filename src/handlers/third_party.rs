// src/handlers/third_party.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{CustomerAdmin, RequireRole},
        third_party::ThirdPartyScope,
    },
    models::{
        audit::RequestOrigin,
        third_party::{
            CleanupSummary, CreateThirdPartyCompanyPayload, ModuleCleanupSummary,
            ThirdPartyCompany, ThirdPartyContext, UpdateCompanyScopePayload,
        },
    },
};

// =============================================================================
//  1. CONTEXTO DO CHAMADOR
// =============================================================================

// GET /api/third-party/context
#[utoipa::path(
    get,
    path = "/api/third-party/context",
    tag = "Third Parties",
    responses(
        (status = 200, description = "Contexto da empresa terceira (null para usuários internos)", body = ThirdPartyContext),
        (status = 403, description = "Empresa terceira ausente ou inativa")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_context(scope: ThirdPartyScope) -> Json<Option<ThirdPartyContext>> {
    Json(scope.0)
}

// =============================================================================
//  2. ADMINISTRAÇÃO DAS EMPRESAS
// =============================================================================

// POST /api/customers/{customerId}/third-party-companies
#[utoipa::path(
    post,
    path = "/api/customers/{customerId}/third-party-companies",
    tag = "Third Parties",
    request_body = CreateThirdPartyCompanyPayload,
    params(("customerId" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 201, description = "Empresa criada", body = ThirdPartyCompany),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Sem permissão sobre o cliente")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_company(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireRole<CustomerAdmin>,
    Path(customer_id): Path<Uuid>,
    Json(payload): Json<CreateThirdPartyCompanyPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let company = app_state
        .services
        .third_parties
        .create(&user, customer_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(company)))
}

// GET /api/customers/{customerId}/third-party-companies
#[utoipa::path(
    get,
    path = "/api/customers/{customerId}/third-party-companies",
    tag = "Third Parties",
    params(("customerId" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Empresas terceiras do cliente", body = Vec<ThirdPartyCompany>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_companies(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireRole<CustomerAdmin>,
    Path(customer_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let companies = app_state
        .services
        .third_parties
        .list(&user, customer_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(companies))
}

// GET /api/third-party-companies/{id}
#[utoipa::path(
    get,
    path = "/api/third-party-companies/{id}",
    tag = "Third Parties",
    params(("id" = Uuid, Path, description = "ID da empresa terceira")),
    responses(
        (status = 200, description = "Empresa terceira", body = ThirdPartyCompany),
        (status = 404, description = "Empresa não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_company(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireRole<CustomerAdmin>,
    Path(company_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let company = app_state
        .services
        .third_parties
        .get(&user, company_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(company))
}

// PUT /api/third-party-companies/{id}/scope
#[utoipa::path(
    put,
    path = "/api/third-party-companies/{id}/scope",
    tag = "Third Parties",
    request_body = UpdateCompanyScopePayload,
    params(("id" = Uuid, Path, description = "ID da empresa terceira")),
    responses(
        (status = 200, description = "Escopo atualizado", body = ThirdPartyCompany)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_scope(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireRole<CustomerAdmin>,
    Path(company_id): Path<Uuid>,
    Json(payload): Json<UpdateCompanyScopePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let company = app_state
        .services
        .third_parties
        .update_scope(&user, company_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(company))
}

// POST /api/third-party-companies/{id}/deactivate
#[utoipa::path(
    post,
    path = "/api/third-party-companies/{id}/deactivate",
    tag = "Third Parties",
    params(("id" = Uuid, Path, description = "ID da empresa terceira")),
    responses(
        (status = 200, description = "Empresa desativada; ordens abertas canceladas e usuários desativados", body = CleanupSummary)
    ),
    security(("api_jwt" = []))
)]
pub async fn deactivate_company(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireRole<CustomerAdmin>,
    origin: RequestOrigin,
    Path(company_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = app_state
        .services
        .third_parties
        .deactivate(&user, company_id, origin)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(summary))
}

// POST /api/third-party-companies/{id}/reactivate
#[utoipa::path(
    post,
    path = "/api/third-party-companies/{id}/reactivate",
    tag = "Third Parties",
    params(("id" = Uuid, Path, description = "ID da empresa terceira")),
    responses(
        (status = 200, description = "Empresa reativada (ordens e usuários não são restaurados)", body = ThirdPartyCompany)
    ),
    security(("api_jwt" = []))
)]
pub async fn reactivate_company(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireRole<CustomerAdmin>,
    Path(company_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let company = app_state
        .services
        .third_parties
        .reactivate(&user, company_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(company))
}

// POST /api/customers/{customerId}/third-party-module/disable
#[utoipa::path(
    post,
    path = "/api/customers/{customerId}/third-party-module/disable",
    tag = "Third Parties",
    params(("customerId" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Resultado por empresa; o módulo só é desligado se todas concluírem", body = ModuleCleanupSummary)
    ),
    security(("api_jwt" = []))
)]
pub async fn disable_module(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireRole<CustomerAdmin>,
    origin: RequestOrigin,
    Path(customer_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = app_state
        .services
        .third_parties
        .disable_module(&user, customer_id, origin)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(summary))
}
