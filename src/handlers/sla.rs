// src/handlers/sla.rs

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale, third_party::ThirdPartyScope},
    models::sla::{ExecutionComparison, SlaGroupMetrics, SlaMetrics, SlaQuery},
    services::sla_service::resolve_scope,
};

// GET /api/sla/summary
#[utoipa::path(
    get,
    path = "/api/sla/summary",
    tag = "SLA",
    params(SlaQuery),
    responses(
        (status = 200, description = "Indicadores do escopo (operador > equipe > empresa > cliente)", body = SlaMetrics)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_summary(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    scope: ThirdPartyScope,
    Query(query): Query<SlaQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let sla_scope = resolve_scope(&user, scope.context(), &query)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let metrics = app_state
        .services
        .sla
        .metrics(sla_scope, &query.filter())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(metrics))
}

// GET /api/sla/by-company
#[utoipa::path(
    get,
    path = "/api/sla/by-company",
    tag = "SLA",
    params(SlaQuery),
    responses((status = 200, description = "Indicadores por empresa terceira", body = Vec<SlaGroupMetrics>)),
    security(("api_jwt" = []))
)]
pub async fn get_by_company(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    scope: ThirdPartyScope,
    Query(query): Query<SlaQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let sla_scope = resolve_scope(&user, scope.context(), &query)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let rows = app_state
        .services
        .sla
        .by_third_party_company(sla_scope, &query.filter())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(rows))
}

// GET /api/sla/by-team
#[utoipa::path(
    get,
    path = "/api/sla/by-team",
    tag = "SLA",
    params(SlaQuery),
    responses((status = 200, description = "Indicadores por equipe", body = Vec<SlaGroupMetrics>)),
    security(("api_jwt" = []))
)]
pub async fn get_by_team(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    scope: ThirdPartyScope,
    Query(query): Query<SlaQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let sla_scope = resolve_scope(&user, scope.context(), &query)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let rows = app_state
        .services
        .sla
        .by_team(sla_scope, &query.filter())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(rows))
}

// GET /api/sla/by-operator
#[utoipa::path(
    get,
    path = "/api/sla/by-operator",
    tag = "SLA",
    params(SlaQuery),
    responses((status = 200, description = "Indicadores por operador", body = Vec<SlaGroupMetrics>)),
    security(("api_jwt" = []))
)]
pub async fn get_by_operator(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    scope: ThirdPartyScope,
    Query(query): Query<SlaQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let sla_scope = resolve_scope(&user, scope.context(), &query)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let rows = app_state
        .services
        .sla
        .by_operator(sla_scope, &query.filter())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(rows))
}

// GET /api/sla/execution-comparison
#[utoipa::path(
    get,
    path = "/api/sla/execution-comparison",
    tag = "SLA",
    params(SlaQuery),
    responses((status = 200, description = "Execução interna x terceirizada", body = ExecutionComparison)),
    security(("api_jwt" = []))
)]
pub async fn get_execution_comparison(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    scope: ThirdPartyScope,
    Query(query): Query<SlaQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let sla_scope = resolve_scope(&user, scope.context(), &query)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let comparison = app_state
        .services
        .sla
        .internal_vs_third_party(sla_scope, &query.filter())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(comparison))
}
