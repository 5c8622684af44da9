// src/handlers/locations.rs

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale, third_party::ThirdPartyScope},
    models::location::{Equipment, LocationQuery, Site, Zone},
    services::access_service::authorize_customer,
};

// Listagens já recortadas pelo escopo da empresa terceira (quando houver).
// Falha de infraestrutura aparece como lista vazia.

#[utoipa::path(
    get,
    path = "/api/locations/sites",
    tag = "Locations",
    params(LocationQuery),
    responses(
        (status = 200, description = "Unidades visíveis", body = Vec<Site>),
        (status = 403, description = "Fora do escopo")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_sites(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    scope: ThirdPartyScope,
    Query(query): Query<LocationQuery>,
) -> Result<impl IntoResponse, ApiError> {
    authorize_customer(&user, scope.context(), query.customer_id)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let sites = app_state
        .services
        .scope
        .filtered_sites(query.customer_id, query.module.as_deref(), scope.context())
        .await;

    Ok(Json(sites))
}

#[utoipa::path(
    get,
    path = "/api/locations/zones",
    tag = "Locations",
    params(LocationQuery),
    responses(
        (status = 200, description = "Zonas visíveis", body = Vec<Zone>),
        (status = 403, description = "Fora do escopo")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_zones(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    scope: ThirdPartyScope,
    Query(query): Query<LocationQuery>,
) -> Result<impl IntoResponse, ApiError> {
    authorize_customer(&user, scope.context(), query.customer_id)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let zones = app_state
        .services
        .scope
        .filtered_zones(
            query.customer_id,
            query.site_id,
            query.module.as_deref(),
            scope.context(),
        )
        .await;

    Ok(Json(zones))
}

#[utoipa::path(
    get,
    path = "/api/locations/equipment",
    tag = "Locations",
    params(LocationQuery),
    responses(
        (status = 200, description = "Equipamentos visíveis (respeita CONTRACT_ONLY)", body = Vec<Equipment>),
        (status = 403, description = "Fora do escopo")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_equipment(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    scope: ThirdPartyScope,
    Query(query): Query<LocationQuery>,
) -> Result<impl IntoResponse, ApiError> {
    authorize_customer(&user, scope.context(), query.customer_id)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let equipment = app_state
        .services
        .scope
        .filtered_equipment(
            query.customer_id,
            query.site_id,
            query.zone_id,
            query.module.as_deref(),
            scope.context(),
        )
        .await;

    Ok(Json(equipment))
}
