// src/handlers/proposals.rs

use axum::{
    extract::{Path, Query, State},
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
        proposal::{Proposal, ProposalQuery, RejectProposalPayload, SubmitProposalPayload},
    },
};

// POST /api/proposals
#[utoipa::path(
    post,
    path = "/api/proposals",
    tag = "Proposals",
    request_body = SubmitProposalPayload,
    responses(
        (status = 201, description = "Proposta enviada (em_espera)", body = Proposal),
        (status = 403, description = "Usuários internos não enviam propostas")
    ),
    security(("api_jwt" = []))
)]
pub async fn submit_proposal(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    scope: ThirdPartyScope,
    Json(payload): Json<SubmitProposalPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let proposal = app_state
        .services
        .proposals
        .submit(&user, scope.context(), payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(proposal)))
}

// GET /api/proposals
#[utoipa::path(
    get,
    path = "/api/proposals",
    tag = "Proposals",
    params(ProposalQuery),
    responses((status = 200, description = "Propostas visíveis ao chamador", body = Vec<Proposal>)),
    security(("api_jwt" = []))
)]
pub async fn list_proposals(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    scope: ThirdPartyScope,
    Query(query): Query<ProposalQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let proposals = app_state
        .services
        .proposals
        .list(&user, scope.context(), query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(proposals))
}

// POST /api/proposals/{id}/approve
#[utoipa::path(
    post,
    path = "/api/proposals/{id}/approve",
    tag = "Proposals",
    params(("id" = Uuid, Path, description = "ID da proposta")),
    responses(
        (status = 200, description = "Proposta aprovada", body = Proposal),
        (status = 409, description = "Proposta já decidida")
    ),
    security(("api_jwt" = []))
)]
pub async fn approve_proposal(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireRole<CustomerAdmin>,
    origin: RequestOrigin,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let proposal = app_state
        .services
        .proposals
        .approve(&user, id, origin)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(proposal))
}

// POST /api/proposals/{id}/reject
#[utoipa::path(
    post,
    path = "/api/proposals/{id}/reject",
    tag = "Proposals",
    request_body = RejectProposalPayload,
    params(("id" = Uuid, Path, description = "ID da proposta")),
    responses(
        (status = 200, description = "Proposta recusada", body = Proposal),
        (status = 409, description = "Proposta já decidida")
    ),
    security(("api_jwt" = []))
)]
pub async fn reject_proposal(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireRole<CustomerAdmin>,
    origin: RequestOrigin,
    Path(id): Path<Uuid>,
    Json(payload): Json<RejectProposalPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let proposal = app_state
        .services
        .proposals
        .reject(&user, id, payload.reason, origin)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(proposal))
}
