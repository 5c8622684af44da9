// src/handlers/work_orders.rs

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
        rbac::{Dispatcher, RequireRole},
        third_party::ThirdPartyScope,
    },
    models::{
        audit::{RequestOrigin, WorkOrderAuditLog},
        auth::User,
        work_order::{
            AssignWorkOrderPayload, CancelWorkOrderPayload, CommentPayload,
            CreateWorkOrderPayload, EvaluateWorkOrderPayload, UpdateWorkOrderPayload, WorkOrder,
            WorkOrderFilter,
        },
    },
    services::work_order_service::LifecycleCommand,
};

// =============================================================================
//  1. CONSULTA
// =============================================================================

// GET /api/work-orders
#[utoipa::path(
    get,
    path = "/api/work-orders",
    tag = "Work Orders",
    params(WorkOrderFilter),
    responses(
        (status = 200, description = "Ordens visíveis ao chamador", body = Vec<WorkOrder>),
        (status = 403, description = "Fora do escopo")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_work_orders(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    scope: ThirdPartyScope,
    Query(filter): Query<WorkOrderFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let work_orders = app_state
        .services
        .work_orders
        .list(&user, scope.context(), filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(work_orders))
}

// GET /api/work-orders/{id}
#[utoipa::path(
    get,
    path = "/api/work-orders/{id}",
    tag = "Work Orders",
    params(("id" = Uuid, Path, description = "ID da ordem de serviço")),
    responses(
        (status = 200, description = "Ordem de serviço", body = WorkOrder),
        (status = 403, description = "Fora do escopo"),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_work_order(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    scope: ThirdPartyScope,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let wo = app_state
        .services
        .work_orders
        .get(&user, scope.context(), id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(wo))
}

// GET /api/work-orders/{id}/history
#[utoipa::path(
    get,
    path = "/api/work-orders/{id}/history",
    tag = "Work Orders",
    params(("id" = Uuid, Path, description = "ID da ordem de serviço")),
    responses(
        (status = 200, description = "Trilha de auditoria, mais antiga primeiro", body = Vec<WorkOrderAuditLog>)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_history(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    scope: ThirdPartyScope,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let history = app_state
        .services
        .work_orders
        .history(&user, scope.context(), id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(history))
}

// =============================================================================
//  2. CADASTRO E ATRIBUIÇÃO (usuários internos)
// =============================================================================

// POST /api/work-orders
#[utoipa::path(
    post,
    path = "/api/work-orders",
    tag = "Work Orders",
    request_body = CreateWorkOrderPayload,
    responses(
        (status = 201, description = "Ordem criada com status aberta", body = WorkOrder),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_work_order(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireRole<Dispatcher>,
    scope: ThirdPartyScope,
    origin: RequestOrigin,
    Json(payload): Json<CreateWorkOrderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let wo = app_state
        .services
        .work_orders
        .create(&user, scope.context(), payload, origin)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(wo)))
}

// PATCH /api/work-orders/{id}
#[utoipa::path(
    patch,
    path = "/api/work-orders/{id}",
    tag = "Work Orders",
    request_body = UpdateWorkOrderPayload,
    params(("id" = Uuid, Path, description = "ID da ordem de serviço")),
    responses(
        (status = 200, description = "Ordem atualizada; só os campos alterados vão para a auditoria", body = WorkOrder)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_work_order(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireRole<Dispatcher>,
    scope: ThirdPartyScope,
    origin: RequestOrigin,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateWorkOrderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let wo = app_state
        .services
        .work_orders
        .update(&user, scope.context(), id, payload, origin)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(wo))
}

// POST /api/work-orders/{id}/assign
#[utoipa::path(
    post,
    path = "/api/work-orders/{id}/assign",
    tag = "Work Orders",
    request_body = AssignWorkOrderPayload,
    params(("id" = Uuid, Path, description = "ID da ordem de serviço")),
    responses(
        (status = 200, description = "Ordem atribuída; destinatários notificados", body = WorkOrder),
        (status = 400, description = "Nenhum destino informado")
    ),
    security(("api_jwt" = []))
)]
pub async fn assign_work_order(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireRole<Dispatcher>,
    scope: ThirdPartyScope,
    origin: RequestOrigin,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignWorkOrderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let wo = app_state
        .services
        .work_orders
        .assign(&user, scope.context(), id, payload, origin)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(wo))
}

// =============================================================================
//  3. CICLO DE VIDA
// =============================================================================

async fn run_transition(
    app_state: &AppState,
    locale: &Locale,
    user: &User,
    scope: &ThirdPartyScope,
    id: Uuid,
    command: LifecycleCommand,
    origin: RequestOrigin,
) -> Result<Json<WorkOrder>, ApiError> {
    app_state
        .services
        .work_orders
        .transition(user, scope.context(), id, command, origin)
        .await
        .map(Json)
        .map_err(|e| e.to_api_error(locale, &app_state.i18n_store))
}

// POST /api/work-orders/{id}/start
#[utoipa::path(
    post,
    path = "/api/work-orders/{id}/start",
    tag = "Work Orders",
    params(("id" = Uuid, Path, description = "ID da ordem de serviço")),
    responses(
        (status = 200, description = "aberta -> em_execucao", body = WorkOrder),
        (status = 409, description = "Transição inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn start_work_order(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    scope: ThirdPartyScope,
    origin: RequestOrigin,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    run_transition(&app_state, &locale, &user, &scope, id, LifecycleCommand::Start, origin).await
}

// POST /api/work-orders/{id}/pause
#[utoipa::path(
    post,
    path = "/api/work-orders/{id}/pause",
    tag = "Work Orders",
    params(("id" = Uuid, Path, description = "ID da ordem de serviço")),
    responses(
        (status = 200, description = "em_execucao -> pausada", body = WorkOrder),
        (status = 409, description = "Transição inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn pause_work_order(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    scope: ThirdPartyScope,
    origin: RequestOrigin,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    run_transition(&app_state, &locale, &user, &scope, id, LifecycleCommand::Pause, origin).await
}

// POST /api/work-orders/{id}/resume
#[utoipa::path(
    post,
    path = "/api/work-orders/{id}/resume",
    tag = "Work Orders",
    params(("id" = Uuid, Path, description = "ID da ordem de serviço")),
    responses(
        (status = 200, description = "pausada -> em_execucao", body = WorkOrder),
        (status = 409, description = "Transição inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn resume_work_order(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    scope: ThirdPartyScope,
    origin: RequestOrigin,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    run_transition(&app_state, &locale, &user, &scope, id, LifecycleCommand::Resume, origin).await
}

// POST /api/work-orders/{id}/complete
#[utoipa::path(
    post,
    path = "/api/work-orders/{id}/complete",
    tag = "Work Orders",
    params(("id" = Uuid, Path, description = "ID da ordem de serviço")),
    responses(
        (status = 200, description = "em_execucao -> concluida", body = WorkOrder),
        (status = 409, description = "Transição inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn complete_work_order(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    scope: ThirdPartyScope,
    origin: RequestOrigin,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    run_transition(&app_state, &locale, &user, &scope, id, LifecycleCommand::Complete, origin).await
}

// POST /api/work-orders/{id}/cancel
#[utoipa::path(
    post,
    path = "/api/work-orders/{id}/cancel",
    tag = "Work Orders",
    request_body = CancelWorkOrderPayload,
    params(("id" = Uuid, Path, description = "ID da ordem de serviço")),
    responses(
        (status = 200, description = "Ordem cancelada", body = WorkOrder),
        (status = 409, description = "Transição inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn cancel_work_order(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireRole<Dispatcher>,
    scope: ThirdPartyScope,
    origin: RequestOrigin,
    Path(id): Path<Uuid>,
    Json(payload): Json<CancelWorkOrderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let command = LifecycleCommand::Cancel { reason: payload.reason };
    run_transition(&app_state, &locale, &user, &scope, id, command, origin).await
}

// POST /api/work-orders/{id}/reopen
#[utoipa::path(
    post,
    path = "/api/work-orders/{id}/reopen",
    tag = "Work Orders",
    params(("id" = Uuid, Path, description = "ID da ordem de serviço")),
    responses(
        (status = 200, description = "concluida | cancelada | vencida -> aberta", body = WorkOrder),
        (status = 409, description = "Transição inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn reopen_work_order(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireRole<Dispatcher>,
    scope: ThirdPartyScope,
    origin: RequestOrigin,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    run_transition(&app_state, &locale, &user, &scope, id, LifecycleCommand::Reopen, origin).await
}

// =============================================================================
//  4. COMENTÁRIO E AVALIAÇÃO
// =============================================================================

// POST /api/work-orders/{id}/comments
#[utoipa::path(
    post,
    path = "/api/work-orders/{id}/comments",
    tag = "Work Orders",
    request_body = CommentPayload,
    params(("id" = Uuid, Path, description = "ID da ordem de serviço")),
    responses(
        (status = 201, description = "Comentário registrado na trilha", body = WorkOrderAuditLog)
    ),
    security(("api_jwt" = []))
)]
pub async fn add_comment(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    scope: ThirdPartyScope,
    origin: RequestOrigin,
    Path(id): Path<Uuid>,
    Json(payload): Json<CommentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let entry = app_state
        .services
        .work_orders
        .comment(&user, scope.context(), id, payload.comment, origin)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(entry)))
}

// POST /api/work-orders/{id}/evaluate
#[utoipa::path(
    post,
    path = "/api/work-orders/{id}/evaluate",
    tag = "Work Orders",
    request_body = EvaluateWorkOrderPayload,
    params(("id" = Uuid, Path, description = "ID da ordem de serviço")),
    responses(
        (status = 200, description = "Avaliação registrada", body = WorkOrder),
        (status = 409, description = "Ordem não concluída")
    ),
    security(("api_jwt" = []))
)]
pub async fn evaluate_work_order(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    scope: ThirdPartyScope,
    origin: RequestOrigin,
    Path(id): Path<Uuid>,
    Json(payload): Json<EvaluateWorkOrderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let wo = app_state
        .services
        .work_orders
        .evaluate(&user, scope.context(), id, payload, origin)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(wo))
}
