// src/main.rs

use anyhow::Context;
use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppState, Settings};
use crate::db::Stores;
use crate::middleware::{
    auth::auth_guard,
    third_party::{scope_guard, third_party_context},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Sem configuração válida a aplicação não sobe
    let settings = Settings::from_env()?;
    let pool = settings.connect().await?;

    sqlx::migrate!()
        .run(&pool)
        .await
        .context("Falha ao rodar as migrações do banco de dados")?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let app_state = AppState::new(&settings, Stores::postgres(pool));
    let app = build_router(app_state);

    let listener = TcpListener::bind(&settings.bind_addr)
        .await
        .with_context(|| format!("Falha ao iniciar o listener TCP em {}", settings.bind_addr))?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("Erro no servidor Axum")?;
    Ok(())
}

fn build_router(app_state: AppState) -> Router {
    // Tudo aqui passa por auth -> contexto de terceiro -> guardião de escopo.
    // As rotas ficam planas para que os parâmetros de path já estejam
    // resolvidos quando o guardião de escopo roda.
    let api_routes = Router::new()
        .route("/api/users/me", get(handlers::auth::get_me))
        // Terceiros
        .route("/api/third-party/context", get(handlers::third_party::get_context))
        .route(
            "/api/customers/{customerId}/third-party-companies",
            post(handlers::third_party::create_company).get(handlers::third_party::list_companies),
        )
        .route(
            "/api/customers/{customerId}/third-party-module/disable",
            post(handlers::third_party::disable_module),
        )
        .route("/api/third-party-companies/{id}", get(handlers::third_party::get_company))
        .route(
            "/api/third-party-companies/{id}/scope",
            put(handlers::third_party::update_scope),
        )
        .route(
            "/api/third-party-companies/{id}/deactivate",
            post(handlers::third_party::deactivate_company),
        )
        .route(
            "/api/third-party-companies/{id}/reactivate",
            post(handlers::third_party::reactivate_company),
        )
        // Locais
        .route("/api/locations/sites", get(handlers::locations::list_sites))
        .route("/api/locations/zones", get(handlers::locations::list_zones))
        .route("/api/locations/equipment", get(handlers::locations::list_equipment))
        // Ordens de serviço
        .route(
            "/api/work-orders",
            get(handlers::work_orders::list_work_orders).post(handlers::work_orders::create_work_order),
        )
        .route(
            "/api/work-orders/{id}",
            get(handlers::work_orders::get_work_order).patch(handlers::work_orders::update_work_order),
        )
        .route("/api/work-orders/{id}/history", get(handlers::work_orders::get_history))
        .route("/api/work-orders/{id}/assign", post(handlers::work_orders::assign_work_order))
        .route("/api/work-orders/{id}/start", post(handlers::work_orders::start_work_order))
        .route("/api/work-orders/{id}/pause", post(handlers::work_orders::pause_work_order))
        .route("/api/work-orders/{id}/resume", post(handlers::work_orders::resume_work_order))
        .route("/api/work-orders/{id}/complete", post(handlers::work_orders::complete_work_order))
        .route("/api/work-orders/{id}/cancel", post(handlers::work_orders::cancel_work_order))
        .route("/api/work-orders/{id}/reopen", post(handlers::work_orders::reopen_work_order))
        .route("/api/work-orders/{id}/comments", post(handlers::work_orders::add_comment))
        .route("/api/work-orders/{id}/evaluate", post(handlers::work_orders::evaluate_work_order))
        // SLA
        .route("/api/sla/summary", get(handlers::sla::get_summary))
        .route("/api/sla/by-company", get(handlers::sla::get_by_company))
        .route("/api/sla/by-team", get(handlers::sla::get_by_team))
        .route("/api/sla/by-operator", get(handlers::sla::get_by_operator))
        .route(
            "/api/sla/execution-comparison",
            get(handlers::sla::get_execution_comparison),
        )
        // Propostas
        .route(
            "/api/proposals",
            get(handlers::proposals::list_proposals).post(handlers::proposals::submit_proposal),
        )
        .route("/api/proposals/{id}/approve", post(handlers::proposals::approve_proposal))
        .route("/api/proposals/{id}/reject", post(handlers::proposals::reject_proposal))
        // Notificações
        .route("/api/notifications", get(handlers::notifications::list_notifications))
        .route(
            "/api/notifications/{id}/read",
            post(handlers::notifications::mark_notification_read),
        )
        // A última camada adicionada é a primeira a rodar
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), scope_guard))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), third_party_context))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .merge(docs::swagger_ui())
        .merge(api_routes)
        .with_state(app_state)
}
