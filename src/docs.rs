// src/docs.rs

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::models;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Users ---
        handlers::auth::get_me,

        // --- Third Parties ---
        handlers::third_party::get_context,
        handlers::third_party::create_company,
        handlers::third_party::list_companies,
        handlers::third_party::get_company,
        handlers::third_party::update_scope,
        handlers::third_party::deactivate_company,
        handlers::third_party::reactivate_company,
        handlers::third_party::disable_module,

        // --- Locations ---
        handlers::locations::list_sites,
        handlers::locations::list_zones,
        handlers::locations::list_equipment,

        // --- Work Orders ---
        handlers::work_orders::list_work_orders,
        handlers::work_orders::get_work_order,
        handlers::work_orders::get_history,
        handlers::work_orders::create_work_order,
        handlers::work_orders::update_work_order,
        handlers::work_orders::assign_work_order,
        handlers::work_orders::start_work_order,
        handlers::work_orders::pause_work_order,
        handlers::work_orders::resume_work_order,
        handlers::work_orders::complete_work_order,
        handlers::work_orders::cancel_work_order,
        handlers::work_orders::reopen_work_order,
        handlers::work_orders::add_comment,
        handlers::work_orders::evaluate_work_order,

        // --- SLA ---
        handlers::sla::get_summary,
        handlers::sla::get_by_company,
        handlers::sla::get_by_team,
        handlers::sla::get_by_operator,
        handlers::sla::get_execution_comparison,

        // --- Proposals ---
        handlers::proposals::submit_proposal,
        handlers::proposals::list_proposals,
        handlers::proposals::approve_proposal,
        handlers::proposals::reject_proposal,

        // --- Notifications ---
        handlers::notifications::list_notifications,
        handlers::notifications::mark_notification_read,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::UserType,
            models::auth::UserRole,
            models::auth::User,

            // --- Third Parties ---
            models::third_party::CompanyStatus,
            models::third_party::AssetVisibilityMode,
            models::third_party::ThirdPartyCompany,
            models::third_party::ThirdPartyContext,
            models::third_party::CreateThirdPartyCompanyPayload,
            models::third_party::UpdateCompanyScopePayload,
            models::third_party::CleanupSummary,
            models::third_party::ModuleCleanupSummary,
            services::access_service::AccessDecision,
            services::access_service::DenialReason,

            // --- Locations ---
            models::location::Site,
            models::location::Zone,
            models::location::Equipment,

            // --- Work Orders ---
            models::work_order::WorkOrderStatus,
            models::work_order::ExecutedByType,
            models::work_order::WorkOrder,
            models::work_order::CreateWorkOrderPayload,
            models::work_order::UpdateWorkOrderPayload,
            models::work_order::AssignWorkOrderPayload,
            models::work_order::CancelWorkOrderPayload,
            models::work_order::CommentPayload,
            models::work_order::EvaluateWorkOrderPayload,

            // --- Audit ---
            models::audit::AuditAction,
            models::audit::AuditSource,
            models::audit::WorkOrderAuditLog,

            // --- SLA ---
            models::sla::SlaMetrics,
            models::sla::SlaGroupMetrics,
            models::sla::ExecutionComparison,

            // --- Proposals ---
            models::proposal::ProposalKind,
            models::proposal::ProposalStatus,
            models::proposal::Proposal,
            models::proposal::SubmitProposalPayload,
            models::proposal::RejectProposalPayload,

            // --- Notifications ---
            models::notification::NotificationType,
            models::notification::Notification,
        )
    ),
    tags(
        (name = "Users", description = "Dados do Usuário"),
        (name = "Third Parties", description = "Empresas Terceiras: escopo, desativação e contexto"),
        (name = "Locations", description = "Unidades, Zonas e Equipamentos visíveis"),
        (name = "Work Orders", description = "Ordens de Serviço e Ciclo de Vida"),
        (name = "SLA", description = "Indicadores de Prazo"),
        (name = "Proposals", description = "Planos de Manutenção e Propostas de Terceiros"),
        (name = "Notifications", description = "Caixa de Entrada")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())
}
