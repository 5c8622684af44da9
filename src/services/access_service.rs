// src/services/access_service.rs

use std::fmt;

use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        auth::{User, UserType},
        third_party::ThirdPartyContext,
    },
};

// ---
// De onde vem o escopo pedido
// ---
// customerId/siteId/zoneId podem aparecer no path, no corpo ou na query.
// Precedência: path > body > query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScopeSource {
    pub customer_id: Option<Uuid>,
    pub site_id: Option<Uuid>,
    pub zone_id: Option<Uuid>,
}

impl ScopeSource {
    /// Lê pares chave/valor (parâmetros de path ou query). Valores que não são UUID são ignorados.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut source = Self::default();
        for (key, value) in pairs {
            let Ok(id) = Uuid::parse_str(value) else { continue };
            match key {
                "customerId" | "customer_id" => source.customer_id = Some(id),
                "siteId" | "site_id" => source.site_id = Some(id),
                "zoneId" | "zone_id" => source.zone_id = Some(id),
                _ => {}
            }
        }
        source
    }

    /// Lê os campos de topo de um corpo JSON.
    pub fn from_json(body: &Value) -> Self {
        let Some(object) = body.as_object() else {
            return Self::default();
        };
        Self::from_pairs(
            object
                .iter()
                .filter_map(|(key, value)| value.as_str().map(|v| (key.as_str(), v))),
        )
    }

    fn or(self, other: ScopeSource) -> Self {
        Self {
            customer_id: self.customer_id.or(other.customer_id),
            site_id: self.site_id.or(other.site_id),
            zone_id: self.zone_id.or(other.zone_id),
        }
    }
}

/// Escopo efetivo pedido por uma requisição.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestedScope {
    pub customer_id: Option<Uuid>,
    pub site_id: Option<Uuid>,
    pub zone_id: Option<Uuid>,
}

impl RequestedScope {
    pub fn resolve(path: ScopeSource, body: ScopeSource, query: ScopeSource) -> Self {
        let merged = path.or(body).or(query);
        Self {
            customer_id: merged.customer_id,
            site_id: merged.site_id,
            zone_id: merged.zone_id,
        }
    }
}

// ---
// Validadores
// ---
// Todos são no-op sem contexto: usuários internos e fornecedores nunca
// recebem contexto, e a falta dele para um terceiro é tratada à parte
// (THIRD_PARTY_CONTEXT_MISSING).

pub fn validate_third_party_customer_access(
    context: Option<&ThirdPartyContext>,
    customer_id: Option<Uuid>,
) -> Result<(), AppError> {
    match (context, customer_id) {
        (Some(ctx), Some(requested)) if requested != ctx.customer_id => {
            Err(AppError::CustomerAccessDenied)
        }
        _ => Ok(()),
    }
}

pub fn validate_third_party_site_access(
    context: Option<&ThirdPartyContext>,
    site_id: Option<Uuid>,
) -> Result<(), AppError> {
    match (context, site_id) {
        (Some(ctx), Some(site)) if !ctx.allows_site(site) => Err(AppError::SiteAccessDenied),
        _ => Ok(()),
    }
}

pub fn validate_third_party_zone_access(
    context: Option<&ThirdPartyContext>,
    zone_id: Option<Uuid>,
) -> Result<(), AppError> {
    match (context, zone_id) {
        (Some(ctx), Some(zone)) if !ctx.allows_zone(zone) => Err(AppError::ZoneAccessDenied),
        _ => Ok(()),
    }
}

/// A cadeia completa, na ordem cliente -> unidade -> zona.
pub fn validate_requested_scope(
    context: Option<&ThirdPartyContext>,
    scope: &RequestedScope,
) -> Result<(), AppError> {
    validate_third_party_customer_access(context, scope.customer_id)?;
    validate_third_party_site_access(context, scope.site_id)?;
    validate_third_party_zone_access(context, scope.zone_id)
}

/// Usuário interno/fornecedor só enxerga o próprio cliente.
/// Terceiros são validados pelo contexto.
pub fn authorize_customer(
    user: &User,
    context: Option<&ThirdPartyContext>,
    customer_id: Uuid,
) -> Result<(), AppError> {
    match user.user_type {
        UserType::ThirdPartyUser => {
            let ctx = context.ok_or(AppError::ThirdPartyContextMissing)?;
            validate_third_party_customer_access(Some(ctx), Some(customer_id))
        }
        UserType::InternalUser | UserType::SupplierUser => {
            if user.customer_id == Some(customer_id) {
                Ok(())
            } else {
                Err(AppError::CustomerAccessDenied)
            }
        }
    }
}

// ---
// Checagem pontual de recurso
// ---
// Replica a cascata dos helpers de listagem para um único recurso e devolve
// uma decisão em vez de erro, para o chamador escolher a resposta.

/// O que se sabe sobre o recurso sendo acessado.
#[derive(Debug, Clone, Default)]
pub struct ResourceRef<'a> {
    pub customer_id: Uuid,
    pub site_id: Option<Uuid>,
    pub zone_id: Option<Uuid>,
    /// Preenchido quando o recurso é (ou aponta para) um equipamento.
    pub contracted_third_party_ids: Option<&'a [Uuid]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DenialReason {
    CustomerMismatch,
    SiteNotAllowed,
    ZoneNotAllowed,
    AssetNotContracted,
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DenialReason::CustomerMismatch => "recurso pertence a outro cliente",
            DenialReason::SiteNotAllowed => "unidade fora do escopo da empresa",
            DenialReason::ZoneNotAllowed => "zona fora do escopo da empresa",
            DenialReason::AssetNotContracted => "equipamento não contratado com a empresa",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct AccessDecision {
    pub allowed: bool,
    pub reason: Option<DenialReason>,
}

impl AccessDecision {
    pub const ALLOWED: AccessDecision = AccessDecision { allowed: true, reason: None };

    pub fn denied(reason: DenialReason) -> Self {
        Self { allowed: false, reason: Some(reason) }
    }

    pub fn into_result(self) -> Result<(), AppError> {
        match self.reason {
            Some(reason) if !self.allowed => Err(AppError::DataAccessDenied(reason.to_string())),
            _ => Ok(()),
        }
    }
}

pub fn validate_third_party_data_access(
    context: Option<&ThirdPartyContext>,
    resource: &ResourceRef<'_>,
) -> AccessDecision {
    let Some(ctx) = context else {
        return AccessDecision::ALLOWED;
    };

    if resource.customer_id != ctx.customer_id {
        return AccessDecision::denied(DenialReason::CustomerMismatch);
    }
    if let Some(site) = resource.site_id {
        if !ctx.allows_site(site) {
            return AccessDecision::denied(DenialReason::SiteNotAllowed);
        }
    }
    if let Some(zone) = resource.zone_id {
        if !ctx.allows_zone(zone) {
            return AccessDecision::denied(DenialReason::ZoneNotAllowed);
        }
    }
    if let Some(contracted) = resource.contracted_third_party_ids {
        if !ctx.allows_asset(contracted) {
            return AccessDecision::denied(DenialReason::AssetNotContracted);
        }
    }

    AccessDecision::ALLOWED
}
