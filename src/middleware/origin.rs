// src/middleware/origin.rs

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::models::audit::{AuditSource, RequestOrigin};

const FORWARDED_FOR: &str = "x-forwarded-for";
const REAL_IP: &str = "x-real-ip";
const CLIENT_SOURCE: &str = "x-client-source";

// Procedência da requisição para a trilha de auditoria.
// "system" nunca é aceito do cliente.
impl<S> FromRequestParts<S> for RequestOrigin
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let ip_address = header(FORWARDED_FOR)
            .and_then(|list| list.split(',').next())
            .map(|ip| ip.trim().to_string())
            .or_else(|| header(REAL_IP).map(str::to_string));

        let user_agent = header(axum::http::header::USER_AGENT.as_str()).map(str::to_string);

        let source = match header(CLIENT_SOURCE).map(str::to_ascii_lowercase).as_deref() {
            Some("mobile") => AuditSource::Mobile,
            Some("api") => AuditSource::Api,
            _ => AuditSource::Web,
        };

        Ok(RequestOrigin { ip_address, user_agent, source })
    }
}
