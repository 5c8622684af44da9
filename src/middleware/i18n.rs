// src/middleware/i18n.rs

use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header, request::Parts};

use crate::config::AppState;

// Extrator de idioma: primeiro idioma do Accept-Language, só a parte primária ("pt-BR" -> "pt").
// Sem cabeçalho, vale o idioma padrão configurado.
#[derive(Debug, Clone)]
pub struct Locale(pub String);

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let lang = parts
            .headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|header_value| header_value.to_str().ok())
            .and_then(primary_language)
            .unwrap_or_else(|| app_state.i18n_store.default_locale().to_string());

        Ok(Locale(lang))
    }
}

fn primary_language(header_str: &str) -> Option<String> {
    accept_language::parse(header_str)
        .into_iter()
        .find(|tag| !tag.is_empty())
        .map(|tag| {
            tag.split('-')
                .next()
                .unwrap_or(&tag)
                .to_ascii_lowercase()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_is_dropped() {
        assert_eq!(primary_language("pt-BR,pt;q=0.9,en;q=0.8").as_deref(), Some("pt"));
        assert_eq!(primary_language("en-US").as_deref(), Some("en"));
    }

    #[test]
    fn highest_quality_wins() {
        assert_eq!(primary_language("pt;q=0.5, en;q=0.9").as_deref(), Some("en"));
    }

    #[test]
    fn empty_header_has_no_language() {
        assert_eq!(primary_language(""), None);
    }
}
