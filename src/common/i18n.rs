// src/common/i18n.rs

use std::collections::HashMap;

// Mensagens embutidas por idioma. A chave é o código do erro (ou "error.*").
const PT: &[(&str, &str)] = &[
    ("error.bad_request", "Requisição inválida."),
    ("error.unauthorized", "Não autorizado."),
    ("error.forbidden", "Acesso negado."),
    ("error.not_found", "Não encontrado."),
    ("error.conflict", "Conflito."),
    ("error.internal", "Erro interno."),
    ("VALIDATION_ERROR", "Um ou mais campos são inválidos."),
    ("INVALID_TOKEN", "Token de autenticação inválido ou ausente."),
    ("USER_NOT_FOUND", "Usuário não encontrado ou inativo."),
    ("RESOURCE_NOT_FOUND", "O recurso solicitado não foi encontrado."),
    ("FORBIDDEN", "Você não tem permissão para realizar esta ação."),
    ("THIRD_PARTY_COMPANY_NOT_FOUND", "Acesso negado: empresa terceira não encontrada."),
    ("THIRD_PARTY_COMPANY_INACTIVE", "Acesso negado: empresa terceira inativa."),
    ("THIRD_PARTY_CONTEXT_MISSING", "Acesso negado: contexto de terceiro ausente."),
    ("CUSTOMER_ACCESS_DENIED", "Acesso negado a este cliente."),
    ("SITE_ACCESS_DENIED", "Acesso negado a esta unidade."),
    ("ZONE_ACCESS_DENIED", "Acesso negado a esta zona."),
    ("DATA_ACCESS_DENIED", "Acesso negado a este recurso."),
    ("INVALID_STATUS_TRANSITION", "Esta mudança de status não é permitida."),
    ("PROPOSAL_ALREADY_DECIDED", "Esta proposta já foi aprovada ou recusada."),
    ("INTERNAL_ERROR", "Ocorreu um erro inesperado."),
];

const EN: &[(&str, &str)] = &[
    ("error.bad_request", "Bad request."),
    ("error.unauthorized", "Unauthorized."),
    ("error.forbidden", "Access denied."),
    ("error.not_found", "Not found."),
    ("error.conflict", "Conflict."),
    ("error.internal", "Internal error."),
    ("VALIDATION_ERROR", "One or more fields are invalid."),
    ("INVALID_TOKEN", "Invalid or missing authentication token."),
    ("USER_NOT_FOUND", "User not found or inactive."),
    ("RESOURCE_NOT_FOUND", "The requested resource was not found."),
    ("FORBIDDEN", "You are not allowed to perform this action."),
    ("THIRD_PARTY_COMPANY_NOT_FOUND", "Access denied: third-party company not found."),
    ("THIRD_PARTY_COMPANY_INACTIVE", "Access denied: third-party company is inactive."),
    ("THIRD_PARTY_CONTEXT_MISSING", "Access denied: third-party context is missing."),
    ("CUSTOMER_ACCESS_DENIED", "Access denied to this customer."),
    ("SITE_ACCESS_DENIED", "Access denied to this site."),
    ("ZONE_ACCESS_DENIED", "Access denied to this zone."),
    ("DATA_ACCESS_DENIED", "Access denied to this resource."),
    ("INVALID_STATUS_TRANSITION", "This status change is not allowed."),
    ("PROPOSAL_ALREADY_DECIDED", "This proposal has already been approved or rejected."),
    ("INTERNAL_ERROR", "An unexpected error occurred."),
];

/// Catálogo de mensagens por idioma ("pt", "en"), com idioma padrão de fallback.
#[derive(Debug, Clone)]
pub struct I18nStore {
    default_locale: String,
    messages: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

impl I18nStore {
    pub fn new(default_locale: &str) -> Self {
        let mut messages = HashMap::new();
        messages.insert("pt", PT.iter().copied().collect());
        messages.insert("en", EN.iter().copied().collect());

        // Idioma padrão desconhecido cai para "pt"
        let default_locale = if messages.contains_key(default_locale) {
            default_locale.to_string()
        } else {
            "pt".to_string()
        };

        Self { default_locale, messages }
    }

    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    pub fn translate(&self, lang: &str, key: &str) -> String {
        self.messages
            .get(lang)
            .and_then(|m| m.get(key))
            .or_else(|| {
                self.messages
                    .get(self.default_locale.as_str())
                    .and_then(|m| m.get(key))
            })
            .map(|msg| msg.to_string())
            .unwrap_or_else(|| key.to_string())
    }
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new("pt")
    }
}
