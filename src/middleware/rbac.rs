// src/middleware/rbac.rs

use std::marker::PhantomData;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::auth::{UserRole, UserType},
};

/// 1. O que um grupo de papéis precisa declarar
pub trait RoleDef: Send + Sync + 'static {
    fn allowed() -> &'static [UserRole];
}

/// 2. O Extractor (Guardião). Só usuários internos do cliente passam.
pub struct RequireRole<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let Ok(locale) = Locale::from_request_parts(parts, state).await;

        let AuthenticatedUser(user) = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or_else(|| AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store))?;

        if user.user_type != UserType::InternalUser || !T::allowed().contains(&user.role) {
            tracing::debug!(user_id = %user.id, role = ?user.role, "Papel insuficiente");
            return Err(AppError::Forbidden.to_api_error(&locale, &app_state.i18n_store));
        }

        Ok(RequireRole(PhantomData))
    }
}

// ---
// DEFINIÇÃO DOS GRUPOS DE PAPÉIS
// ---

// Administração de terceiros e decisão de propostas
pub struct CustomerAdmin;
impl RoleDef for CustomerAdmin {
    fn allowed() -> &'static [UserRole] {
        &[UserRole::Admin, UserRole::Manager]
    }
}

// Abertura, edição e atribuição de ordens
pub struct Dispatcher;
impl RoleDef for Dispatcher {
    fn allowed() -> &'static [UserRole] {
        &[UserRole::Admin, UserRole::Manager, UserRole::TeamLeader]
    }
}
