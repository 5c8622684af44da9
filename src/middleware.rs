// src/middleware.rs

pub mod auth;
pub mod i18n;
pub mod origin;
pub mod rbac;
pub mod third_party;
