// src/config.rs

use std::{env, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::Stores,
    services::{
        notification_service::{ExpoPushGateway, PushGateway},
        Services,
    },
};

const DEFAULT_PUSH_GATEWAY_URL: &str = "https://exp.host/--/api/v2/push/send";

// Configuração lida do ambiente (e do .env, se existir)
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub database_max_connections: u32,
    pub push_gateway_url: String,
    pub push_enabled: bool,
    pub notification_fanout_limit: usize,
    pub default_locale: String,
}

fn required(name: &str) -> anyhow::Result<String> {
    env::var(name).with_context(|| format!("{} deve ser definida", name))
}

fn optional<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} tem um valor inválido: {}", name, raw)),
        Err(_) => Ok(default),
    }
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            bind_addr: optional("BIND_ADDR", "0.0.0.0:3000".to_string())?,
            database_max_connections: optional("DATABASE_MAX_CONNECTIONS", 5)?,
            push_gateway_url: optional("PUSH_GATEWAY_URL", DEFAULT_PUSH_GATEWAY_URL.to_string())?,
            push_enabled: optional("PUSH_ENABLED", true)?,
            notification_fanout_limit: optional("NOTIFICATION_FANOUT_LIMIT", 16)?,
            default_locale: optional("DEFAULT_LOCALE", "pt".to_string())?,
        })
    }

    pub async fn connect(&self) -> anyhow::Result<PgPool> {
        let pool = PgPoolOptions::new()
            .max_connections(self.database_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&self.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");
        Ok(pool)
    }

    #[cfg(test)]
    pub fn for_tests(jwt_secret: &str) -> Self {
        Self {
            database_url: String::new(),
            jwt_secret: jwt_secret.to_string(),
            bind_addr: "127.0.0.1:0".into(),
            database_max_connections: 1,
            push_gateway_url: DEFAULT_PUSH_GATEWAY_URL.into(),
            push_enabled: false,
            notification_fanout_limit: 4,
            default_locale: "pt".into(),
        }
    }
}

// O estado compartilhado, imutável depois da subida
#[derive(Clone)]
pub struct AppState {
    pub i18n_store: Arc<I18nStore>,
    pub services: Services,
}

impl AppState {
    pub fn new(settings: &Settings, stores: Stores) -> Self {
        let push: Option<Arc<dyn PushGateway>> = if settings.push_enabled {
            Some(Arc::new(ExpoPushGateway::new(settings.push_gateway_url.clone())))
        } else {
            tracing::info!("Envio de push desativado (PUSH_ENABLED=false)");
            None
        };

        let services = Services::new(
            &stores,
            settings.jwt_secret.clone(),
            push,
            settings.notification_fanout_limit,
        );

        Self {
            i18n_store: Arc::new(I18nStore::new(&settings.default_locale)),
            services,
        }
    }
}
