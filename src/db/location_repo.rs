// src/db/location_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::location::{Equipment, Site, Zone},
};

/// Leituras da hierarquia unidade -> zona -> equipamento (somente ativos).
#[async_trait]
pub trait LocationStore: Send + Sync {
    async fn list_active_sites(
        &self,
        customer_id: Uuid,
        module: Option<&str>,
    ) -> Result<Vec<Site>, AppError>;

    async fn list_active_zones(&self, site_ids: &[Uuid]) -> Result<Vec<Zone>, AppError>;

    async fn list_active_equipment(&self, zone_ids: &[Uuid]) -> Result<Vec<Equipment>, AppError>;

    async fn find_equipment(&self, id: Uuid) -> Result<Option<Equipment>, AppError>;

    async fn find_equipment_many(&self, ids: &[Uuid]) -> Result<Vec<Equipment>, AppError>;
}

#[derive(Clone)]
pub struct LocationRepository {
    pool: PgPool,
}

impl LocationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LocationStore for LocationRepository {
    async fn list_active_sites(
        &self,
        customer_id: Uuid,
        module: Option<&str>,
    ) -> Result<Vec<Site>, AppError> {
        let sites = sqlx::query_as::<_, Site>(
            r#"
            SELECT * FROM sites
            WHERE customer_id = $1
              AND active = TRUE
              AND ($2::text IS NULL OR module = $2)
            ORDER BY name ASC
            "#,
        )
        .bind(customer_id)
        .bind(module)
        .fetch_all(&self.pool)
        .await?;

        Ok(sites)
    }

    async fn list_active_zones(&self, site_ids: &[Uuid]) -> Result<Vec<Zone>, AppError> {
        if site_ids.is_empty() {
            return Ok(vec![]);
        }

        // O SQLx lida bem com arrays usando ANY
        let zones = sqlx::query_as::<_, Zone>(
            "SELECT * FROM zones WHERE site_id = ANY($1) AND active = TRUE ORDER BY name ASC",
        )
        .bind(site_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(zones)
    }

    async fn list_active_equipment(&self, zone_ids: &[Uuid]) -> Result<Vec<Equipment>, AppError> {
        if zone_ids.is_empty() {
            return Ok(vec![]);
        }

        let equipment = sqlx::query_as::<_, Equipment>(
            "SELECT * FROM equipment WHERE zone_id = ANY($1) AND active = TRUE ORDER BY name ASC",
        )
        .bind(zone_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(equipment)
    }

    async fn find_equipment(&self, id: Uuid) -> Result<Option<Equipment>, AppError> {
        let equipment = sqlx::query_as::<_, Equipment>("SELECT * FROM equipment WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(equipment)
    }

    async fn find_equipment_many(&self, ids: &[Uuid]) -> Result<Vec<Equipment>, AppError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let equipment = sqlx::query_as::<_, Equipment>("SELECT * FROM equipment WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(equipment)
    }
}
