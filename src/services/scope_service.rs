// src/services/scope_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::side_channel::best_effort,
    db::LocationStore,
    models::{
        location::{Equipment, Site, Zone},
        third_party::ThirdPartyContext,
    },
};

// ---
// Listagens filtradas pelo escopo do terceiro
// ---
// Unidade -> zona -> equipamento, cada nível estreitando o anterior.
// Sem contexto a listagem é a do cliente inteiro. Erro de infraestrutura
// vira lista vazia (logado), nunca erro para o chamador.
#[derive(Clone)]
pub struct ScopeService {
    locations: Arc<dyn LocationStore>,
}

impl ScopeService {
    pub fn new(locations: Arc<dyn LocationStore>) -> Self {
        Self { locations }
    }

    pub async fn filtered_sites(
        &self,
        customer_id: Uuid,
        module: Option<&str>,
        context: Option<&ThirdPartyContext>,
    ) -> Vec<Site> {
        if context.is_some_and(|ctx| ctx.customer_id != customer_id) {
            return Vec::new();
        }

        let sites = best_effort(
            "locations",
            self.locations.list_active_sites(customer_id, module),
        )
        .await
        .unwrap_or_default();

        match context {
            Some(ctx) => sites.into_iter().filter(|s| ctx.allows_site(s.id)).collect(),
            None => sites,
        }
    }

    /// `site_id` restringe a uma unidade; fora do escopo resulta em lista vazia.
    pub async fn filtered_zones(
        &self,
        customer_id: Uuid,
        site_id: Option<Uuid>,
        module: Option<&str>,
        context: Option<&ThirdPartyContext>,
    ) -> Vec<Zone> {
        let site_ids: Vec<Uuid> = self
            .filtered_sites(customer_id, module, context)
            .await
            .into_iter()
            .map(|s| s.id)
            .filter(|id| site_id.is_none_or(|wanted| *id == wanted))
            .collect();

        if site_ids.is_empty() {
            return Vec::new();
        }

        let zones = best_effort("locations", self.locations.list_active_zones(&site_ids))
            .await
            .unwrap_or_default();

        match context {
            Some(ctx) => zones.into_iter().filter(|z| ctx.allows_zone(z.id)).collect(),
            None => zones,
        }
    }

    /// Além do escopo de zona, aplica o modo de visibilidade de ativos.
    pub async fn filtered_equipment(
        &self,
        customer_id: Uuid,
        site_id: Option<Uuid>,
        zone_id: Option<Uuid>,
        module: Option<&str>,
        context: Option<&ThirdPartyContext>,
    ) -> Vec<Equipment> {
        let zone_ids: Vec<Uuid> = self
            .filtered_zones(customer_id, site_id, module, context)
            .await
            .into_iter()
            .map(|z| z.id)
            .filter(|id| zone_id.is_none_or(|wanted| *id == wanted))
            .collect();

        if zone_ids.is_empty() {
            return Vec::new();
        }

        let equipment = best_effort("locations", self.locations.list_active_equipment(&zone_ids))
            .await
            .unwrap_or_default();

        match context {
            Some(ctx) => equipment
                .into_iter()
                .filter(|e| ctx.allows_asset(&e.contracted_third_party_ids))
                .collect(),
            None => equipment,
        }
    }
}
