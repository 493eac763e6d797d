use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use voyra_core::catalog::{Hotel, UpstreamOwned};
use voyra_core::provider::ProviderClient;
use voyra_core::repository::{CatalogRepository, UpsertOutcome};
use voyra_core::{EngineError, EngineResult};

#[derive(Debug, Default, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct EntityCounts {
    pub created: u32,
    pub updated: u32,
    pub unchanged: u32,
    pub failed: u32,
}

impl EntityCounts {
    fn record(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Created => self.created += 1,
            UpsertOutcome::Updated => self.updated += 1,
            UpsertOutcome::Unchanged => self.unchanged += 1,
        }
    }
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct SyncSummary {
    pub currencies: EntityCounts,
    pub board_types: EntityCounts,
    pub facilities: EntityCounts,
    pub room_attributes: EntityCounts,
    pub locations: EntityCounts,
    pub hotels: EntityCounts,
}

/// Incremental merge of provider reference data into the local catalog.
///
/// Stages run in a fixed dependency order because each stage's upserts may
/// reference rows created by an earlier one: currencies and board types
/// first, then facilities and room attributes, then locations, then hotels.
/// A failing entity is counted and skipped, never fatal to the run. Runs are
/// serialized: a second `sync_all` while one is in flight is rejected, since
/// interleaved upserts could violate the stage ordering guarantee.
pub struct SyncEngine {
    provider: Arc<dyn ProviderClient>,
    catalog: Arc<dyn CatalogRepository>,
    running: Mutex<()>,
}

macro_rules! sync_stage {
    ($self:ident, $feed_id:ident, $counts:expr, $fetch:ident, $upsert:ident, $label:literal) => {
        match $self.provider.$fetch($feed_id).await {
            Ok(items) => {
                for dto in &items {
                    match $self.catalog.$upsert(dto).await {
                        Ok(outcome) => $counts.record(outcome),
                        Err(e) => {
                            warn!(entity = $label, error = %e, "Upsert failed");
                            $counts.failed += 1;
                        }
                    }
                }
            }
            Err(e) => {
                warn!(entity = $label, error = %e, "Fetch failed, stage skipped");
                $counts.failed += 1;
            }
        }
    };
}

impl SyncEngine {
    pub fn new(provider: Arc<dyn ProviderClient>, catalog: Arc<dyn CatalogRepository>) -> Self {
        Self {
            provider,
            catalog,
            running: Mutex::new(()),
        }
    }

    /// Run a full sync pass. `last_revision` limits the hotel stage to rows
    /// the provider reports as changed since then; `None` refetches the
    /// whole hotel catalog.
    pub async fn sync_all(
        &self,
        feed_id: &str,
        last_revision: Option<DateTime<Utc>>,
    ) -> EngineResult<SyncSummary> {
        let _guard = self
            .running
            .try_lock()
            .map_err(|_| EngineError::SyncInProgress)?;

        info!(feed_id, incremental = last_revision.is_some(), "Starting catalog sync");
        let mut summary = SyncSummary::default();

        sync_stage!(self, feed_id, summary.currencies, currencies, upsert_currency, "currency");
        sync_stage!(self, feed_id, summary.board_types, board_types, upsert_board_type, "board_type");
        sync_stage!(self, feed_id, summary.facilities, facilities, upsert_facility, "facility");
        sync_stage!(
            self,
            feed_id,
            summary.room_attributes,
            room_attributes,
            upsert_room_attribute,
            "room_attribute"
        );
        sync_stage!(self, feed_id, summary.locations, locations, upsert_location, "location");

        self.sync_hotels(feed_id, last_revision, &mut summary).await;

        info!(
            hotels_created = summary.hotels.created,
            hotels_updated = summary.hotels.updated,
            hotels_unchanged = summary.hotels.unchanged,
            "Catalog sync complete"
        );
        Ok(summary)
    }

    async fn sync_hotels(
        &self,
        feed_id: &str,
        last_revision: Option<DateTime<Utc>>,
        summary: &mut SyncSummary,
    ) {
        let items = match self.provider.hotel_list(feed_id, last_revision).await {
            Ok(items) => items,
            Err(e) => {
                warn!(error = %e, "Hotel list fetch failed, stage skipped");
                summary.hotels.failed += 1;
                return;
            }
        };

        for item in items {
            let detail = match self.provider.hotel_detail(feed_id, &item.code).await {
                Ok(detail) => detail,
                Err(e) => {
                    warn!(hotel = %item.code, error = %e, "Hotel detail fetch failed");
                    summary.hotels.failed += 1;
                    continue;
                }
            };
            match self.catalog.upsert_hotel(&detail).await {
                Ok(outcome) => summary.hotels.record(outcome),
                Err(e) => {
                    warn!(hotel = %item.code, error = %e, "Hotel upsert failed");
                    summary.hotels.failed += 1;
                }
            }
        }
    }

    /// Combined read: local-owned fields from storage, upstream-owned fields
    /// from a live provider fetch, merged through the same ownership table
    /// sync uses. Nothing is written back.
    pub async fn hotel_detail(&self, feed_id: &str, hotel_code: &str) -> EngineResult<Hotel> {
        let live = self.provider.hotel_detail(feed_id, hotel_code).await?;
        match self.catalog.hotel_by_code(hotel_code).await? {
            Some(mut local) => {
                local.apply_upstream(&live);
                Ok(local)
            }
            None => Ok(Hotel::from_upstream(&live)),
        }
    }
}
