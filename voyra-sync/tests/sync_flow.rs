use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use voyra_core::provider::*;
use voyra_core::repository::CatalogRepository;
use voyra_core::{EngineError, EngineResult};
use voyra_store::InMemoryCatalogRepository;
use voyra_sync::SyncEngine;

struct MockCatalogProvider {
    currencies: Vec<CurrencyDto>,
    board_types: Vec<BoardTypeDto>,
    facilities: Vec<FacilityDto>,
    room_attributes: Vec<RoomAttributeDto>,
    locations: Vec<LocationDto>,
    hotels: Mutex<Vec<HotelDetailDto>>,
    fail_facilities: AtomicBool,
    seen_revisions: Mutex<Vec<Option<DateTime<Utc>>>>,
    currencies_delay_ms: u64,
}

impl MockCatalogProvider {
    fn new() -> Self {
        Self {
            currencies: vec![CurrencyDto { code: "EUR".to_string(), name: "Euro".to_string() }],
            board_types: vec![BoardTypeDto {
                code: "BB".to_string(),
                name: "Bed & Breakfast".to_string(),
            }],
            facilities: vec![
                FacilityDto {
                    code: "POOL".to_string(),
                    name: "Pool".to_string(),
                    description: None,
                },
                FacilityDto {
                    code: "SPA".to_string(),
                    name: "Spa".to_string(),
                    description: Some("Wellness area".to_string()),
                },
            ],
            room_attributes: vec![RoomAttributeDto {
                code: "SEAVIEW".to_string(),
                name: "Sea view".to_string(),
            }],
            locations: vec![
                LocationDto {
                    code: "ES".to_string(),
                    name: "Spain".to_string(),
                    country_code: "ES".to_string(),
                    parent_code: None,
                },
                LocationDto {
                    code: "BCN".to_string(),
                    name: "Barcelona".to_string(),
                    country_code: "ES".to_string(),
                    parent_code: Some("ES".to_string()),
                },
            ],
            hotels: Mutex::new(vec![HotelDetailDto {
                code: "HTL001".to_string(),
                name: "Harbour View".to_string(),
                description: Some("Seafront property".to_string()),
                category: Some(4),
                images: vec!["img/1.jpg".to_string()],
                facility_codes: vec!["POOL".to_string(), "SPA".to_string()],
                location_code: "BCN".to_string(),
            }]),
            fail_facilities: AtomicBool::new(false),
            seen_revisions: Mutex::new(Vec::new()),
            currencies_delay_ms: 0,
        }
    }

    fn rename_hotel(&self, name: &str) {
        self.hotels.lock().unwrap()[0].name = name.to_string();
    }
}

fn not_wired<T>() -> EngineResult<T> {
    Err(EngineError::UpstreamUnavailable("not wired in test".to_string()))
}

#[async_trait]
impl ProviderClient for MockCatalogProvider {
    async fn search_rooms(&self, _: &RoomSearchRequest) -> EngineResult<RoomSearchResponse> {
        not_wired()
    }

    async fn hotel_detail(&self, _: &str, hotel_code: &str) -> EngineResult<HotelDetailDto> {
        self.hotels
            .lock()
            .unwrap()
            .iter()
            .find(|h| h.code == hotel_code)
            .cloned()
            .ok_or_else(|| EngineError::UpstreamRejected(format!("unknown hotel {hotel_code}")))
    }

    async fn hotel_list(
        &self,
        _: &str,
        last_revision: Option<DateTime<Utc>>,
    ) -> EngineResult<Vec<HotelListItem>> {
        self.seen_revisions.lock().unwrap().push(last_revision);
        Ok(self
            .hotels
            .lock()
            .unwrap()
            .iter()
            .map(|h| HotelListItem {
                code: h.code.clone(),
                name: h.name.clone(),
                location_code: h.location_code.clone(),
                revision_date: Utc::now(),
            })
            .collect())
    }

    async fn create_booking(&self, _: &ProviderBookingRequest) -> EngineResult<BookingConfirmation> {
        not_wired()
    }

    async fn reservation_detail(&self, _: &str, _: &str) -> EngineResult<ReservationDetail> {
        not_wired()
    }

    async fn reservation_by_client_reference(
        &self,
        _: &str,
        _: &str,
    ) -> EngineResult<Option<ReservationDetail>> {
        not_wired()
    }

    async fn cancel_booking(&self, _: &str, _: &str) -> EngineResult<CancellationConfirmation> {
        not_wired()
    }

    async fn currencies(&self, _: &str) -> EngineResult<Vec<CurrencyDto>> {
        if self.currencies_delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.currencies_delay_ms)).await;
        }
        Ok(self.currencies.clone())
    }

    async fn board_types(&self, _: &str) -> EngineResult<Vec<BoardTypeDto>> {
        Ok(self.board_types.clone())
    }

    async fn facilities(&self, _: &str) -> EngineResult<Vec<FacilityDto>> {
        if self.fail_facilities.load(Ordering::SeqCst) {
            return Err(EngineError::UpstreamUnavailable("facility feed down".to_string()));
        }
        Ok(self.facilities.clone())
    }

    async fn room_attributes(&self, _: &str) -> EngineResult<Vec<RoomAttributeDto>> {
        Ok(self.room_attributes.clone())
    }

    async fn locations(&self, _: &str) -> EngineResult<Vec<LocationDto>> {
        Ok(self.locations.clone())
    }
}

fn engine(provider: Arc<MockCatalogProvider>) -> (Arc<SyncEngine>, Arc<InMemoryCatalogRepository>) {
    let catalog = Arc::new(InMemoryCatalogRepository::new());
    let engine = Arc::new(SyncEngine::new(provider, catalog.clone()));
    (engine, catalog)
}

#[tokio::test]
async fn test_full_sync_resolves_links_across_stages() {
    let provider = Arc::new(MockCatalogProvider::new());
    let (engine, catalog) = engine(provider);

    let summary = engine.sync_all("feed-1", None).await.unwrap();
    assert_eq!(summary.currencies.created, 1);
    assert_eq!(summary.board_types.created, 1);
    assert_eq!(summary.facilities.created, 2);
    assert_eq!(summary.room_attributes.created, 1);
    assert_eq!(summary.locations.created, 2);
    assert_eq!(summary.hotels.created, 1);

    // The hotel stage ran last and could resolve its relations.
    let hotel = catalog.hotel_by_code("HTL001").await.unwrap().unwrap();
    let location = catalog.location_by_code("BCN").await.unwrap().unwrap();
    assert_eq!(hotel.location_id, Some(location.id));
    assert_eq!(hotel.facility_ids.len(), 2);

    let parent = catalog.location_by_code("ES").await.unwrap().unwrap();
    assert_eq!(location.parent_id, Some(parent.id));
}

#[tokio::test]
async fn test_second_run_without_changes_reports_unchanged_only() {
    let provider = Arc::new(MockCatalogProvider::new());
    let (engine, catalog) = engine(provider);

    engine.sync_all("feed-1", None).await.unwrap();
    let before = catalog.hotel_by_code("HTL001").await.unwrap().unwrap();

    let second = engine.sync_all("feed-1", None).await.unwrap();
    assert_eq!(second.hotels.created, 0);
    assert_eq!(second.hotels.updated, 0);
    assert_eq!(second.hotels.unchanged, 1);
    assert_eq!(second.currencies.unchanged, 1);
    assert_eq!(second.locations.unchanged, 2);

    // Locally-owned fields are untouched by the no-op run.
    let after = catalog.hotel_by_code("HTL001").await.unwrap().unwrap();
    assert_eq!(after.id, before.id);
    assert_eq!(after.location_id, before.location_id);
    assert_eq!(after.facility_ids, before.facility_ids);
    assert_eq!(after.updated_at, before.updated_at);
}

#[tokio::test]
async fn test_upstream_change_updates_row_preserving_local_id() {
    let provider = Arc::new(MockCatalogProvider::new());
    let (engine, catalog) = engine(provider.clone());

    engine.sync_all("feed-1", None).await.unwrap();
    let before = catalog.hotel_by_code("HTL001").await.unwrap().unwrap();

    provider.rename_hotel("Harbour View & Spa");
    let summary = engine.sync_all("feed-1", None).await.unwrap();
    assert_eq!(summary.hotels.updated, 1);

    let after = catalog.hotel_by_code("HTL001").await.unwrap().unwrap();
    assert_eq!(after.name, "Harbour View & Spa");
    assert_eq!(after.id, before.id);
}

#[tokio::test]
async fn test_stage_failure_is_isolated() {
    let provider = Arc::new(MockCatalogProvider::new());
    provider.fail_facilities.store(true, Ordering::SeqCst);
    let (engine, catalog) = engine(provider);

    let summary = engine.sync_all("feed-1", None).await.unwrap();
    assert_eq!(summary.facilities.failed, 1);
    assert_eq!(summary.facilities.created, 0);

    // Later stages still ran.
    assert_eq!(summary.locations.created, 2);
    assert_eq!(summary.hotels.created, 1);
    assert!(catalog.hotel_by_code("HTL001").await.unwrap().is_some());
}

#[tokio::test]
async fn test_incremental_revision_is_passed_upstream() {
    let provider = Arc::new(MockCatalogProvider::new());
    let (engine, _) = engine(provider.clone());

    let revision = Utc::now() - Duration::days(1);
    engine.sync_all("feed-1", Some(revision)).await.unwrap();
    engine.sync_all("feed-1", None).await.unwrap();

    let seen = provider.seen_revisions.lock().unwrap().clone();
    assert_eq!(seen, vec![Some(revision), None]);
}

#[tokio::test]
async fn test_reentrant_sync_is_rejected() {
    let mut provider = MockCatalogProvider::new();
    provider.currencies_delay_ms = 100;
    let provider = Arc::new(provider);
    let (engine, _) = engine(provider);

    let running = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.sync_all("feed-1", None).await })
    };
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    assert!(matches!(
        engine.sync_all("feed-1", None).await,
        Err(EngineError::SyncInProgress)
    ));
    assert!(running.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_hotel_detail_merges_live_content_over_local_row() {
    let provider = Arc::new(MockCatalogProvider::new());
    let (engine, catalog) = engine(provider.clone());
    engine.sync_all("feed-1", None).await.unwrap();

    let stored = catalog.hotel_by_code("HTL001").await.unwrap().unwrap();
    provider.rename_hotel("Harbour View Renamed");

    let merged = engine.hotel_detail("feed-1", "HTL001").await.unwrap();
    assert_eq!(merged.name, "Harbour View Renamed");
    assert_eq!(merged.id, stored.id);
    assert_eq!(merged.location_id, stored.location_id);

    // The merged read writes nothing back.
    let still_stored = catalog.hotel_by_code("HTL001").await.unwrap().unwrap();
    assert_eq!(still_stored.name, "Harbour View");
}
