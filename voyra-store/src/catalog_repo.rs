use async_trait::async_trait;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;
use voyra_core::catalog::{
    BoardType, Currency, Facility, Hotel, Location, RoomAttribute, UpstreamOwned,
};
use voyra_core::provider::{
    BoardTypeDto, CurrencyDto, FacilityDto, HotelDetailDto, LocationDto, RoomAttributeDto,
};
use voyra_core::repository::{CatalogRepository, UpsertOutcome};
use voyra_core::EngineResult;

#[derive(Default)]
struct CatalogState {
    currencies: HashMap<String, Currency>,
    board_types: HashMap<String, BoardType>,
    facilities: HashMap<String, Facility>,
    room_attributes: HashMap<String, RoomAttribute>,
    locations: HashMap<String, Location>,
    hotels: HashMap<String, Hotel>,
}

/// Local catalog keyed by provider code.
///
/// Upserts go through [`UpstreamOwned`]: upstream-owned fields are always
/// overwritten, local ids and resolved relations never are. An unchanged
/// upsert leaves the stored row untouched byte for byte.
pub struct InMemoryCatalogRepository {
    state: RwLock<CatalogState>,
}

impl InMemoryCatalogRepository {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(CatalogState::default()),
        }
    }
}

impl Default for InMemoryCatalogRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn upsert<E, S>(map: &mut HashMap<String, E>, code: &str, source: &S) -> UpsertOutcome
where
    E: UpstreamOwned<Source = S>,
{
    match map.entry(code.to_string()) {
        Entry::Occupied(mut entry) => {
            if entry.get_mut().apply_upstream(source) {
                UpsertOutcome::Updated
            } else {
                UpsertOutcome::Unchanged
            }
        }
        Entry::Vacant(entry) => {
            entry.insert(E::from_upstream(source));
            UpsertOutcome::Created
        }
    }
}

#[async_trait]
impl CatalogRepository for InMemoryCatalogRepository {
    async fn upsert_currency(&self, dto: &CurrencyDto) -> EngineResult<UpsertOutcome> {
        let mut state = self.state.write().await;
        Ok(upsert(&mut state.currencies, &dto.code, dto))
    }

    async fn upsert_board_type(&self, dto: &BoardTypeDto) -> EngineResult<UpsertOutcome> {
        let mut state = self.state.write().await;
        Ok(upsert(&mut state.board_types, &dto.code, dto))
    }

    async fn upsert_facility(&self, dto: &FacilityDto) -> EngineResult<UpsertOutcome> {
        let mut state = self.state.write().await;
        Ok(upsert(&mut state.facilities, &dto.code, dto))
    }

    async fn upsert_room_attribute(&self, dto: &RoomAttributeDto) -> EngineResult<UpsertOutcome> {
        let mut state = self.state.write().await;
        Ok(upsert(&mut state.room_attributes, &dto.code, dto))
    }

    async fn upsert_location(&self, dto: &LocationDto) -> EngineResult<UpsertOutcome> {
        let mut state = self.state.write().await;
        let outcome = upsert(&mut state.locations, &dto.code, dto);

        // Resolve the parent link whenever the row was (re)written. The
        // resolved id is local-owned; an unchanged upsert leaves it alone.
        if outcome != UpsertOutcome::Unchanged {
            let parent_id = dto
                .parent_code
                .as_deref()
                .and_then(|code| state.locations.get(code))
                .map(|parent| parent.id);
            if let Some(location) = state.locations.get_mut(&dto.code) {
                location.parent_id = parent_id;
            }
        }
        Ok(outcome)
    }

    async fn upsert_hotel(&self, dto: &HotelDetailDto) -> EngineResult<UpsertOutcome> {
        let mut state = self.state.write().await;
        let outcome = upsert(&mut state.hotels, &dto.code, dto);

        if outcome != UpsertOutcome::Unchanged {
            let location_id = state.locations.get(&dto.location_code).map(|l| l.id);
            let facility_ids: Vec<Uuid> = dto
                .facility_codes
                .iter()
                .filter_map(|code| state.facilities.get(code))
                .map(|f| f.id)
                .collect();
            if let Some(hotel) = state.hotels.get_mut(&dto.code) {
                hotel.location_id = location_id;
                hotel.facility_ids = facility_ids;
            }
        }
        Ok(outcome)
    }

    async fn currency_by_code(&self, code: &str) -> EngineResult<Option<Currency>> {
        Ok(self.state.read().await.currencies.get(code).cloned())
    }

    async fn board_type_by_code(&self, code: &str) -> EngineResult<Option<BoardType>> {
        Ok(self.state.read().await.board_types.get(code).cloned())
    }

    async fn facility_by_code(&self, code: &str) -> EngineResult<Option<Facility>> {
        Ok(self.state.read().await.facilities.get(code).cloned())
    }

    async fn room_attribute_by_code(&self, code: &str) -> EngineResult<Option<RoomAttribute>> {
        Ok(self.state.read().await.room_attributes.get(code).cloned())
    }

    async fn location_by_code(&self, code: &str) -> EngineResult<Option<Location>> {
        Ok(self.state.read().await.locations.get(code).cloned())
    }

    async fn hotel_by_code(&self, code: &str) -> EngineResult<Option<Hotel>> {
        Ok(self.state.read().await.hotels.get(code).cloned())
    }
}
