use crate::audit::{AuditEntry, AuditPage, AuditQuery};
use crate::booking::{Reservation, ReservationStatus};
use crate::catalog::{BoardType, Currency, Facility, Hotel, Location, RoomAttribute};
use crate::identity::Actor;
use crate::provider::{
    BoardTypeDto, CurrencyDto, FacilityDto, HotelDetailDto, LocationDto, RoomAttributeDto,
};
use crate::rules::{Commission, PriceRule};
use crate::EngineResult;
use async_trait::async_trait;
use uuid::Uuid;

/// Fields applied alongside a reservation status transition.
#[derive(Debug, Clone, Default)]
pub struct ReservationUpdate {
    pub status: Option<ReservationStatus>,
    pub booking_number: Option<String>,
    pub failure_reason: Option<String>,
    pub penalty_fee: Option<f64>,
}

/// Durable reservation store. Implementations must provide atomic
/// read-modify-write semantics per reservation id and per client reference
/// id: two concurrent creates with the same reference must yield exactly one
/// row.
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Insert `reservation` unless a row with the same client reference id
    /// already exists. Returns the surviving row and whether this call
    /// created it.
    async fn create_pending_if_absent(
        &self,
        reservation: Reservation,
    ) -> EngineResult<(Reservation, bool)>;

    async fn get(&self, id: Uuid) -> EngineResult<Option<Reservation>>;

    async fn find_by_client_reference(
        &self,
        client_reference_id: &str,
    ) -> EngineResult<Option<Reservation>>;

    async fn list_pending(&self) -> EngineResult<Vec<Reservation>>;

    /// Reservation read model scoped by the authorization predicate.
    async fn list_for_actor(&self, actor: &Actor) -> EngineResult<Vec<Reservation>>;

    /// Apply `update` atomically. Status changes outside the legal lifecycle
    /// are rejected with `InvalidTransition`.
    async fn apply(&self, id: Uuid, update: ReservationUpdate) -> EngineResult<Reservation>;
}

/// Price rules are administrator-maintained and read-only to the pricing path.
#[async_trait]
pub trait PriceRuleRepository: Send + Sync {
    async fn save(&self, rule: PriceRule) -> EngineResult<()>;
    async fn delete(&self, id: Uuid) -> EngineResult<()>;
    async fn list(&self) -> EngineResult<Vec<PriceRule>>;
    /// Snapshot of rules with `is_active` set, as consumed by the pricing engine.
    async fn active_rules(&self) -> EngineResult<Vec<PriceRule>>;
}

#[async_trait]
pub trait CommissionRepository: Send + Sync {
    async fn save(&self, commission: Commission) -> EngineResult<()>;
    async fn delete(&self, id: Uuid) -> EngineResult<()>;
    async fn list(&self) -> EngineResult<Vec<Commission>>;
    async fn active_commissions(&self) -> EngineResult<Vec<Commission>>;
}

/// Outcome of a catalog upsert, as reported in the sync summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
    Unchanged,
}

/// Local catalog of provider reference data. Upserts overwrite upstream-owned
/// fields unconditionally and never touch local-owned fields (internal ids,
/// resolved foreign keys, manual flags).
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn upsert_currency(&self, dto: &CurrencyDto) -> EngineResult<UpsertOutcome>;
    async fn upsert_board_type(&self, dto: &BoardTypeDto) -> EngineResult<UpsertOutcome>;
    async fn upsert_facility(&self, dto: &FacilityDto) -> EngineResult<UpsertOutcome>;
    async fn upsert_room_attribute(&self, dto: &RoomAttributeDto) -> EngineResult<UpsertOutcome>;
    async fn upsert_location(&self, dto: &LocationDto) -> EngineResult<UpsertOutcome>;
    async fn upsert_hotel(&self, dto: &HotelDetailDto) -> EngineResult<UpsertOutcome>;

    async fn currency_by_code(&self, code: &str) -> EngineResult<Option<Currency>>;
    async fn board_type_by_code(&self, code: &str) -> EngineResult<Option<BoardType>>;
    async fn facility_by_code(&self, code: &str) -> EngineResult<Option<Facility>>;
    async fn room_attribute_by_code(&self, code: &str) -> EngineResult<Option<RoomAttribute>>;
    async fn location_by_code(&self, code: &str) -> EngineResult<Option<Location>>;
    async fn hotel_by_code(&self, code: &str) -> EngineResult<Option<Hotel>>;
}

/// Append-only audit trail with a filtered, paginated read model.
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    async fn append(&self, entry: AuditEntry) -> EngineResult<()>;
    async fn query(&self, query: &AuditQuery) -> EngineResult<AuditPage>;
}
