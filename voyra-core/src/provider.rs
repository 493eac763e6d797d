use crate::booking::{ContactInfo, Guest};
use crate::search::{CancellationPolicy, Occupancy, RoomResult};
use crate::EngineResult;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Credentials issued by the provider's authenticate operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderToken {
    pub token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl ProviderToken {
    /// Treat a token as stale slightly before its hard expiry so an in-flight
    /// request never crosses the boundary mid-call.
    pub fn is_fresh_at(&self, at: DateTime<Utc>) -> bool {
        at + chrono::Duration::seconds(60) < self.expires_at
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomSearchRequest {
    pub feed_id: String,
    pub hotel_code: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub occupancy: Occupancy,
    pub currency: String,
    pub nationality: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoomSearchResponse {
    pub rooms: Vec<RoomResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderBookingRequest {
    pub feed_id: String,
    pub client_reference_id: String,
    pub hotel_code: String,
    pub room_code: String,
    pub price_code: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub contact: ContactInfo,
    pub guests: Vec<Guest>,
}

/// Successful booking commit. Explicit provider rejections surface as
/// `EngineError::UpstreamRejected` instead.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingConfirmation {
    pub booking_number: String,
    pub confirmation_code: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProviderReservationStatus {
    Confirmed,
    Cancelled,
    Rejected,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReservationDetail {
    pub booking_number: String,
    pub client_reference_id: String,
    pub status: ProviderReservationStatus,
    pub total_price: Option<f64>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CancellationConfirmation {
    pub booking_number: String,
    pub penalty_fee: Option<f64>,
    pub currency: Option<String>,
    pub cancellation_policies: Vec<CancellationPolicy>,
}

// Reference-data payloads. Each carries the provider's code as the natural
// key; local ids and relations are assigned on our side and never come from
// the provider.

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CurrencyDto {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoardTypeDto {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FacilityDto {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomAttributeDto {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocationDto {
    pub code: String,
    pub name: String,
    pub country_code: String,
    pub parent_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HotelDetailDto {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<i32>,
    pub images: Vec<String>,
    pub facility_codes: Vec<String>,
    pub location_code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HotelListItem {
    pub code: String,
    pub name: String,
    pub location_code: String,
    /// Provider-reported last-modified marker, used for incremental sync.
    pub revision_date: DateTime<Utc>,
}

/// Typed mapping to the reservation provider's operations.
///
/// Token acquisition and refresh are owned by the implementation; callers
/// never see credentials. Every call carries a bounded timeout and maps
/// transport failures to `UpstreamUnavailable` and business rejections to
/// `UpstreamRejected`.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    async fn search_rooms(&self, request: &RoomSearchRequest) -> EngineResult<RoomSearchResponse>;

    async fn hotel_detail(&self, feed_id: &str, hotel_code: &str) -> EngineResult<HotelDetailDto>;

    async fn hotel_list(
        &self,
        feed_id: &str,
        last_revision: Option<DateTime<Utc>>,
    ) -> EngineResult<Vec<HotelListItem>>;

    async fn create_booking(
        &self,
        request: &ProviderBookingRequest,
    ) -> EngineResult<BookingConfirmation>;

    async fn reservation_detail(
        &self,
        feed_id: &str,
        booking_number: &str,
    ) -> EngineResult<ReservationDetail>;

    /// Lookup by the caller-issued idempotency key. Returns `None` when the
    /// provider has no record of the reference, which the reconciliation hook
    /// treats as still-unresolved rather than failed.
    async fn reservation_by_client_reference(
        &self,
        feed_id: &str,
        client_reference_id: &str,
    ) -> EngineResult<Option<ReservationDetail>>;

    async fn cancel_booking(
        &self,
        feed_id: &str,
        booking_number: &str,
    ) -> EngineResult<CancellationConfirmation>;

    async fn currencies(&self, feed_id: &str) -> EngineResult<Vec<CurrencyDto>>;

    async fn board_types(&self, feed_id: &str) -> EngineResult<Vec<BoardTypeDto>>;

    async fn facilities(&self, feed_id: &str) -> EngineResult<Vec<FacilityDto>>;

    async fn room_attributes(&self, feed_id: &str) -> EngineResult<Vec<RoomAttributeDto>>;

    async fn locations(&self, feed_id: &str) -> EngineResult<Vec<LocationDto>>;
}
