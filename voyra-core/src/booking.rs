use crate::pii::Masked;
use crate::search::CancellationPolicy;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reservation status in the lifecycle.
///
/// PENDING is written before the upstream call so a crash still leaves an
/// auditable trace. CONFIRMED may only move to CANCELLED; FAILED and
/// CANCELLED are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Cancelled,
    Failed,
}

impl ReservationStatus {
    pub fn can_transition(self, next: ReservationStatus) -> bool {
        matches!(
            (self, next),
            (ReservationStatus::Pending, ReservationStatus::Confirmed)
                | (ReservationStatus::Pending, ReservationStatus::Failed)
                | (ReservationStatus::Confirmed, ReservationStatus::Cancelled)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReservationStatus::Pending => "PENDING",
            ReservationStatus::Confirmed => "CONFIRMED",
            ReservationStatus::Cancelled => "CANCELLED",
            ReservationStatus::Failed => "FAILED",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactInfo {
    pub name: String,
    pub email: Masked<String>,
    pub phone: Masked<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Guest {
    pub first_name: String,
    pub last_name: String,
    pub is_child: bool,
}

/// The single source of truth for a booked stay on the merchant side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    /// Provider-issued booking number. Empty until confirmed.
    pub booking_number: String,
    /// Caller-issued idempotency key correlating retries of the same booking.
    pub client_reference_id: String,
    pub status: ReservationStatus,
    pub user_id: String,
    pub agency_id: Option<String>,
    pub hotel_code: String,
    pub room_code: String,
    /// The provider rate handle this booking consumed. Single-use: a second
    /// booking against the same price code must fail once one succeeded.
    pub price_code: String,
    pub board_type: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub contact: ContactInfo,
    pub guests: Vec<Guest>,
    /// Provider-quoted price before merchant rules.
    pub base_price: f64,
    /// Price actually charged after rule and commission resolution.
    pub final_price: f64,
    pub currency: String,
    pub applied_rule_id: Option<Uuid>,
    pub commission_id: Option<Uuid>,
    pub commission_amount: Option<f64>,
    /// Cancellation terms as quoted, snapshotted at booking time.
    pub cancellation_policies: Vec<CancellationPolicy>,
    pub penalty_fee: Option<f64>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    #[allow(clippy::too_many_arguments)]
    pub fn new_pending(
        client_reference_id: String,
        user_id: String,
        agency_id: Option<String>,
        hotel_code: String,
        room_code: String,
        price_code: String,
        board_type: String,
        check_in: NaiveDate,
        check_out: NaiveDate,
        contact: ContactInfo,
        guests: Vec<Guest>,
        base_price: f64,
        final_price: f64,
        currency: String,
        applied_rule_id: Option<Uuid>,
        commission_id: Option<Uuid>,
        commission_amount: Option<f64>,
        cancellation_policies: Vec<CancellationPolicy>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            booking_number: String::new(),
            client_reference_id,
            status: ReservationStatus::Pending,
            user_id,
            agency_id,
            hotel_code,
            room_code,
            price_code,
            board_type,
            check_in,
            check_out,
            contact,
            guests,
            base_price,
            final_price,
            currency,
            applied_rule_id,
            commission_id,
            commission_amount,
            cancellation_policies,
            penalty_fee: None,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        }
    }
}
