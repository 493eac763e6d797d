use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Criteria for a live room availability search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchCriteria {
    pub hotel_code: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub occupancy: Occupancy,
    pub currency: String,
    pub nationality: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Occupancy {
    pub adults: u32,
    pub children: u32,
}

/// One bookable room rate returned by the provider at quote time.
///
/// The price code is an opaque provider handle binding this exact rate; it is
/// single-use per successful booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomResult {
    pub room_code: String,
    pub board_type: String,
    pub price_code: String,
    pub total_price: f64,
    pub nightly_price: f64,
    pub currency: String,
    pub cancellation_policies: Vec<CancellationPolicy>,
    /// Remaining sellable units at quote time. Advisory, not a reservation lock.
    pub allotment: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancellationPolicy {
    /// Moment the penalty starts applying.
    pub from: DateTime<Utc>,
    pub amount: f64,
    pub currency: String,
}

/// A stored room-search result set, immutable once created.
///
/// Bridges the provider's stateless search call to a later booking commit.
/// Any booking attempt after `expires_at` is rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSearchSession {
    pub id: String,
    pub hotel_code: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub occupancy: Occupancy,
    pub currency: String,
    pub nationality: String,
    pub rooms: Vec<RoomResult>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl RoomSearchSession {
    pub fn is_expired_at(&self, at: DateTime<Utc>) -> bool {
        at >= self.expires_at
    }

    /// Find the room the caller is booking against. Both codes must match the
    /// stored result set.
    pub fn find_room(&self, room_code: &str, price_code: &str) -> Option<&RoomResult> {
        self.rooms
            .iter()
            .find(|r| r.room_code == room_code && r.price_code == price_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session_with_room() -> RoomSearchSession {
        let now = Utc::now();
        RoomSearchSession {
            id: "VQ-TEST".to_string(),
            hotel_code: "HTL001".to_string(),
            check_in: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            check_out: NaiveDate::from_ymd_opt(2026, 9, 4).unwrap(),
            occupancy: Occupancy { adults: 2, children: 0 },
            currency: "EUR".to_string(),
            nationality: "GB".to_string(),
            rooms: vec![RoomResult {
                room_code: "DBL".to_string(),
                board_type: "BB".to_string(),
                price_code: "PC-1".to_string(),
                total_price: 300.0,
                nightly_price: 100.0,
                currency: "EUR".to_string(),
                cancellation_policies: vec![],
                allotment: 3,
            }],
            created_at: now,
            expires_at: now + Duration::minutes(30),
        }
    }

    #[test]
    fn test_find_room_requires_both_codes() {
        let session = session_with_room();
        assert!(session.find_room("DBL", "PC-1").is_some());
        assert!(session.find_room("DBL", "PC-2").is_none());
        assert!(session.find_room("TWN", "PC-1").is_none());
    }

    #[test]
    fn test_expiry_boundary_is_inclusive() {
        let session = session_with_room();
        assert!(!session.is_expired_at(session.expires_at - Duration::seconds(1)));
        assert!(session.is_expired_at(session.expires_at));
    }
}
