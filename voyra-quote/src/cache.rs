use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;
use voyra_core::provider::{ProviderClient, RoomSearchRequest};
use voyra_core::search::{RoomSearchSession, SearchCriteria};
use voyra_core::{EngineError, EngineResult};

/// Ephemeral room-search result store.
///
/// Bridges the provider's stateless search to a later booking commit: every
/// search stores its result set under a fresh session id with a fixed
/// validity window. Entries are never mutated after creation; expiry is
/// judged against the clock on every lookup, so callers can never observe a
/// stale price code even before physical cleanup has run.
pub struct QuoteCache {
    provider: Arc<dyn ProviderClient>,
    feed_id: String,
    session_ttl: Duration,
    sessions: RwLock<HashMap<String, RoomSearchSession>>,
}

impl QuoteCache {
    pub fn new(provider: Arc<dyn ProviderClient>, feed_id: String, ttl_minutes: i64) -> Self {
        Self {
            provider,
            feed_id,
            session_ttl: Duration::minutes(ttl_minutes),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Perform a live upstream search and store the result set.
    ///
    /// Price data must always be live at quote time: upstream errors
    /// propagate unchanged and nothing is cached on failure.
    pub async fn search(&self, criteria: SearchCriteria) -> EngineResult<RoomSearchSession> {
        let request = RoomSearchRequest {
            feed_id: self.feed_id.clone(),
            hotel_code: criteria.hotel_code.clone(),
            check_in: criteria.check_in,
            check_out: criteria.check_out,
            occupancy: criteria.occupancy.clone(),
            currency: criteria.currency.clone(),
            nationality: criteria.nationality.clone(),
        };

        let response = self.provider.search_rooms(&request).await?;

        let now = Utc::now();
        let session = RoomSearchSession {
            id: generate_session_id(),
            hotel_code: criteria.hotel_code,
            check_in: criteria.check_in,
            check_out: criteria.check_out,
            occupancy: criteria.occupancy,
            currency: criteria.currency,
            nationality: criteria.nationality,
            rooms: response.rooms,
            created_at: now,
            expires_at: now + self.session_ttl,
        };

        info!(
            session_id = %session.id,
            hotel = %session.hotel_code,
            rooms = session.rooms.len(),
            "Stored room search session"
        );

        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session.clone());
        Ok(session)
    }

    /// Resolve a session by id. An entry past its expiry is treated as
    /// absent regardless of whether physical cleanup has run, and is evicted
    /// on the way out.
    pub async fn lookup(&self, session_id: &str) -> EngineResult<RoomSearchSession> {
        let expired = {
            let sessions = self.sessions.read().await;
            match sessions.get(session_id) {
                None => return Err(EngineError::SessionNotFound(session_id.to_string())),
                Some(session) if session.is_expired_at(Utc::now()) => true,
                Some(session) => return Ok(session.clone()),
            }
        };

        if expired {
            self.sessions.write().await.remove(session_id);
            debug!(session_id, "Evicted expired room search session");
        }
        Err(EngineError::SessionExpired(session_id.to_string()))
    }

    /// Physically drop every expired entry. Lookup correctness does not
    /// depend on this running; it only bounds memory.
    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired_at(now));
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

fn generate_session_id() -> String {
    let stamp = Utc::now().timestamp();
    let short = Uuid::new_v4().simple().to_string();
    format!("VQ-{}-{}", stamp, short[..8].to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, NaiveDate};
    use voyra_core::provider::*;
    use voyra_core::search::{Occupancy, RoomResult};

    /// Provider stub serving a canned result set; non-search operations are
    /// not wired.
    struct StubProvider {
        rooms: Vec<RoomResult>,
        fail_search: bool,
    }

    fn not_wired<T>() -> EngineResult<T> {
        Err(EngineError::UpstreamUnavailable("not wired in test".to_string()))
    }

    #[async_trait]
    impl ProviderClient for StubProvider {
        async fn search_rooms(
            &self,
            _request: &RoomSearchRequest,
        ) -> EngineResult<RoomSearchResponse> {
            if self.fail_search {
                return Err(EngineError::UpstreamRejected("hotel closed".to_string()));
            }
            Ok(RoomSearchResponse {
                rooms: self.rooms.clone(),
            })
        }

        async fn hotel_detail(&self, _: &str, _: &str) -> EngineResult<HotelDetailDto> {
            not_wired()
        }

        async fn hotel_list(
            &self,
            _: &str,
            _: Option<DateTime<Utc>>,
        ) -> EngineResult<Vec<HotelListItem>> {
            not_wired()
        }

        async fn create_booking(
            &self,
            _: &ProviderBookingRequest,
        ) -> EngineResult<BookingConfirmation> {
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

        async fn cancel_booking(
            &self,
            _: &str,
            _: &str,
        ) -> EngineResult<CancellationConfirmation> {
            not_wired()
        }

        async fn currencies(&self, _: &str) -> EngineResult<Vec<CurrencyDto>> {
            not_wired()
        }

        async fn board_types(&self, _: &str) -> EngineResult<Vec<BoardTypeDto>> {
            not_wired()
        }

        async fn facilities(&self, _: &str) -> EngineResult<Vec<FacilityDto>> {
            not_wired()
        }

        async fn room_attributes(&self, _: &str) -> EngineResult<Vec<RoomAttributeDto>> {
            not_wired()
        }

        async fn locations(&self, _: &str) -> EngineResult<Vec<LocationDto>> {
            not_wired()
        }
    }

    fn criteria() -> SearchCriteria {
        SearchCriteria {
            hotel_code: "HTL001".to_string(),
            check_in: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            check_out: NaiveDate::from_ymd_opt(2026, 9, 4).unwrap(),
            occupancy: Occupancy { adults: 2, children: 0 },
            currency: "EUR".to_string(),
            nationality: "GB".to_string(),
        }
    }

    fn room(price_code: &str) -> RoomResult {
        RoomResult {
            room_code: "DBL".to_string(),
            board_type: "BB".to_string(),
            price_code: price_code.to_string(),
            total_price: 300.0,
            nightly_price: 100.0,
            currency: "EUR".to_string(),
            cancellation_policies: vec![],
            allotment: 2,
        }
    }

    fn cache_with_rooms(rooms: Vec<RoomResult>) -> QuoteCache {
        QuoteCache::new(
            Arc::new(StubProvider { rooms, fail_search: false }),
            "feed-1".to_string(),
            30,
        )
    }

    #[tokio::test]
    async fn test_search_stores_session_with_ttl() {
        let cache = cache_with_rooms(vec![room("PC-1")]);
        let session = cache.search(criteria()).await.unwrap();

        assert_eq!(session.expires_at, session.created_at + Duration::minutes(30));
        assert_eq!(session.rooms.len(), 1);

        let found = cache.lookup(&session.id).await.unwrap();
        assert_eq!(found.rooms[0].price_code, "PC-1");
    }

    #[tokio::test]
    async fn test_lookup_unknown_session() {
        let cache = cache_with_rooms(vec![]);
        assert!(matches!(
            cache.lookup("VQ-missing").await,
            Err(EngineError::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_expired_session_is_logically_absent_before_purge() {
        let cache = cache_with_rooms(vec![room("PC-1")]);
        let mut session = cache.search(criteria()).await.unwrap();
        let id = session.id.clone();

        // Back-date the stored entry past its expiry without purging.
        session.expires_at = Utc::now() - Duration::minutes(1);
        cache.sessions.write().await.insert(id.clone(), session);

        assert!(matches!(
            cache.lookup(&id).await,
            Err(EngineError::SessionExpired(_))
        ));
        // The failed lookup lazily evicted the entry.
        assert!(matches!(
            cache.lookup(&id).await,
            Err(EngineError::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_upstream_failure_stores_nothing() {
        let cache = QuoteCache::new(
            Arc::new(StubProvider { rooms: vec![], fail_search: true }),
            "feed-1".to_string(),
            30,
        );
        assert!(matches!(
            cache.search(criteria()).await,
            Err(EngineError::UpstreamRejected(_))
        ));
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_purge_removes_only_expired() {
        let cache = cache_with_rooms(vec![room("PC-1")]);
        let live = cache.search(criteria()).await.unwrap();
        let mut stale = cache.search(criteria()).await.unwrap();
        let stale_id = stale.id.clone();
        stale.expires_at = Utc::now() - Duration::minutes(1);
        cache.sessions.write().await.insert(stale_id, stale);

        assert_eq!(cache.purge_expired().await, 1);
        assert_eq!(cache.len().await, 1);
        assert!(cache.lookup(&live.id).await.is_ok());
    }
}
