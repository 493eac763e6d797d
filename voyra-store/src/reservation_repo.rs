use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;
use voyra_core::booking::{Reservation, ReservationStatus};
use voyra_core::identity::{can_access, Actor};
use voyra_core::repository::{ReservationRepository, ReservationUpdate};
use voyra_core::{EngineError, EngineResult};

#[derive(Default)]
struct ReservationState {
    by_id: HashMap<Uuid, Reservation>,
    by_reference: HashMap<String, Uuid>,
    /// Price codes held by a live (PENDING or CONFIRMED) booking. A provider
    /// rate handle is single-use; a FAILED booking releases its hold.
    by_price_code: HashMap<String, Uuid>,
}

/// Reservation store with per-key atomic read-modify-write.
///
/// All mutations run under one write lock, so two concurrent creates with
/// the same client reference id can never both insert, and status updates
/// observe a consistent row while validating the lifecycle.
pub struct InMemoryReservationRepository {
    state: RwLock<ReservationState>,
}

impl InMemoryReservationRepository {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(ReservationState::default()),
        }
    }
}

impl Default for InMemoryReservationRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReservationRepository for InMemoryReservationRepository {
    async fn create_pending_if_absent(
        &self,
        reservation: Reservation,
    ) -> EngineResult<(Reservation, bool)> {
        let mut state = self.state.write().await;

        if let Some(existing_id) = state.by_reference.get(&reservation.client_reference_id) {
            let existing = state
                .by_id
                .get(existing_id)
                .cloned()
                .ok_or_else(|| {
                    EngineError::PersistenceFailure("dangling client reference index".to_string())
                })?;
            return Ok((existing, false));
        }

        if let Some(holder_id) = state.by_price_code.get(&reservation.price_code) {
            let still_held = state
                .by_id
                .get(holder_id)
                .map(|holder| holder.status != ReservationStatus::Failed)
                .unwrap_or(false);
            if still_held {
                return Err(EngineError::InvalidPriceCode(format!(
                    "price code {} already consumed",
                    reservation.price_code
                )));
            }
        }

        state
            .by_reference
            .insert(reservation.client_reference_id.clone(), reservation.id);
        state
            .by_price_code
            .insert(reservation.price_code.clone(), reservation.id);
        state.by_id.insert(reservation.id, reservation.clone());
        info!(reservation_id = %reservation.id, "Persisted PENDING reservation");
        Ok((reservation, true))
    }

    async fn get(&self, id: Uuid) -> EngineResult<Option<Reservation>> {
        Ok(self.state.read().await.by_id.get(&id).cloned())
    }

    async fn find_by_client_reference(
        &self,
        client_reference_id: &str,
    ) -> EngineResult<Option<Reservation>> {
        let state = self.state.read().await;
        Ok(state
            .by_reference
            .get(client_reference_id)
            .and_then(|id| state.by_id.get(id))
            .cloned())
    }

    async fn list_pending(&self) -> EngineResult<Vec<Reservation>> {
        Ok(self
            .state
            .read()
            .await
            .by_id
            .values()
            .filter(|r| r.status == ReservationStatus::Pending)
            .cloned()
            .collect())
    }

    async fn list_for_actor(&self, actor: &Actor) -> EngineResult<Vec<Reservation>> {
        let mut visible: Vec<Reservation> = self
            .state
            .read()
            .await
            .by_id
            .values()
            .filter(|r| can_access(actor, r))
            .cloned()
            .collect();
        visible.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(visible)
    }

    async fn apply(&self, id: Uuid, update: ReservationUpdate) -> EngineResult<Reservation> {
        let mut state = self.state.write().await;
        let reservation = state
            .by_id
            .get_mut(&id)
            .ok_or_else(|| EngineError::NotFound(format!("reservation {id}")))?;

        let mut released_price_code = None;
        if let Some(next) = update.status {
            if !reservation.status.can_transition(next) {
                return Err(EngineError::InvalidTransition {
                    from: reservation.status.as_str().to_string(),
                    to: next.as_str().to_string(),
                });
            }
            info!(
                reservation_id = %id,
                from = reservation.status.as_str(),
                to = next.as_str(),
                "Reservation transition"
            );
            reservation.status = next;
            if next == ReservationStatus::Failed {
                released_price_code = Some(reservation.price_code.clone());
            }
        }
        if let Some(booking_number) = update.booking_number {
            reservation.booking_number = booking_number;
        }
        if let Some(reason) = update.failure_reason {
            reservation.failure_reason = Some(reason);
        }
        if let Some(penalty) = update.penalty_fee {
            reservation.penalty_fee = Some(penalty);
        }
        reservation.updated_at = Utc::now();
        let updated = reservation.clone();

        if let Some(price_code) = released_price_code {
            if state.by_price_code.get(&price_code) == Some(&id) {
                state.by_price_code.remove(&price_code);
            }
        }

        Ok(updated)
    }
}
