use chrono::Utc;
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};
use uuid::Uuid;
use voyra_core::audit::AuditEntry;
use voyra_core::booking::{ContactInfo, Guest, Reservation, ReservationStatus};
use voyra_core::identity::Actor;
use voyra_core::provider::{BookingConfirmation, ProviderBookingRequest, ProviderClient};
use voyra_core::repository::{
    AuditLogRepository, CommissionRepository, PriceRuleRepository, ReservationRepository,
    ReservationUpdate,
};
use voyra_core::{EngineError, EngineResult};
use voyra_pricing::{resolve_price, PricingRequest};
use voyra_quote::QuoteCache;

/// Drives the two-system booking lifecycle: quote session validation,
/// price resolution, local PENDING persistence, upstream commit, and the
/// cancel path. The coordinator is the only component that decides
/// reservation state transitions.
///
/// The caller arrives already authorized; no access checks happen here.
pub struct BookingCoordinator {
    provider: Arc<dyn ProviderClient>,
    quotes: Arc<QuoteCache>,
    reservations: Arc<dyn ReservationRepository>,
    rules: Arc<dyn PriceRuleRepository>,
    commissions: Arc<dyn CommissionRepository>,
    audit: Arc<dyn AuditLogRepository>,
    feed_id: String,
}

#[derive(Debug, Clone)]
pub struct CreateBookingCommand {
    pub session_id: String,
    pub room_code: String,
    pub price_code: String,
    pub contact: ContactInfo,
    pub guests: Vec<Guest>,
    /// Caller-generated idempotency key; retries with the same key return
    /// the original reservation instead of booking twice.
    pub client_reference_id: String,
    pub actor: Actor,
}

impl BookingCoordinator {
    pub fn new(
        provider: Arc<dyn ProviderClient>,
        quotes: Arc<QuoteCache>,
        reservations: Arc<dyn ReservationRepository>,
        rules: Arc<dyn PriceRuleRepository>,
        commissions: Arc<dyn CommissionRepository>,
        audit: Arc<dyn AuditLogRepository>,
        feed_id: String,
    ) -> Self {
        Self {
            provider,
            quotes,
            reservations,
            rules,
            commissions,
            audit,
            feed_id,
        }
    }

    pub(crate) fn provider(&self) -> &Arc<dyn ProviderClient> {
        &self.provider
    }

    pub(crate) fn reservations(&self) -> &Arc<dyn ReservationRepository> {
        &self.reservations
    }

    pub(crate) fn feed_id(&self) -> &str {
        &self.feed_id
    }

    /// Create a booking against a quoted room rate.
    ///
    /// Cheap failures stay cheap: session and price-code validation happen
    /// before any row is written or any upstream call is made. A PENDING row
    /// is persisted before the commit so a crash always leaves a trace, and
    /// the commit itself runs on a detached task so a disconnecting caller
    /// cannot abandon a dispatched upstream booking half-recorded.
    pub async fn create_booking(&self, cmd: CreateBookingCommand) -> EngineResult<Reservation> {
        let session = self.quotes.lookup(&cmd.session_id).await?;

        let room = session
            .find_room(&cmd.room_code, &cmd.price_code)
            .ok_or_else(|| EngineError::InvalidPriceCode(cmd.price_code.clone()))?
            .clone();

        if let Some(existing) = self
            .reservations
            .find_by_client_reference(&cmd.client_reference_id)
            .await?
        {
            info!(
                client_reference_id = %cmd.client_reference_id,
                reservation_id = %existing.id,
                "Duplicate client reference, returning existing reservation"
            );
            return Ok(existing);
        }

        let agency_id = match &cmd.actor {
            Actor::Agency { agency_id, .. } => Some(agency_id.clone()),
            _ => None,
        };

        let rules = self.rules.active_rules().await?;
        let commissions = self.commissions.active_commissions().await?;
        let resolution = resolve_price(
            &PricingRequest {
                base_price: room.total_price,
                currency: room.currency.clone(),
                hotel_code: session.hotel_code.clone(),
                board_type: room.board_type.clone(),
                agency_id: agency_id.clone(),
                booking_date: Utc::now().date_naive(),
            },
            &rules,
            &commissions,
        );

        let reservation = Reservation::new_pending(
            cmd.client_reference_id.clone(),
            cmd.actor.user_id().to_string(),
            agency_id,
            session.hotel_code.clone(),
            cmd.room_code.clone(),
            cmd.price_code.clone(),
            room.board_type.clone(),
            session.check_in,
            session.check_out,
            cmd.contact.clone(),
            cmd.guests.clone(),
            room.total_price,
            resolution.final_price,
            room.currency.clone(),
            resolution.applied_rule_id,
            resolution.commission.as_ref().map(|c| c.commission_id),
            resolution.commission.as_ref().map(|c| c.amount),
            room.cancellation_policies.clone(),
        );

        let (reservation, created) = self
            .reservations
            .create_pending_if_absent(reservation)
            .await?;
        if !created {
            // A concurrent retry with the same reference won the insert; its
            // commit is already in flight.
            return Ok(reservation);
        }

        let request = ProviderBookingRequest {
            feed_id: self.feed_id.clone(),
            client_reference_id: cmd.client_reference_id.clone(),
            hotel_code: session.hotel_code.clone(),
            room_code: cmd.room_code.clone(),
            price_code: cmd.price_code.clone(),
            check_in: session.check_in,
            check_out: session.check_out,
            contact: cmd.contact.clone(),
            guests: cmd.guests.clone(),
        };

        // Detach the commit: once the upstream call is dispatched it must run
        // to completion and record its outcome, even if the caller has gone.
        let provider = Arc::clone(&self.provider);
        let reservations = Arc::clone(&self.reservations);
        let audit = Arc::clone(&self.audit);
        let actor_user_id = cmd.actor.user_id().to_string();
        let reservation_id = reservation.id;
        let handle = tokio::spawn(async move {
            commit_upstream(
                provider,
                reservations,
                audit,
                request,
                reservation_id,
                actor_user_id,
            )
            .await
        });

        handle
            .await
            .map_err(|e| EngineError::PersistenceFailure(format!("commit task aborted: {e}")))?
    }

    /// Cancel a confirmed booking. Upstream goes first; local state never
    /// assumes a cancellation succeeded, so an upstream failure leaves the
    /// reservation CONFIRMED and surfaces the error.
    pub async fn cancel_booking(
        &self,
        reservation_id: Uuid,
        actor: &Actor,
    ) -> EngineResult<Reservation> {
        let reservation = self
            .reservations
            .get(reservation_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("reservation {reservation_id}")))?;

        if reservation.status != ReservationStatus::Confirmed {
            return Err(EngineError::InvalidTransition {
                from: reservation.status.as_str().to_string(),
                to: ReservationStatus::Cancelled.as_str().to_string(),
            });
        }

        let cancellation = self
            .provider
            .cancel_booking(&self.feed_id, &reservation.booking_number)
            .await?;

        let cancelled = self
            .reservations
            .apply(
                reservation_id,
                ReservationUpdate {
                    status: Some(ReservationStatus::Cancelled),
                    penalty_fee: cancellation.penalty_fee,
                    ..Default::default()
                },
            )
            .await?;

        self.record_audit(
            reservation_id,
            "BOOKING_CANCELLED",
            actor.user_id().to_string(),
            serde_json::json!({
                "booking_number": cancelled.booking_number.clone(),
                "penalty_fee": cancellation.penalty_fee,
            }),
        )
        .await;

        Ok(cancelled)
    }

    pub(crate) async fn record_audit(
        &self,
        reservation_id: Uuid,
        action: &str,
        actor_user_id: String,
        payload: serde_json::Value,
    ) {
        append_audit(&self.audit, reservation_id, action, actor_user_id, payload).await;
    }
}

async fn commit_upstream(
    provider: Arc<dyn ProviderClient>,
    reservations: Arc<dyn ReservationRepository>,
    audit: Arc<dyn AuditLogRepository>,
    request: ProviderBookingRequest,
    reservation_id: Uuid,
    actor_user_id: String,
) -> EngineResult<Reservation> {
    match provider.create_booking(&request).await {
        Ok(confirmation) => {
            confirm_locally(
                reservations,
                audit,
                reservation_id,
                confirmation,
                actor_user_id,
            )
            .await
        }
        Err(EngineError::UpstreamRejected(reason)) => {
            info!(reservation_id = %reservation_id, %reason, "Upstream rejected booking");
            let update = ReservationUpdate {
                status: Some(ReservationStatus::Failed),
                failure_reason: Some(reason.clone()),
                ..Default::default()
            };
            if let Err(e) = reservations.apply(reservation_id, update).await {
                warn!(reservation_id = %reservation_id, error = %e, "Could not record FAILED state");
            }
            Err(EngineError::UpstreamRejected(reason))
        }
        Err(EngineError::UpstreamUnavailable(reason)) => {
            // Outcome unknown: the request may or may not have landed. The
            // row stays PENDING for reconcile_pending to resolve against
            // upstream truth.
            warn!(
                reservation_id = %reservation_id,
                %reason,
                "Upstream outcome unknown, reservation left PENDING"
            );
            Err(EngineError::Indeterminate(reservation_id))
        }
        Err(other) => Err(other),
    }
}

/// Record an upstream-confirmed booking locally. Losing a confirmed booking
/// is the worst failure mode, so persistence is retried and a final failure
/// is escalated loudly; the operation never reports success unless both
/// sides agreed.
async fn confirm_locally(
    reservations: Arc<dyn ReservationRepository>,
    audit: Arc<dyn AuditLogRepository>,
    reservation_id: Uuid,
    confirmation: BookingConfirmation,
    actor_user_id: String,
) -> EngineResult<Reservation> {
    let update = ReservationUpdate {
        status: Some(ReservationStatus::Confirmed),
        booking_number: Some(confirmation.booking_number.clone()),
        ..Default::default()
    };

    let mut last_error = None;
    for attempt in 1..=3u32 {
        match reservations.apply(reservation_id, update.clone()).await {
            Ok(confirmed) => {
                info!(
                    reservation_id = %reservation_id,
                    booking_number = %confirmed.booking_number,
                    "Booking confirmed"
                );
                append_audit(
                    &audit,
                    reservation_id,
                    "BOOKING_CONFIRMED",
                    actor_user_id,
                    serde_json::json!({
                        "booking_number": confirmation.booking_number,
                        "confirmation_code": confirmation.confirmation_code,
                    }),
                )
                .await;
                return Ok(confirmed);
            }
            Err(EngineError::PersistenceFailure(reason)) => {
                warn!(reservation_id = %reservation_id, attempt, %reason, "Retrying local confirm");
                last_error = Some(EngineError::PersistenceFailure(reason));
                sleep(Duration::from_millis(50 * attempt as u64)).await;
            }
            Err(other) => return Err(other),
        }
    }

    error!(
        reservation_id = %reservation_id,
        booking_number = %confirmation.booking_number,
        "CONFIRMED upstream but unrecorded locally, operator intervention required"
    );
    Err(last_error
        .unwrap_or_else(|| EngineError::PersistenceFailure("local confirm failed".to_string())))
}

async fn append_audit(
    audit: &Arc<dyn AuditLogRepository>,
    reservation_id: Uuid,
    action: &str,
    actor_user_id: String,
    payload: serde_json::Value,
) {
    let entry = AuditEntry::new(
        "reservation",
        reservation_id.to_string(),
        action,
        actor_user_id,
        payload,
    );
    if let Err(e) = audit.append(entry).await {
        warn!(reservation_id = %reservation_id, error = %e, "Audit append failed");
    }
}
