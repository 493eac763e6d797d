use crate::coordinator::BookingCoordinator;
use serde::Serialize;
use tracing::{info, warn};
use voyra_core::booking::ReservationStatus;
use voyra_core::provider::ProviderReservationStatus;
use voyra_core::repository::ReservationUpdate;
use voyra_core::EngineResult;

/// Outcome counts for one reconciliation pass over PENDING reservations.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ReconcileSummary {
    pub confirmed: u32,
    pub failed: u32,
    /// Rows the provider has no record of yet. Left PENDING for a later pass
    /// rather than guessed at.
    pub unresolved: u32,
    pub errors: u32,
}

impl BookingCoordinator {
    /// Resolve PENDING reservations against upstream truth.
    ///
    /// A booking left PENDING by an indeterminate commit is looked up by its
    /// client reference id: an upstream CONFIRMED record promotes the row and
    /// populates the booking number, an upstream rejection marks it FAILED.
    /// Per-row errors never abort the pass.
    pub async fn reconcile_pending(&self) -> EngineResult<ReconcileSummary> {
        let pending = self.reservations().list_pending().await?;
        let mut summary = ReconcileSummary::default();

        info!(rows = pending.len(), "Reconciling pending reservations");
        for row in pending {
            let lookup = self
                .provider()
                .reservation_by_client_reference(self.feed_id(), &row.client_reference_id)
                .await;

            match lookup {
                Ok(Some(detail)) => {
                    let update = match detail.status {
                        ProviderReservationStatus::Confirmed => ReservationUpdate {
                            status: Some(ReservationStatus::Confirmed),
                            booking_number: Some(detail.booking_number.clone()),
                            ..Default::default()
                        },
                        ProviderReservationStatus::Cancelled
                        | ProviderReservationStatus::Rejected => ReservationUpdate {
                            status: Some(ReservationStatus::Failed),
                            failure_reason: Some(format!(
                                "reconciled to upstream status {:?}",
                                detail.status
                            )),
                            ..Default::default()
                        },
                    };
                    let resolved_to = update.status;

                    match self.reservations().apply(row.id, update).await {
                        Ok(resolved) => {
                            self.record_audit(
                                row.id,
                                "BOOKING_RECONCILED",
                                "system".to_string(),
                                serde_json::json!({
                                    "client_reference_id": row.client_reference_id,
                                    "resolved_status": resolved.status,
                                    "booking_number": resolved.booking_number,
                                }),
                            )
                            .await;
                            match resolved_to {
                                Some(ReservationStatus::Confirmed) => summary.confirmed += 1,
                                _ => summary.failed += 1,
                            }
                        }
                        Err(e) => {
                            warn!(reservation_id = %row.id, error = %e, "Reconcile apply failed");
                            summary.errors += 1;
                        }
                    }
                }
                Ok(None) => {
                    summary.unresolved += 1;
                }
                Err(e) => {
                    warn!(
                        reservation_id = %row.id,
                        error = %e,
                        "Upstream lookup failed during reconciliation"
                    );
                    summary.errors += 1;
                }
            }
        }

        info!(
            confirmed = summary.confirmed,
            failed = summary.failed,
            unresolved = summary.unresolved,
            errors = summary.errors,
            "Reconciliation pass complete"
        );
        Ok(summary)
    }
}
