pub mod coordinator;
pub mod reconcile;

pub use coordinator::{BookingCoordinator, CreateBookingCommand};
pub use reconcile::ReconcileSummary;
