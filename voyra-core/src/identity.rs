use crate::booking::Reservation;
use serde::{Deserialize, Serialize};

/// An already-authenticated caller. Authorization is decided by the calling
/// layer; the engine accepts the actor as-is and performs no further checks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "role", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Actor {
    Admin { user_id: String },
    Agency { user_id: String, agency_id: String },
    Customer { user_id: String },
}

impl Actor {
    pub fn user_id(&self) -> &str {
        match self {
            Actor::Admin { user_id } => user_id,
            Actor::Agency { user_id, .. } => user_id,
            Actor::Customer { user_id } => user_id,
        }
    }
}

/// The single authorization predicate for reservation visibility.
///
/// Callable identically from every entry point: an administrator sees
/// everything, an agency actor only reservations carrying its agency id, a
/// direct consumer only their own.
pub fn can_access(actor: &Actor, reservation: &Reservation) -> bool {
    match actor {
        Actor::Admin { .. } => true,
        Actor::Agency { agency_id, .. } => {
            reservation.agency_id.as_deref() == Some(agency_id.as_str())
        }
        Actor::Customer { user_id } => reservation.user_id == *user_id,
    }
}
