//! Delivery state machine.
//!
//! ```text
//! accepted --pick_up--> picked_up --deliver--> delivered
//!     \                     |
//!      +------cancel--------+-----> cancelled
//! ```
//!
//! `delivered` and `cancelled` are terminal. Every accepted transition carries
//! a cascade onto the recovery report and, for `deliver`, the event.

use crate::features::deliveries::models::DeliveryStatus;
use crate::features::events::models::EventStatus;
use crate::features::recoveries::models::RecoveryStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryAction {
    PickUp,
    Deliver,
    Cancel,
}

/// Status changes on the rows a delivery transition drags along
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cascade {
    pub report_status: RecoveryStatus,
    pub event_status: Option<EventStatus>,
}

impl DeliveryAction {
    /// Action that moves a delivery to `target`, for the status-update endpoint
    pub fn toward(target: DeliveryStatus) -> Option<Self> {
        match target {
            DeliveryStatus::PickedUp => Some(DeliveryAction::PickUp),
            DeliveryStatus::Delivered => Some(DeliveryAction::Deliver),
            DeliveryStatus::Cancelled => Some(DeliveryAction::Cancel),
            DeliveryStatus::Accepted => None,
        }
    }

    pub fn target(self) -> DeliveryStatus {
        match self {
            DeliveryAction::PickUp => DeliveryStatus::PickedUp,
            DeliveryAction::Deliver => DeliveryStatus::Delivered,
            DeliveryAction::Cancel => DeliveryStatus::Cancelled,
        }
    }

    pub fn cascade(self) -> Cascade {
        match self {
            DeliveryAction::PickUp => Cascade {
                report_status: RecoveryStatus::PickedUp,
                event_status: None,
            },
            DeliveryAction::Deliver => Cascade {
                report_status: RecoveryStatus::Delivered,
                event_status: Some(EventStatus::Completed),
            },
            // Report goes back to the queue for another driver
            DeliveryAction::Cancel => Cascade {
                report_status: RecoveryStatus::Pending,
                event_status: None,
            },
        }
    }
}

impl std::fmt::Display for DeliveryAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryAction::PickUp => write!(f, "pick up"),
            DeliveryAction::Deliver => write!(f, "deliver"),
            DeliveryAction::Cancel => write!(f, "cancel"),
        }
    }
}

/// Transition table; `None` rejects the action from `current`
pub fn next_status(current: DeliveryStatus, action: DeliveryAction) -> Option<DeliveryStatus> {
    use DeliveryAction::*;
    use DeliveryStatus::*;

    match (current, action) {
        (Accepted, PickUp) => Some(PickedUp),
        (PickedUp, Deliver) => Some(Delivered),
        (Accepted | PickedUp, Cancel) => Some(Cancelled),
        _ => None,
    }
}
