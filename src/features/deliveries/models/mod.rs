mod delivery;

pub use delivery::{Delivery, DeliveryStatus};
