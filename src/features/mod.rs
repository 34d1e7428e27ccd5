pub mod auth;
pub mod deliveries;
pub mod events;
pub mod notifications;
pub mod partners;
pub mod recoveries;
pub mod users;
