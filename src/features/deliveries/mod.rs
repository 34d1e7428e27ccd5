pub mod dtos;
pub mod handlers;
pub mod lifecycle;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

pub use services::DeliveryService;
pub use store::{DeliveryStore, PgDeliveryStore};
