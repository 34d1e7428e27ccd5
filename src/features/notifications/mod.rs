pub mod dispatcher;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use dispatcher::{DriverNotice, NotificationDispatcher, PgNotificationDispatcher};
pub use services::NotificationService;
