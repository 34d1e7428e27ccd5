pub mod assignment;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use assignment::select_partner;
pub use services::PartnerService;
