mod partner_service;

pub use partner_service::PartnerService;
