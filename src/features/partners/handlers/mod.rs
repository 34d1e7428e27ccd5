mod partner_handler;

pub use partner_handler::*;
