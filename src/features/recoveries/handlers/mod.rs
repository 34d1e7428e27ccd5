mod recovery_handler;

pub use recovery_handler::*;
