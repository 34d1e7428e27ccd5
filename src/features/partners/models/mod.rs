mod partner;

pub use partner::{CreatePartner, NeedLevel, Partner, PartnerSnapshot, PartnerStats};
