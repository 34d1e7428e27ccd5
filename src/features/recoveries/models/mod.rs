mod recovery_report;

pub use recovery_report::{CreateRecoveryReport, RecoveryReport, RecoveryStatus};
