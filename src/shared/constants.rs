/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

/// Newest notifications returned per listing
pub const NOTIFICATION_LIST_LIMIT: i64 = 50;

// =============================================================================
// NOTIFICATION KINDS
// =============================================================================

/// Sent to every active driver when a report with food is filed
pub const NOTIFICATION_KIND_NEW_RECOVERY: &str = "new_recovery";
