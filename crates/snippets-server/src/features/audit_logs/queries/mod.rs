pub mod list;

pub use list::{ListAuditLogsError, ListAuditLogsQuery, ListAuditLogsResponse};
