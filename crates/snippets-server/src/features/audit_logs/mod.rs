//! Read-only access to the audit trail

pub mod queries;
pub mod routes;

pub use queries::{ListAuditLogsError, ListAuditLogsQuery, ListAuditLogsResponse};
pub use routes::audit_logs_routes;
