//! Feature slices, each with its own commands, queries and routes

pub mod audit_logs;
pub mod shared;
pub mod snippets;
pub mod users;
