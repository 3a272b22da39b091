//! CQRS markers
//!
//! Commands mutate state through the [`EntityStore`](crate::store::EntityStore)
//! and are the only operations that can produce audit entries. Queries are
//! read-only. Both also implement `mediator::Request` for their result type.

/// Write operation
pub trait Command {}

/// Read-only operation
pub trait Query {}
