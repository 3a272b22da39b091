//! Audit data models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use snippets_common::types::{AuditAction, EntityKind};

// ============================================================================
// Audit Query Constants
// ============================================================================

/// Default number of audit entries returned per query
pub const DEFAULT_AUDIT_QUERY_LIMIT: i64 = 20;

/// Maximum number of audit entries returned in a single query
pub const MAX_AUDIT_QUERY_LIMIT: i64 = 100;

/// Immutable record of one create/update/delete on a tracked entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: i64,
    /// Entity kind name, e.g. `"User"`
    pub model_name: String,
    pub object_id: i64,
    pub action: AuditAction,
    /// Acting user id; `None` for system operations
    pub user: Option<i64>,
    pub timestamp: DateTime<Utc>,
}

/// Input for appending an audit entry; id and timestamp are server-assigned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAuditEntry {
    pub kind: EntityKind,
    pub object_id: i64,
    pub action: AuditAction,
    pub user_id: Option<i64>,
}

/// Sort order for audit listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuditOrdering {
    /// `-timestamp`
    #[default]
    NewestFirst,
    /// `timestamp`
    OldestFirst,
}

impl AuditOrdering {
    pub fn as_param(&self) -> &'static str {
        match self {
            Self::NewestFirst => "-timestamp",
            Self::OldestFirst => "timestamp",
        }
    }
}

impl std::str::FromStr for AuditOrdering {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "-timestamp" => Ok(Self::NewestFirst),
            "timestamp" => Ok(Self::OldestFirst),
            other => Err(format!(
                "Unsupported ordering '{}'; use 'timestamp' or '-timestamp'",
                other
            )),
        }
    }
}

/// Filters for audit listings
#[derive(Debug, Clone)]
pub struct AuditQuery {
    pub model_name: Option<EntityKind>,
    pub action: Option<AuditAction>,
    pub object_id: Option<i64>,
    pub user_id: Option<i64>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub ordering: AuditOrdering,
    pub limit: i64,
    pub offset: i64,
}

impl Default for AuditQuery {
    fn default() -> Self {
        Self {
            model_name: None,
            action: None,
            object_id: None,
            user_id: None,
            since: None,
            until: None,
            ordering: AuditOrdering::default(),
            limit: DEFAULT_AUDIT_QUERY_LIMIT,
            offset: 0,
        }
    }
}

impl AuditQuery {
    /// Limit clamped to `1..=MAX_AUDIT_QUERY_LIMIT`
    pub fn effective_limit(&self) -> i64 {
        self.limit.clamp(1, MAX_AUDIT_QUERY_LIMIT)
    }

    pub fn effective_offset(&self) -> i64 {
        self.offset.max(0)
    }

    /// Whether `entry` passes every filter set on this query
    pub fn matches(&self, entry: &AuditLogEntry) -> bool {
        self.model_name.map_or(true, |k| entry.model_name == k.as_str())
            && self.action.map_or(true, |a| entry.action == a)
            && self.object_id.map_or(true, |id| entry.object_id == id)
            && self.user_id.map_or(true, |id| entry.user == Some(id))
            && self.since.map_or(true, |t| entry.timestamp >= t)
            && self.until.map_or(true, |t| entry.timestamp <= t)
    }
}
