//! Observer of entity lifecycle events that writes the audit trail

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::models::{AuditAction, AuditLogEntry, EntityKind, NewAuditEntry};
use crate::context::UserRef;
use crate::db::AuditSink;

/// What to do with a tracked event that has no acting user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingActorPolicy {
    /// Write nothing
    #[default]
    Skip,
    /// Write an entry with a null user
    Record,
}

impl std::str::FromStr for MissingActorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "record" => Ok(Self::Record),
            other => Err(format!(
                "Unknown missing-actor policy '{}'; expected 'skip' or 'record'",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditConfig {
    pub tracked: HashSet<EntityKind>,
    pub missing_actor: MissingActorPolicy,
}

impl AuditConfig {
    pub fn new(tracked: impl IntoIterator<Item = EntityKind>) -> Self {
        Self {
            tracked: tracked.into_iter().collect(),
            missing_actor: MissingActorPolicy::default(),
        }
    }

    pub fn with_missing_actor(mut self, policy: MissingActorPolicy) -> Self {
        self.missing_actor = policy;
        self
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self::new(EntityKind::ALL)
    }
}

/// Result of handing one event to the recorder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditOutcome {
    Recorded(AuditLogEntry),
    Untracked,
    SkippedNoActor,
    /// The sink rejected the write; already logged
    Failed,
}

impl AuditOutcome {
    pub fn entry(&self) -> Option<&AuditLogEntry> {
        match self {
            Self::Recorded(entry) => Some(entry),
            _ => None,
        }
    }
}

/// Writes one audit entry per create/update/delete of a tracked entity.
///
/// Sink failures never propagate: they are logged at `error` level and
/// reported as [`AuditOutcome::Failed`], leaving the triggering mutation
/// committed.
#[derive(Clone)]
pub struct AuditRecorder {
    sink: Arc<dyn AuditSink>,
    config: AuditConfig,
}

impl AuditRecorder {
    pub fn new(sink: Arc<dyn AuditSink>, config: AuditConfig) -> Self {
        Self { sink, config }
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    pub fn tracks(&self, kind: EntityKind) -> bool {
        self.config.tracked.contains(&kind)
    }

    /// Handle a committed insert (`created`) or update
    pub async fn on_entity_persisted(
        &self,
        kind: EntityKind,
        id: i64,
        created: bool,
        actor: Option<&UserRef>,
    ) -> AuditOutcome {
        let action = if created {
            AuditAction::Create
        } else {
            AuditAction::Update
        };
        self.record(kind, id, action, actor).await
    }

    /// Handle a committed physical delete
    pub async fn on_entity_removed(
        &self,
        kind: EntityKind,
        id: i64,
        actor: Option<&UserRef>,
    ) -> AuditOutcome {
        self.record(kind, id, AuditAction::Delete, actor).await
    }

    async fn record(
        &self,
        kind: EntityKind,
        object_id: i64,
        action: AuditAction,
        actor: Option<&UserRef>,
    ) -> AuditOutcome {
        if !self.tracks(kind) {
            return AuditOutcome::Untracked;
        }

        if actor.is_none() && self.config.missing_actor == MissingActorPolicy::Skip {
            debug!(model_name = %kind, object_id, %action, "No acting user, audit entry skipped");
            return AuditOutcome::SkippedNoActor;
        }

        let entry = NewAuditEntry {
            kind,
            object_id,
            action,
            user_id: actor.map(|u| u.id),
        };

        match self.sink.append(entry).await {
            Ok(recorded) => AuditOutcome::Recorded(recorded),
            Err(e) => {
                error!(
                    model_name = %kind,
                    object_id,
                    %action,
                    error = %e,
                    "Failed to write audit log entry"
                );
                AuditOutcome::Failed
            },
        }
    }
}
