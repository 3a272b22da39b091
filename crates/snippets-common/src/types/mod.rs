//! Domain tags shared across the snippets workspace

use serde::{Deserialize, Serialize};

use crate::error::SnippetsError;

/// Type tag of an entity whose lifecycle can be audited.
///
/// The rendered name (`"User"`, `"Snippet"`) is what lands in the
/// `model_name` column of the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    User,
    Snippet,
}

impl EntityKind {
    /// Every kind known to the server, in a stable order
    pub const ALL: [EntityKind; 2] = [EntityKind::User, EntityKind::Snippet];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Snippet => "Snippet",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntityKind {
    type Err = SnippetsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "snippet" => Ok(Self::Snippet),
            other => Err(SnippetsError::UnknownEntityKind(other.to_string())),
        }
    }
}

/// Kind of mutation recorded in the audit trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AuditAction {
    type Err = SnippetsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CREATE" => Ok(Self::Create),
            "UPDATE" => Ok(Self::Update),
            "DELETE" => Ok(Self::Delete),
            other => Err(SnippetsError::UnknownAuditAction(other.to_string())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_kind_parse_is_case_insensitive() {
        assert_eq!("User".parse::<EntityKind>().unwrap(), EntityKind::User);
        assert_eq!(" snippet ".parse::<EntityKind>().unwrap(), EntityKind::Snippet);
        assert!(matches!(
            "AuditLog".parse::<EntityKind>(),
            Err(SnippetsError::UnknownEntityKind(_))
        ));
    }

    #[test]
    fn test_audit_action_wire_format() {
        assert_eq!(serde_json::to_string(&AuditAction::Delete).unwrap(), r#""DELETE""#);
        let action: AuditAction = serde_json::from_str(r#""UPDATE""#).unwrap();
        assert_eq!(action, AuditAction::Update);
        assert_eq!("create".parse::<AuditAction>().unwrap(), AuditAction::Create);
        assert!("archive".parse::<AuditAction>().is_err());
    }
}
