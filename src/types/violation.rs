use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Kind of a [`SecurityViolation`].
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// A contract wrote to storage before any address authorized it.
    #[display("unauthorized_state_modification")]
    UnauthorizedStateModification,
}

/// Severity of a [`SecurityViolation`].
#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational.
    #[display("low")]
    Low,
    /// Worth a look.
    #[display("medium")]
    Medium,
    /// Likely exploitable.
    #[display("high")]
    High,
}

/// A security boundary violation found in the events of a simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityViolation {
    /// What was violated.
    #[serde(rename = "type")]
    pub kind: ViolationKind,
    /// How bad it is.
    pub severity: Severity,
    /// Human-readable description.
    pub description: String,
    /// The offending contract.
    pub contract: String,
    /// Additional structured details.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub details: serde_json::Map<String, serde_json::Value>,
}
