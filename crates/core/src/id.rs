//! Identifiers for sprints and progress records.

use serde::{Deserialize, Serialize};

/// Length of a generated progress record identifier.
pub const RECORD_ID_LEN: u16 = 25;

/// Opaque reference to a sprint, owned by the team/sprint store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SprintId(String);

impl SprintId {
    /// Wrap a raw sprint reference.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SprintId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for SprintId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SprintId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Unique identifier for a progress record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressRecordId(String);

impl ProgressRecordId {
    /// Wrap an already generated identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProgressRecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Source of fresh progress record identifiers.
///
/// Passed explicitly to whatever persists records; there is no
/// process-wide generator.
pub trait IdGenerator: Send + Sync {
    /// Produce a new, collision-resistant identifier.
    fn generate(&self) -> ProgressRecordId;
}

/// CUID2 generator producing 25-character identifiers.
pub struct CuidGenerator {
    constructor: cuid2::CuidConstructor,
}

impl CuidGenerator {
    /// Create a generator for identifiers of the given length.
    pub fn with_length(length: u16) -> Self {
        Self {
            constructor: cuid2::CuidConstructor::new().with_length(length),
        }
    }
}

impl Default for CuidGenerator {
    fn default() -> Self {
        Self::with_length(RECORD_ID_LEN)
    }
}

impl IdGenerator for CuidGenerator {
    fn generate(&self) -> ProgressRecordId {
        ProgressRecordId(self.constructor.create_id())
    }
}
