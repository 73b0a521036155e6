use super::{FieldIndex, Hash};
use crate::config::ConfigError;
use thiserror::Error;

/// A field value violates a structural constraint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("vector length mismatch: expected {expected}, got {actual}")]
    VectorLength { expected: usize, actual: usize },

    #[error("list too long: limit {limit}, got {actual}")]
    ListTooLong { limit: usize, actual: usize },

    #[error("bitlist too long: limit {limit}, got {actual}")]
    BitlistTooLong { limit: usize, actual: usize },

    #[error("justification bits set outside the low 4 bits: {bits:#010b}")]
    InvalidJustificationBits { bits: u8 },
}

/// Failure of a field hasher.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HashError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("merkle depth exceeded: limit {limit} needs more than {max} levels")]
    DepthExceeded { limit: usize, max: usize },
}

#[derive(Debug, Error)]
pub enum StateError {
    #[error("Invalid value for field {field}: {source}")]
    Validation {
        field: FieldIndex,
        #[source]
        source: ValidationError,
    },

    #[error("Hash computation failed for field {field}: {source}")]
    HashComputation {
        field: FieldIndex,
        #[source]
        source: HashError,
    },

    #[error("Leaf index out of range: {index} (leaf count {leaf_count})")]
    LeafIndexOutOfRange { index: usize, leaf_count: usize },

    #[error("State root mismatch: expected {expected:?}, got {actual:?}")]
    StateRootMismatch { expected: Hash, actual: Hash },

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

impl StateError {
    /// Attach the failing field to a hasher error.
    ///
    /// Validation failures stay distinguishable from hasher failures.
    pub fn from_hash_error(field: FieldIndex, err: HashError) -> Self {
        match err {
            HashError::Validation(source) => StateError::Validation { field, source },
            source => StateError::HashComputation { field, source },
        }
    }

    /// The field a mutation failed on, if any.
    pub fn field(&self) -> Option<FieldIndex> {
        match self {
            StateError::Validation { field, .. } | StateError::HashComputation { field, .. } => {
                Some(*field)
            }
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, StateError::Validation { .. })
    }
}
