//! Error types for the value engine.
//!
//! User mistakes are [`InputError`]s: localized to one path, recoverable by
//! editing again, and never fatal. [`EngineError`] covers misuse of the engine
//! itself (a path that does not address a node) and pipeline gating.
use thiserror::Error;

use crate::pipeline::{ExecutionError, ProofError, VerifyError};
use crate::value::Path;

/// A rejected input, localized to the node that failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("at {}: {kind}", .path.describe())]
pub struct InputError {
    pub path: Path,
    pub kind: InputErrorKind,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputErrorKind {
    /// Raw text did not decode, or decoded to the wrong kind of literal.
    #[error("expected {expected}, found {found}")]
    Parse { expected: String, found: String },

    /// Array, tuple or string size differs from the declaration.
    #[error("expected {expected} elements, found {found}")]
    LengthMismatch { expected: usize, found: usize },

    /// Struct literal keys differ from the declared field names.
    #[error("field set mismatch (missing: [{}], unexpected: [{}])", .missing.join(", "), .unexpected.join(", "))]
    CardinalityMismatch { missing: Vec<String>, unexpected: Vec<String> },

    /// Negative literal for an unsigned integer.
    #[error("unsigned integer cannot be negative: {value}")]
    SignMismatch { value: String },
}

impl InputError {
    pub fn new(path: Path, kind: InputErrorKind) -> Self {
        Self { path, kind }
    }

    /// Re-anchor an error reported relative to `base`.
    pub fn rebase(self, base: &Path) -> Self {
        Self { path: base.join(&self.path), kind: self.kind }
    }
}

#[derive(Error, Debug)]
pub enum EngineError {
    /// The tree or path disagrees with the descriptor. Indicates a bug in the
    /// caller, not bad user input.
    #[error("shape mismatch at {}: {reason}", .path.describe())]
    ShapeMismatch { path: Path, reason: String },

    #[error("registry contains no programs")]
    EmptyRegistry,

    #[error("execution is disabled while {0} input(s) are invalid")]
    ExecutionGated(usize),

    #[error("no witness available; execute the program first")]
    MissingWitness,

    #[error("no proof available; prove the witness first")]
    MissingProof,

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Proof(#[from] ProofError),

    #[error(transparent)]
    Verify(#[from] VerifyError),
}

impl EngineError {
    pub fn shape(path: &Path, reason: impl Into<String>) -> Self {
        Self::ShapeMismatch { path: path.clone(), reason: reason.into() }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid path `{input}`: {reason}")]
pub struct PathParseError {
    pub input: String,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_path() {
        let err = InputError::new(
            "point.x".parse().unwrap(),
            InputErrorKind::SignMismatch { value: "-1".into() },
        );
        assert_eq!(err.to_string(), "at point.x: unsigned integer cannot be negative: -1");

        let err = InputError::new(Path::root(), InputErrorKind::CardinalityMismatch {
            missing: vec!["a".into()],
            unexpected: vec!["b".into(), "c".into()],
        });
        assert_eq!(err.to_string(), "at <root>: field set mismatch (missing: [a], unexpected: [b, c])");
    }

    #[test]
    fn rebase_prefixes_the_edit_path() {
        let err = InputError::new(Path::from_iter([1usize]), InputErrorKind::LengthMismatch { expected: 2, found: 3 });
        let err = err.rebase(&"grid".parse().unwrap());
        assert_eq!(err.path.to_string(), "grid[1]");
    }
}
