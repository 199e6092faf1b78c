//! # Downstream Boundaries
//!
//! Interfaces to the external execution, proving and verification backends.
//! This crate implements none of them; it only produces the input trees they
//! consume and tracks which of their results are still current.
//!
//! ## Staleness
//!
//! Backends may run for a long time. Each request is issued with a [`Ticket`]
//! stamped with the session's input revision. When the result comes back, the
//! session drops it if the inputs or the selected program changed in the
//! meantime.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::registry::ProgramArtifact;
use crate::value::InputMap;

/// Error from the execution backend. Surfaced to the user, never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    /// A constraint or assertion in the program failed for these inputs.
    #[error("unsatisfied constraint: {0}")]
    Unsatisfied(String),
    /// The backend could not run the program at all.
    #[error("execution failed: {0}")]
    Backend(String),
}

/// Error during proof generation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProofError {
    #[error("witness error: {0}")]
    Witness(String),
    #[error("prover error: {0}")]
    Prover(String),
}

/// Error during proof verification (distinct from a proof that verifies false).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("malformed proof: {0}")]
    Malformed(String),
    #[error("verifier error: {0}")]
    Backend(String),
}

/// Result of running a program on a complete input map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    /// Opaque solved witness.
    pub witness: Vec<u8>,
    /// Decoded program return value, if the program returns one.
    pub return_value: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofData {
    pub proof: Vec<u8>,
    /// Public inputs in the order the verifier expects them.
    pub public_inputs: Vec<String>,
}

pub trait Executor {
    fn execute(&self, program: &ProgramArtifact, inputs: &InputMap) -> Result<Execution, ExecutionError>;
}

pub trait Prover {
    fn prove(&self, program: &ProgramArtifact, witness: &[u8]) -> Result<ProofData, ProofError>;
}

pub trait Verifier {
    /// `Ok(false)` means the proof was checked and rejected.
    fn verify(&self, program: &ProgramArtifact, proof: &ProofData) -> Result<bool, VerifyError>;
}

/// Input revision a request was issued against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    pub(crate) revision: u64,
}

/// Everything derived from the current inputs. Cleared as a whole whenever
/// the inputs or the program change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Artifacts {
    pub execution: Option<Execution>,
    pub proof: Option<ProofData>,
    pub verified: Option<bool>,
}

impl Artifacts {
    pub fn clear(&mut self) { *self = Self::default(); }

    pub fn is_empty(&self) -> bool {
        self.execution.is_none() && self.proof.is_none() && self.verified.is_none()
    }

    pub fn witness(&self) -> Option<&[u8]> {
        self.execution.as_ref().map(|e| e.witness.as_slice())
    }
}
