//! Editing session for one selected program.
//!
//! Ties the engine together: the registry supplies descriptors, the
//! synthesizer builds the tree, edits go through the validator and, when
//! accepted, through the mutator. Invalid paths are tracked in an
//! [`ErrorSet`] whose flag gates execution. Any committed change bumps the
//! input revision and clears everything derived from the old inputs.
use tracing::{debug, info, warn};

use crate::error::{EngineError, InputError};
use crate::error_set::ErrorSet;
use crate::ir::{self, AbiParameter};
use crate::mutate::mutate_map;
use crate::pipeline::{
    Artifacts, Execution, ExecutionError, Executor, ProofData, ProofError, Prover, Ticket, Verifier,
    VerifyError,
};
use crate::registry::{ProgramArtifact, ProgramRegistry};
use crate::synth::fill_input_map;
use crate::validate;
use crate::value::{self, InputMap, InputValue, Path};

#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome {
    /// Value accepted and applied; the path is clean again.
    Committed,
    /// Value refused; the previous value stays and the path is marked invalid.
    Rejected(InputError),
}

#[derive(Debug)]
pub struct Session<'r> {
    registry: &'r ProgramRegistry,
    name: String,
    program: &'r ProgramArtifact,
    inputs: InputMap,
    errors: ErrorSet,
    artifacts: Artifacts,
    revision: u64,
}

impl<'r> Session<'r> {
    /// Start editing `program`, or the first registered program if that name
    /// is unknown.
    pub fn open(registry: &'r ProgramRegistry, program: &str) -> Result<Self, EngineError> {
        let (name, artifact) = registry.resolve(program).ok_or(EngineError::EmptyRegistry)?;
        if name != program {
            warn!(requested = program, selected = name, "unknown program, using first registered");
        }
        info!(program = name, parameters = artifact.parameters().len(), "session opened");
        Ok(Self {
            registry,
            name: name.to_string(),
            program: artifact,
            inputs: fill_input_map(artifact.parameters(), None),
            errors: ErrorSet::new(),
            artifacts: Artifacts::default(),
            revision: 0,
        })
    }

    /// Switch programs. Compatible values are carried over, error state is
    /// dropped. Returns the name actually selected.
    pub fn select(&mut self, program: &str) -> Result<&str, EngineError> {
        let (name, artifact) = self.registry.resolve(program).ok_or(EngineError::EmptyRegistry)?;
        info!(from = %self.name, to = name, "program selected");
        self.inputs = fill_input_map(artifact.parameters(), Some(&self.inputs));
        self.name = name.to_string();
        self.program = artifact;
        self.errors.reset();
        self.touch();
        Ok(self.name.as_str())
    }

    /// Replace the tree with one seeded from `previous` (e.g. a saved inputs
    /// file). Incompatible positions fall back to defaults.
    pub fn seed(&mut self, previous: &InputMap) {
        self.inputs = fill_input_map(self.parameters(), Some(previous));
        self.errors.reset();
        self.touch();
    }

    pub fn program_name(&self) -> &str { &self.name }
    pub fn program(&self) -> &'r ProgramArtifact { self.program }
    pub fn parameters(&self) -> &'r [AbiParameter] { self.program.parameters() }
    pub fn inputs(&self) -> &InputMap { &self.inputs }
    pub fn errors(&self) -> &ErrorSet { &self.errors }
    pub fn artifacts(&self) -> &Artifacts { &self.artifacts }

    /// The execute gate: open iff no path is currently invalid.
    pub fn can_execute(&self) -> bool { !self.errors.any_invalid() }

    // ————————————————————————————————————————————————————————————————————————
    // EDITING
    // ————————————————————————————————————————————————————————————————————————

    /// Apply the text a user typed for the node at `path`.
    pub fn edit(&mut self, path: &Path, raw: &str) -> Result<EditOutcome, EngineError> {
        let (ty, existing) = self.resolve(path)?;
        let checked = validate::check(ty, raw);
        debug!(%path, %ty, existing = ?existing, accepted = checked.is_ok(), "edit");
        self.settle(path, checked)
    }

    /// Like [`Session::edit`] for an already-typed value.
    pub fn edit_value(&mut self, path: &Path, value: &InputValue) -> Result<EditOutcome, EngineError> {
        let (ty, _) = self.resolve(path)?;
        let checked = validate::typecheck(ty, &value.into()).map_err(|mut errors| errors.remove(0));
        self.settle(path, checked)
    }

    fn resolve(&self, path: &Path) -> Result<(&'r ir::AbiType, Option<&InputValue>), EngineError> {
        let ty = ir::type_at(self.parameters(), path)
            .ok_or_else(|| EngineError::shape(path, "path does not address a declared input"))?;
        let existing = value::lookup(&self.inputs, path);
        if existing.is_none() {
            return Err(EngineError::shape(path, "input tree has no node here"));
        }
        Ok((ty, existing))
    }

    fn settle(&mut self, path: &Path, checked: Result<InputValue, InputError>) -> Result<EditOutcome, EngineError> {
        match checked {
            Ok(value) => {
                self.inputs = mutate_map(&self.inputs, path, value)?;
                // a replaced subtree has no stale child errors
                self.errors.clear_subtree(path);
                self.touch();
                Ok(EditOutcome::Committed)
            }
            Err(error) => {
                let error = error.rebase(path);
                self.errors.register(path, true);
                warn!(%error, invalid = self.errors.invalid_count(), "edit rejected");
                Ok(EditOutcome::Rejected(error))
            }
        }
    }

    fn touch(&mut self) {
        self.revision += 1;
        if !self.artifacts.is_empty() {
            debug!(revision = self.revision, "inputs changed, derived artifacts cleared");
        }
        self.artifacts.clear();
    }

    // ————————————————————————————————————————————————————————————————————————
    // DOWNSTREAM
    // ————————————————————————————————————————————————————————————————————————

    pub fn ticket(&self) -> Ticket { Ticket { revision: self.revision } }

    pub fn is_current(&self, ticket: Ticket) -> bool { ticket.revision == self.revision }

    /// Inputs for the execution backend. Refused while the gate is closed.
    pub fn execution_request(&self) -> Result<(Ticket, &InputMap), EngineError> {
        if !self.can_execute() {
            return Err(EngineError::ExecutionGated(self.errors.invalid_count()));
        }
        Ok((self.ticket(), &self.inputs))
    }

    /// Record an execution result. `Ok(false)` means the result was stale and
    /// discarded.
    pub fn complete_execution(
        &mut self,
        ticket: Ticket,
        result: Result<Execution, ExecutionError>,
    ) -> Result<bool, EngineError> {
        if !self.is_current(ticket) {
            warn!(stale = ticket.revision, current = self.revision, "discarding stale execution result");
            return Ok(false);
        }
        let execution = result?;
        self.artifacts = Artifacts { execution: Some(execution), ..Artifacts::default() };
        Ok(true)
    }

    pub fn execute(&mut self, executor: &dyn Executor) -> Result<&Execution, EngineError> {
        let (ticket, inputs) = self.execution_request()?;
        let result = executor.execute(self.program, inputs);
        self.complete_execution(ticket, result)?;
        self.artifacts.execution.as_ref().ok_or(EngineError::MissingWitness)
    }

    pub fn proof_request(&self) -> Result<(Ticket, &[u8]), EngineError> {
        let witness = self.artifacts.witness().ok_or(EngineError::MissingWitness)?;
        Ok((self.ticket(), witness))
    }

    pub fn complete_proof(&mut self, ticket: Ticket, result: Result<ProofData, ProofError>) -> Result<bool, EngineError> {
        if !self.is_current(ticket) {
            warn!(stale = ticket.revision, current = self.revision, "discarding stale proof");
            return Ok(false);
        }
        self.artifacts.proof = Some(result?);
        self.artifacts.verified = None;
        Ok(true)
    }

    pub fn prove(&mut self, prover: &dyn Prover) -> Result<&ProofData, EngineError> {
        let (ticket, witness) = self.proof_request()?;
        let result = prover.prove(self.program, witness);
        self.complete_proof(ticket, result)?;
        self.artifacts.proof.as_ref().ok_or(EngineError::MissingProof)
    }

    pub fn verification_request(&self) -> Result<(Ticket, &ProofData), EngineError> {
        let proof = self.artifacts.proof.as_ref().ok_or(EngineError::MissingProof)?;
        Ok((self.ticket(), proof))
    }

    pub fn complete_verification(&mut self, ticket: Ticket, result: Result<bool, VerifyError>) -> Result<bool, EngineError> {
        if !self.is_current(ticket) {
            warn!(stale = ticket.revision, current = self.revision, "discarding stale verification");
            return Ok(false);
        }
        self.artifacts.verified = Some(result?);
        Ok(true)
    }

    /// Verify the current proof and return the verdict.
    pub fn verify(&mut self, verifier: &dyn Verifier) -> Result<bool, EngineError> {
        let (ticket, proof) = self.verification_request()?;
        let result = verifier.verify(self.program, proof);
        self.complete_verification(ticket, result)?;
        self.artifacts.verified.ok_or(EngineError::MissingProof)
    }
}
