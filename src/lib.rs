//! Schema-driven input trees for compiled circuit programs.
//!
//! A program's ABI ([`ir::AbiType`]) drives everything: default trees are
//! synthesized from it ([`synth`]), user-typed text is checked against it
//! ([`validate`]) and committed by copy-on-write replacement ([`mutate`]).
//! [`session::Session`] ties these together with per-path error tracking and
//! the execute/prove/verify boundaries.
pub mod cli;
pub mod error;
pub mod error_set;
pub mod ir;
pub mod jq_exec;
pub mod literal;
pub mod mutate;
pub mod path_de;
pub mod pipeline;
pub mod registry;
pub mod session;
pub mod synth;
pub mod validate;
pub mod value;

pub use error::{EngineError, InputError, InputErrorKind};
pub use error_set::ErrorSet;
pub use ir::{AbiParameter, AbiType};
pub use registry::ProgramRegistry;
pub use session::{EditOutcome, Session};
pub use value::{InputMap, InputValue, Path, PathSegment};
