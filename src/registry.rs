//! Compiled-program registry.
//!
//! The registry is loaded once and handed to whoever needs it; nothing here is
//! global. Two on-disk layouts are supported:
//!
//! - one combined document, `{ "<program>": <artifact>, ... }`;
//! - one compiled artifact per file, named after the file stem.
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::ir::AbiParameter;
use crate::path_de::{self, PathDeError};

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("failed to read {}: {source}", .path.display())]
    Io { path: PathBuf, source: std::io::Error },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse { path: PathBuf, source: PathDeError },

    #[error("invalid glob pattern `{pattern}`: {source}")]
    Pattern { pattern: String, source: glob::PatternError },

    #[error("glob pattern matched no files: {0}")]
    NoMatches(String),

    #[error("program `{0}` is defined more than once")]
    Duplicate(String),
}

/// Compiler output for one program. Only the ABI is interpreted; the rest is
/// carried for the downstream execution and proving boundaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramArtifact {
    #[serde(default)]
    pub noir_version: Option<String>,
    #[serde(default)]
    pub hash: Option<serde_json::Value>,
    pub abi: ProgramAbi,
    #[serde(default)]
    pub bytecode: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramAbi {
    pub parameters: Vec<AbiParameter>,
    #[serde(default)]
    pub return_type: Option<serde_json::Value>,
}

impl ProgramArtifact {
    pub fn parameters(&self) -> &[AbiParameter] { &self.abi.parameters }

    /// Hash as printable text, whether the compiler emitted a number or a string.
    pub fn hash_text(&self) -> Option<String> {
        self.hash.as_ref().map(|h| match h {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProgramRegistry {
    programs: IndexMap<String, ProgramArtifact>,
}

impl ProgramRegistry {
    pub fn from_programs<I, S>(programs: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = (S, ProgramArtifact)>,
        S: Into<String>,
    {
        let mut out = IndexMap::new();
        for (name, artifact) in programs {
            let name = name.into();
            if out.contains_key(&name) {
                return Err(RegistryError::Duplicate(name));
            }
            out.insert(name, artifact);
        }
        Ok(Self { programs: out })
    }

    /// Parse a combined registry document.
    pub fn from_json_str(src: &str) -> Result<Self, PathDeError> {
        let programs = path_de::from_str_with_path::<IndexMap<String, ProgramArtifact>>(src)?;
        Ok(Self { programs })
    }

    /// Load a combined registry document from disk.
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let bytes = std::fs::read(path).map_err(|source| RegistryError::Io { path: path.to_path_buf(), source })?;
        let programs = path_de::from_slice_with_path::<IndexMap<String, ProgramArtifact>>(&bytes)
            .map_err(|source| RegistryError::Parse { path: path.to_path_buf(), source })?;
        info!(path = %path.display(), programs = programs.len(), "loaded program registry");
        Ok(Self { programs })
    }

    /// Load one artifact per file; literal paths and glob patterns may be mixed.
    pub fn load_artifacts<I>(patterns: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut programs = Vec::new();
        for path in resolve_file_path_patterns(patterns)? {
            let bytes = std::fs::read(&path).map_err(|source| RegistryError::Io { path: path.clone(), source })?;
            let artifact = path_de::from_slice_with_path::<ProgramArtifact>(&bytes)
                .map_err(|source| RegistryError::Parse { path: path.clone(), source })?;
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.to_string_lossy().into_owned());
            programs.push((name, artifact));
        }
        let registry = Self::from_programs(programs)?;
        info!(programs = registry.len(), "loaded program artifacts");
        Ok(registry)
    }

    pub fn len(&self) -> usize { self.programs.len() }
    pub fn is_empty(&self) -> bool { self.programs.is_empty() }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.programs.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ProgramArtifact)> {
        self.programs.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get(&self, name: &str) -> Option<&ProgramArtifact> {
        self.programs.get(name)
    }

    pub fn parameters(&self, name: &str) -> Option<&[AbiParameter]> {
        self.get(name).map(ProgramArtifact::parameters)
    }

    /// The named program, or the first registered one when the name is
    /// unknown. `None` only for an empty registry.
    pub fn resolve(&self, name: &str) -> Option<(&str, &ProgramArtifact)> {
        self.programs
            .get_key_value(name)
            .or_else(|| self.programs.first())
            .map(|(k, v)| (k.as_str(), v))
    }
}

/// Minimal glob detection for the `glob` crate syntax.
pub fn has_glob_chars(s: &str) -> bool {
    s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
}

/// Expand literal paths and glob patterns. A glob that matches nothing is an
/// error; a literal path is passed through unchecked.
pub fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>, RegistryError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut out = Vec::<PathBuf>::new();
    for raw in patterns {
        let pattern = raw.as_ref();
        if !has_glob_chars(pattern) {
            out.push(PathBuf::from(pattern));
            continue;
        }
        let entries = glob::glob(pattern).map_err(|source| RegistryError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;
        let before = out.len();
        // unreadable entries surface later as Io errors on read
        out.extend(entries.filter_map(Result::ok));
        if out.len() == before {
            return Err(RegistryError::NoMatches(pattern.to_string()));
        }
    }
    Ok(out)
}
