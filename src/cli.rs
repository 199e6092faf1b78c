//! CLI: programs | describe | template | check | set
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;
use tracing::info;

use crate::error::InputError;
use crate::ir::{AbiParameter, AbiType};
use crate::path_de;
use crate::registry::{resolve_file_path_patterns, ProgramArtifact, ProgramRegistry};
use crate::session::{EditOutcome, Session};
use crate::validate::check_inputs;
use crate::value::{InputMap, Path};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// build, edit and check input trees for compiled circuit programs
#[derive(Parser, Debug)]
#[command(name = "circuit-inputs", version)]
pub struct CommandLineInterface {
    #[command(flatten)]
    registry: RegistrySettings,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// list registered programs
    Programs,
    /// print each parameter of a program with its type and visibility
    Describe(DescribeOut),
    /// print the default input map, optionally seeded from a previous one
    Template(TemplateOut),
    /// validate input documents against a program
    Check(CheckOut),
    /// apply one edit to an input map
    Set(SetOut),
}

#[derive(Args, Debug, Clone)]
struct RegistrySettings {
    /// combined registry document (`{ "<program>": <artifact>, ... }`)
    #[arg(long, global = true, env = "CIRCUIT_INPUTS_REGISTRY")]
    registry: Option<PathBuf>,

    /// compiled artifacts, one program per file. Literal paths or quoted glob patterns
    #[arg(long, global = true, num_args = 1..)]
    artifacts: Vec<String>,
}

#[derive(Args, Debug, Clone)]
struct ProgramSelector {
    /// program name (first registered program if omitted)
    #[arg(long, short)]
    program: Option<String>,
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// JSON Pointer to select a subnode in each document (e.g. /cases/0)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document. Every output is checked separately
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct DescribeOut {
    #[command(flatten)]
    selector: ProgramSelector,

    /// also list every nested editable path
    #[arg(long)]
    leaves: bool,
}

#[derive(clap::Parser, Debug)]
struct TemplateOut {
    #[command(flatten)]
    selector: ProgramSelector,

    /// previous inputs file; compatible values are carried over
    #[arg(long)]
    previous: Option<PathBuf>,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct CheckOut {
    #[command(flatten)]
    selector: ProgramSelector,

    #[command(flatten)]
    input_settings: InputSettings,
}

#[derive(clap::Parser, Debug)]
struct SetOut {
    #[command(flatten)]
    selector: ProgramSelector,

    /// inputs file to edit (defaults are used if omitted)
    #[arg(long, short)]
    input: Option<PathBuf>,

    /// node to edit, e.g. `s.array[1]` or `pair.0`
    #[arg(long)]
    path: Path,

    /// raw text as typed by a user; JSON for numbers and composites
    #[arg(long, allow_hyphen_values = true)]
    value: String,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl RegistrySettings {
    fn load(&self) -> Result<ProgramRegistry> {
        let registry = if !self.artifacts.is_empty() {
            ProgramRegistry::load_artifacts(&self.artifacts)?
        } else if let Some(path) = self.registry.as_ref() {
            ProgramRegistry::load(path)?
        } else {
            bail!("no programs given: pass --registry, --artifacts or set CIRCUIT_INPUTS_REGISTRY");
        };
        if registry.is_empty() {
            bail!("registry contains no programs");
        }
        Ok(registry)
    }
}

impl ProgramSelector {
    fn pick<'r>(&self, registry: &'r ProgramRegistry) -> Result<(&'r str, &'r ProgramArtifact)> {
        match self.program.as_deref() {
            Some(name) => registry.iter().find(|(n, _)| *n == name).with_context(|| {
                let known: Vec<&str> = registry.names().collect();
                format!("unknown program `{name}` (known: {})", known.join(", "))
            }),
            None => registry.iter().next().context("registry contains no programs"),
        }
    }
}

impl InputSettings {
    /// Every document to check, labelled by source file (and output index
    /// when a jq filter yields several).
    fn load_documents(&self) -> Result<Vec<(String, serde_json::Value)>> {
        let source_paths = resolve_file_path_patterns(&self.input)?;
        let mut out = Vec::new();
        for source_path in source_paths {
            let label = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file {label}"))?;
            let mut value = serde_json::from_str::<serde_json::Value>(&source)
                .with_context(|| format!("failed to parse JSON source file ({label})"))?;
            if let Some(pointer) = self.json_pointer.as_deref() {
                value = value
                    .pointer(pointer)
                    .cloned()
                    .with_context(|| format!("JSON pointer {pointer} not found in {label}"))?;
            }
            match self.jq_expr.as_ref() {
                None => out.push((label, value)),
                Some(jq_expr) => {
                    let results = crate::jq_exec::run_jaq(jq_expr, &value)
                        .with_context(|| format!("failed to apply jq expression to {label}"))?;
                    let many = results.len() > 1;
                    for (i, value) in results.into_iter().enumerate() {
                        let label = if many { format!("{label}#{i}") } else { label.clone() };
                        out.push((label, value));
                    }
                }
            }
        }
        Ok(out)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    /// `Ok(false)` when the command ran but found invalid input.
    pub fn run(&self) -> Result<bool> {
        let registry = self.registry.load()?;
        match &self.cmd {
            Command::Programs => {
                for (name, artifact) in registry.iter() {
                    let hash = artifact.hash_text().unwrap_or_else(|| "-".into());
                    let version = artifact.noir_version.as_deref().unwrap_or("-");
                    println!("{}\t{} parameter(s)\thash {hash}\tnoir {version}", name.bold(), artifact.parameters().len());
                }
                Ok(true)
            }
            Command::Describe(target) => {
                let (name, artifact) = target.selector.pick(&registry)?;
                println!("{}", name.bold());
                for param in artifact.parameters() {
                    print_parameter(param);
                    if target.leaves {
                        let mut lines = Vec::new();
                        describe_nested(&param.ty, &Path::root().child(param.name.as_str()), &mut lines);
                        for line in lines {
                            println!("    {line}");
                        }
                    }
                }
                Ok(true)
            }
            Command::Template(target) => {
                let (name, _) = target.selector.pick(&registry)?;
                let mut session = Session::open(&registry, name)?;
                if let Some(previous) = target.previous.as_ref() {
                    session.seed(&read_inputs(previous)?);
                }
                write_output(target.out.as_ref(), session.inputs())?;
                Ok(true)
            }
            Command::Check(target) => {
                let (name, artifact) = target.selector.pick(&registry)?;
                let documents = target.input_settings.load_documents()?;
                info!(program = name, documents = documents.len(), "checking inputs");
                let results: Vec<(&String, Result<InputMap, Vec<InputError>>)> = documents
                    .par_iter()
                    .map(|(label, doc)| (label, check_inputs(artifact.parameters(), doc.clone())))
                    .collect();
                let mut all_valid = true;
                for (label, result) in results {
                    match result {
                        Ok(_) => println!("{} {label}", "valid".green().bold()),
                        Err(errors) => {
                            all_valid = false;
                            println!("{} {label}", "invalid".red().bold());
                            for error in errors {
                                println!("    {} {}", error.path.describe().yellow(), error.kind);
                            }
                        }
                    }
                }
                Ok(all_valid)
            }
            Command::Set(target) => {
                let (name, _) = target.selector.pick(&registry)?;
                let mut session = Session::open(&registry, name)?;
                if let Some(input) = target.input.as_ref() {
                    session.seed(&read_inputs(input)?);
                }
                match session.edit(&target.path, &target.value)? {
                    EditOutcome::Committed => {
                        write_output(target.out.as_ref(), session.inputs())?;
                        Ok(true)
                    }
                    EditOutcome::Rejected(error) => {
                        eprintln!("{} {} {}", "rejected".red().bold(), error.path.describe().yellow(), error.kind);
                        Ok(false)
                    }
                }
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn print_parameter(param: &AbiParameter) {
    let visibility = param.visibility.map(|v| format!(" ({v})")).unwrap_or_default();
    println!("  {}: {}{}", param.name.cyan(), param.ty, visibility.dimmed());
}

fn describe_nested(ty: &AbiType, at: &Path, out: &mut Vec<String>) {
    match ty {
        AbiType::Array { length, ty: elem } => {
            for i in 0..*length {
                let child = at.child(i);
                out.push(format!("{child}: {elem}"));
                describe_nested(elem, &child, out);
            }
        }
        AbiType::Tuple { fields } => {
            for (i, field) in fields.iter().enumerate() {
                let child = at.child(i);
                out.push(format!("{child}: {field}"));
                describe_nested(field, &child, out);
            }
        }
        AbiType::Struct { fields, .. } => {
            for field in fields {
                let child = at.child(field.name.as_str());
                out.push(format!("{child}: {}", field.ty));
                describe_nested(&field.ty, &child, out);
            }
        }
        _ => {}
    }
}

fn read_inputs(path: &std::path::Path) -> Result<InputMap> {
    let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let inputs = path_de::from_slice_with_path::<InputMap>(&bytes)
        .with_context(|| format!("failed to parse inputs file {}", path.display()))?;
    Ok(inputs)
}

fn write_output(out: Option<&PathBuf>, inputs: &InputMap) -> Result<()> {
    let src = serde_json::to_string_pretty(inputs)?;
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(out, &src).with_context(|| format!("failed to write {}", out.display()))?;
        }
        None => println!("{src}"),
    }
    Ok(())
}
