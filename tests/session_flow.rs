use circuit_inputs::pipeline::{Execution, ExecutionError, Executor};
use circuit_inputs::registry::ProgramArtifact;
use circuit_inputs::{EditOutcome, EngineError, InputErrorKind, InputMap, Path, ProgramRegistry, Session};
use serde_json::json;

fn registry() -> ProgramRegistry {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/registry.json");
    ProgramRegistry::load(&path).unwrap()
}

fn p(s: &str) -> Path { s.parse().unwrap() }

fn inputs(value: serde_json::Value) -> InputMap { serde_json::from_value(value).unwrap() }

struct EchoExecutor;

impl Executor for EchoExecutor {
    fn execute(&self, _: &ProgramArtifact, inputs: &InputMap) -> Result<Execution, ExecutionError> {
        let witness = serde_json::to_vec(inputs).map_err(|e| ExecutionError::Backend(e.to_string()))?;
        Ok(Execution { witness, return_value: Some(json!(true)) })
    }
}

#[test]
fn fixture_registry_metadata() {
    let registry = registry();
    assert_eq!(registry.names().collect::<Vec<_>>(), ["main", "membership"]);
    let membership = registry.get("membership").unwrap();
    assert_eq!(membership.hash_text().as_deref(), Some("7231950823611720361"));
    let titles: Vec<String> = membership.parameters().iter().map(|p| p.ty.to_string()).collect();
    assert_eq!(titles, ["Field", "merkle::Proof", "(u8, str<4>)"]);
}

#[test]
fn edit_switch_and_execute() {
    let registry = registry();
    let mut session = Session::open(&registry, "membership").unwrap();
    assert_eq!(
        session.inputs(),
        &inputs(json!({
            "root": 0,
            "proof": { "leaf": 0, "siblings": [0, 0, 0], "directions": [false, false, false] },
            "meta": [0, "****"]
        }))
    );

    assert_eq!(session.edit(&p("proof.directions[2]"), "1").unwrap(), EditOutcome::Committed);
    assert_eq!(session.edit(&p("meta.1"), "abcd").unwrap(), EditOutcome::Committed);
    assert_eq!(session.edit(&p("root"), "12345").unwrap(), EditOutcome::Committed);

    let EditOutcome::Rejected(err) = session.edit(&p("proof.siblings"), "[1, 2]").unwrap() else {
        panic!("short array accepted");
    };
    assert_eq!(err.path, p("proof.siblings"));
    assert_eq!(err.kind, InputErrorKind::LengthMismatch { expected: 3, found: 2 });
    assert!(matches!(session.execute(&EchoExecutor), Err(EngineError::ExecutionGated(1))));

    session.edit(&p("proof.siblings"), "[1, 2, 3]").unwrap();
    let execution = session.execute(&EchoExecutor).unwrap();
    assert_eq!(execution.return_value, Some(json!(true)));

    // Switching keeps nothing but the same-named compatible scalars.
    session.select("main").unwrap();
    assert!(session.artifacts().is_empty());
    assert_eq!(session.inputs(), &inputs(json!({ "x": 0, "y": 0 })));

    session.edit(&p("x"), "7").unwrap();
    session.select("membership").unwrap();
    assert_eq!(session.inputs()["meta"], serde_json::from_value(json!([0, "****"])).unwrap());
}

#[test]
fn seeding_from_a_saved_inputs_file() {
    let registry = registry();
    let mut session = Session::open(&registry, "membership").unwrap();
    session.seed(&inputs(json!({
        "root": 9,
        "proof": { "leaf": "not a number", "siblings": [1, 2, 3, 4], "directions": [true] },
        "meta": [-1, "wxyz"],
        "extra": 1
    })));
    assert_eq!(
        session.inputs(),
        &inputs(json!({
            "root": 9,
            "proof": { "leaf": 0, "siblings": [1, 2, 3], "directions": [true, false, false] },
            "meta": [0, "wxyz"]
        }))
    );
    assert!(session.can_execute());
}
