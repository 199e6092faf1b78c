//! Typechecking decoded literals against ABI descriptors.
//!
//! Every check runs in two steps: [`literal::decode`] turns the raw text into a
//! [`Literal`], then [`coerce`] walks the literal and the descriptor together.
//! Composite literals are checked element by element against their own
//! decoded sub-literal, and every failure is reported at the exact node where
//! it occurred (relative to the node being validated).
//!
//! Nothing here touches the value tree; callers decide what to do with the
//! outcome (see [`crate::session::Session::edit`]).
use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use crate::error::{InputError, InputErrorKind};
use crate::ir::{AbiParameter, AbiType, Sign};
use crate::literal::{self, Literal};
use crate::value::{InputMap, InputValue, Path};

// ————————————————————————————————————————————————————————————————————————————
// FRONT API
// ————————————————————————————————————————————————————————————————————————————

/// `true` when the input is NOT acceptable for `ty`.
///
/// `existing` is an already-decoded value for the node; when given it is
/// typechecked in place of `raw`, which is then never parsed.
pub fn validate(ty: &AbiType, raw: &str, existing: Option<&InputValue>) -> bool {
    let outcome = match existing {
        Some(value) => typecheck(ty, &Literal::from(value)).map_err(|mut errors| errors.remove(0)),
        None => check(ty, raw),
    };
    if let Err(error) = &outcome {
        debug!(%ty, %error, decoded = existing.is_some(), "input rejected");
    }
    outcome.is_err()
}

/// Decode and typecheck `raw`, returning the value to commit or the first
/// failure.
pub fn check(ty: &AbiType, raw: &str) -> Result<InputValue, InputError> {
    check_all(ty, raw).map_err(|mut errors| errors.remove(0))
}

/// Like [`check`], but collects every failure in the literal.
pub fn check_all(ty: &AbiType, raw: &str) -> Result<InputValue, Vec<InputError>> {
    let literal = literal::decode(ty, raw).map_err(|e| vec![e])?;
    typecheck(ty, &literal)
}

pub fn typecheck(ty: &AbiType, literal: &Literal) -> Result<InputValue, Vec<InputError>> {
    let mut errors = Vec::new();
    match coerce(ty, literal, &Path::root(), &mut errors) {
        Some(value) if errors.is_empty() => Ok(value),
        _ => Err(errors),
    }
}

/// Recheck a committed tree. An empty result means the tree conforms.
pub fn validate_value(ty: &AbiType, value: &InputValue) -> Vec<InputError> {
    typecheck(ty, &Literal::from(value)).err().unwrap_or_default()
}

/// Typecheck a whole input document: a JSON object keyed by parameter name.
/// Error paths start with the parameter name.
pub fn check_inputs(params: &[AbiParameter], document: Value) -> Result<InputMap, Vec<InputError>> {
    let literal = Literal::from_json(document).map_err(|e| vec![e])?;
    let entries = match literal {
        Literal::Object(entries) => entries,
        other => return Err(vec![mismatch(&Path::root(), "an object of parameters", &other)]),
    };
    let root = Path::root();
    let mut errors = Vec::new();
    if let Some(err) = field_set_mismatch(&root, params.iter().map(|p| p.name.as_str()), &entries) {
        return Err(vec![err]);
    }
    let mut inputs = InputMap::with_capacity(params.len());
    for param in params {
        let at = root.child(param.name.as_str());
        if let Some(value) = entries.get(&param.name).and_then(|lit| coerce(&param.ty, lit, &at, &mut errors)) {
            inputs.insert(param.name.clone(), value);
        }
    }
    if errors.is_empty() { Ok(inputs) } else { Err(errors) }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL
// ————————————————————————————————————————————————————————————————————————————

/// Walk `literal` against `ty`. Returns the canonical value when the subtree
/// conforms; otherwise records failures and returns `None`.
fn coerce(ty: &AbiType, literal: &Literal, at: &Path, errors: &mut Vec<InputError>) -> Option<InputValue> {
    let fail = |errors: &mut Vec<InputError>, err: InputError| -> Option<InputValue> {
        errors.push(err);
        None
    };
    match (ty, literal) {
        (AbiType::Field, Literal::Number(n)) => Some(InputValue::Number(n.clone())),
        (AbiType::Integer { sign, .. }, Literal::Number(n)) => {
            if *sign == Sign::Unsigned && literal::is_negative(n) {
                return fail(errors, InputError::new(at.clone(), InputErrorKind::SignMismatch {
                    value: n.to_string(),
                }));
            }
            Some(InputValue::Number(n.clone()))
        }
        (AbiType::Boolean, Literal::Bool(b)) => Some(InputValue::Bool(*b)),
        (AbiType::Boolean, Literal::Number(n)) => match n.as_u64() {
            Some(0) => Some(InputValue::Bool(false)),
            Some(1) => Some(InputValue::Bool(true)),
            _ => fail(errors, mismatch(at, "a boolean", literal)),
        },
        (AbiType::Boolean, Literal::Str(s)) => match literal::bool_from_text(s) {
            Some(b) => Some(InputValue::Bool(b)),
            None => fail(errors, mismatch(at, "a boolean", literal)),
        },
        (AbiType::String { length }, Literal::Str(s)) => {
            let found = s.chars().count();
            if found != *length {
                return fail(errors, InputError::new(at.clone(), InputErrorKind::LengthMismatch {
                    expected: *length,
                    found,
                }));
            }
            Some(InputValue::Str(s.clone()))
        }
        (AbiType::Array { length, ty: elem }, Literal::Array(items)) => {
            let element_types = std::iter::repeat_n(elem.as_ref(), *length);
            coerce_positional(element_types, *length, items, at, errors)
        }
        (AbiType::Tuple { fields }, Literal::Array(items)) => {
            coerce_positional(fields.iter(), fields.len(), items, at, errors)
        }
        (AbiType::Struct { fields, .. }, Literal::Object(entries)) => {
            if let Some(err) = field_set_mismatch(at, fields.iter().map(|f| f.name.as_str()), entries) {
                return fail(errors, err);
            }
            let mut out = IndexMap::with_capacity(fields.len());
            let mut ok = true;
            // declared order, whatever order the literal used
            for field in fields {
                let child = at.child(field.name.as_str());
                match entries.get(&field.name).and_then(|lit| coerce(&field.ty, lit, &child, errors)) {
                    Some(value) => { out.insert(field.name.clone(), value); }
                    None => ok = false,
                }
            }
            ok.then_some(InputValue::Struct(out))
        }
        (ty, literal) => fail(errors, mismatch(at, &expected_name(ty), literal)),
    }
}

fn coerce_positional<'a>(
    types: impl Iterator<Item = &'a AbiType>,
    expected: usize,
    items: &[Literal],
    at: &Path,
    errors: &mut Vec<InputError>,
) -> Option<InputValue> {
    if items.len() != expected {
        errors.push(InputError::new(at.clone(), InputErrorKind::LengthMismatch {
            expected,
            found: items.len(),
        }));
        return None;
    }
    let mut out = Vec::with_capacity(expected);
    let mut ok = true;
    for (i, (ty, item)) in types.zip(items).enumerate() {
        match coerce(ty, item, &at.child(i), errors) {
            Some(value) => out.push(value),
            None => ok = false,
        }
    }
    ok.then_some(InputValue::List(out))
}

/// Set equality between declared names and literal keys; order is ignored.
fn field_set_mismatch<'a>(
    at: &Path,
    declared: impl Iterator<Item = &'a str> + Clone,
    entries: &IndexMap<String, Literal>,
) -> Option<InputError> {
    let missing: Vec<String> = declared.clone()
        .filter(|name| !entries.contains_key(*name))
        .map(str::to_string)
        .collect();
    let unexpected: Vec<String> = entries.keys()
        .filter(|k| !declared.clone().any(|name| name == k.as_str()))
        .cloned()
        .collect();
    if missing.is_empty() && unexpected.is_empty() {
        return None;
    }
    Some(InputError::new(at.clone(), InputErrorKind::CardinalityMismatch { missing, unexpected }))
}

fn expected_name(ty: &AbiType) -> String {
    match ty {
        AbiType::Field | AbiType::Integer { .. } => format!("a number ({ty})"),
        AbiType::Boolean => "a boolean".to_string(),
        AbiType::String { .. } => format!("a string ({ty})"),
        AbiType::Array { .. } | AbiType::Tuple { .. } => format!("an array ({ty})"),
        AbiType::Struct { .. } => format!("an object ({ty})"),
    }
}

fn mismatch(at: &Path, expected: &str, found: &Literal) -> InputError {
    let found = match found {
        Literal::Number(n) => format!("number {n}"),
        other => other.kind_name().to_string(),
    };
    InputError::new(at.clone(), InputErrorKind::Parse { expected: expected.to_string(), found })
}
