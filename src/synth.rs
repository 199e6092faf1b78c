//! Default input trees, optionally seeded from a previous tree.
//!
//! When the active program changes, the new tree is built position by
//! position: wherever the previous tree holds a compatible scalar at the same
//! path, it is kept; everything else gets the canonical default
//! (`0`, `false`, `"*" × n`).
use tracing::trace;

use crate::ir::{AbiParameter, AbiType, Sign};
use crate::literal;
use crate::value::{InputMap, InputValue, Path, PathSegment};

/// Character used to pad default strings to their declared length.
pub const STRING_PLACEHOLDER: char = '*';

pub fn synthesize(ty: &AbiType, previous: Option<&InputValue>) -> InputValue {
    fill(ty, previous, &Path::root())
}

/// Build the full input map for `params`; each parameter is seeded from the
/// entry with the same name in `previous`.
pub fn fill_input_map(params: &[AbiParameter], previous: Option<&InputMap>) -> InputMap {
    params
        .iter()
        .map(|param| {
            let seed = previous.and_then(|prev| prev.get(&param.name));
            let at = Path::root().child(param.name.as_str());
            (param.name.clone(), fill(&param.ty, seed, &at))
        })
        .collect()
}

fn fill(ty: &AbiType, previous: Option<&InputValue>, at: &Path) -> InputValue {
    match ty {
        AbiType::Field | AbiType::Integer { .. } | AbiType::Boolean | AbiType::String { .. } => {
            match previous {
                Some(prev) if carries(ty, prev) => prev.clone(),
                Some(prev) => {
                    trace!(path = %at, %ty, found = prev.kind_name(), "previous value not carried");
                    scalar_default(ty)
                }
                None => scalar_default(ty),
            }
        }
        AbiType::Array { length, ty: elem } => InputValue::List(
            (0..*length)
                .map(|i| fill(elem, child(previous, &PathSegment::Index(i)), &at.child(i)))
                .collect(),
        ),
        AbiType::Tuple { fields } => InputValue::List(
            fields
                .iter()
                .enumerate()
                .map(|(i, ty)| fill(ty, child(previous, &PathSegment::Index(i)), &at.child(i)))
                .collect(),
        ),
        AbiType::Struct { fields, .. } => InputValue::Struct(
            fields
                .iter()
                .map(|field| {
                    let seg = PathSegment::Key(field.name.clone());
                    let value = fill(&field.ty, child(previous, &seg), &at.child(seg.clone()));
                    (field.name.clone(), value)
                })
                .collect(),
        ),
    }
}

fn child<'a>(previous: Option<&'a InputValue>, seg: &PathSegment) -> Option<&'a InputValue> {
    previous.and_then(|prev| prev.get(seg))
}

/// A previous scalar is kept only if it is already valid for `ty`.
fn carries(ty: &AbiType, prev: &InputValue) -> bool {
    match (ty, prev) {
        (AbiType::Field, InputValue::Number(_)) => true,
        (AbiType::Integer { sign: Sign::Signed, .. }, InputValue::Number(_)) => true,
        (AbiType::Integer { sign: Sign::Unsigned, .. }, InputValue::Number(n)) => !literal::is_negative(n),
        (AbiType::Boolean, InputValue::Bool(_)) => true,
        (AbiType::String { length }, InputValue::Str(s)) => s.chars().count() == *length,
        _ => false,
    }
}

fn scalar_default(ty: &AbiType) -> InputValue {
    match ty {
        AbiType::Boolean => InputValue::Bool(false),
        AbiType::String { length } => InputValue::Str(std::iter::repeat_n(STRING_PLACEHOLDER, *length).collect()),
        _ => InputValue::zero(),
    }
}
