//! Decoding raw text into a closed literal.
//!
//! Decoding only answers "what did the user type?". Whether that literal fits
//! the declared type is decided afterwards by [`crate::validate`].
use indexmap::IndexMap;
use serde_json::{Number, Value};

use crate::error::{InputError, InputErrorKind};
use crate::ir::AbiType;
use crate::value::{InputValue, Path, PathSegment};

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(Number),
    Bool(bool),
    Str(String),
    Array(Vec<Literal>),
    Object(IndexMap<String, Literal>),
}

impl Literal {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Bool(_) => "boolean",
            Self::Str(_) => "string",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }

    /// Convert a parsed JSON document. `null` has no literal form and is
    /// reported at the position it occurs.
    pub fn from_json(value: Value) -> Result<Self, InputError> {
        from_json_at(value, &Path::root())
    }
}

fn from_json_at(value: Value, at: &Path) -> Result<Literal, InputError> {
    Ok(match value {
        Value::Null => {
            return Err(InputError::new(at.clone(), InputErrorKind::Parse {
                expected: "a value".into(),
                found: "null".into(),
            }))
        }
        Value::Bool(b) => Literal::Bool(b),
        Value::Number(n) => Literal::Number(n),
        Value::String(s) => Literal::Str(s),
        Value::Array(xs) => Literal::Array(
            xs.into_iter()
                .enumerate()
                .map(|(i, x)| from_json_at(x, &at.child(i)))
                .collect::<Result<_, _>>()?,
        ),
        Value::Object(map) => Literal::Object(
            map.into_iter()
                .map(|(k, v)| {
                    let child = at.child(PathSegment::Key(k.clone()));
                    from_json_at(v, &child).map(|lit| (k, lit))
                })
                .collect::<Result<_, _>>()?,
        ),
    })
}

impl From<&InputValue> for Literal {
    fn from(value: &InputValue) -> Self {
        match value {
            InputValue::Number(n) => Self::Number(n.clone()),
            InputValue::Bool(b) => Self::Bool(*b),
            InputValue::Str(s) => Self::Str(s.clone()),
            InputValue::List(items) => Self::Array(items.iter().map(Self::from).collect()),
            InputValue::Struct(fields) => {
                Self::Object(fields.iter().map(|(k, v)| (k.clone(), Self::from(v))).collect())
            }
        }
    }
}

/// `true`/`1` and `false`/`0`, case-insensitive, surrounding blanks ignored.
pub fn bool_from_text(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Sign of a numeric literal of any width or notation. `-0`, `-0.0` and
/// `-0e7` are not negative.
pub fn is_negative(n: &Number) -> bool {
    let text = n.to_string();
    let Some(magnitude) = text.strip_prefix('-') else { return false };
    magnitude
        .split(['e', 'E'])
        .next()
        .is_some_and(|mantissa| mantissa.bytes().any(|b| matches!(b, b'1'..=b'9')))
}

/// Decode the text typed for a node of type `ty`.
///
/// - strings are taken verbatim, never JSON-decoded;
/// - booleans go through [`bool_from_text`];
/// - everything else is parsed as JSON.
pub fn decode(ty: &AbiType, raw: &str) -> Result<Literal, InputError> {
    match ty {
        AbiType::String { .. } => Ok(Literal::Str(raw.to_string())),
        AbiType::Boolean => bool_from_text(raw).map(Literal::Bool).ok_or_else(|| {
            InputError::new(Path::root(), InputErrorKind::Parse {
                expected: ty.to_string(),
                found: format!("{:?}", raw.trim()),
            })
        }),
        _ => {
            let value = serde_json::from_str::<Value>(raw.trim()).map_err(|error| {
                InputError::new(Path::root(), InputErrorKind::Parse {
                    expected: ty.to_string(),
                    found: format!("malformed input ({error})"),
                })
            })?;
            Literal::from_json(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Sign;

    #[test]
    fn strings_are_verbatim() {
        let lit = decode(&AbiType::string(4), "\"ab\"").unwrap();
        assert_eq!(lit, Literal::Str("\"ab\"".into()));
    }

    #[test]
    fn booleans_accept_words_and_digits() {
        assert_eq!(decode(&AbiType::Boolean, " TRUE ").unwrap(), Literal::Bool(true));
        assert_eq!(decode(&AbiType::Boolean, "0").unwrap(), Literal::Bool(false));
        assert!(decode(&AbiType::Boolean, "yes").is_err());
    }

    #[test]
    fn composite_text_is_json() {
        let lit = decode(&AbiType::array(AbiType::Field, 2), "[1, 2]").unwrap();
        assert_eq!(lit, Literal::Array(vec![
            Literal::Number(1u8.into()),
            Literal::Number(2u8.into()),
        ]));
        let err = decode(&AbiType::integer(Sign::Unsigned, 8), "12a").unwrap_err();
        assert!(matches!(err.kind, InputErrorKind::Parse { .. }));
    }

    #[test]
    fn numbers_keep_their_text() {
        let wide = "21888242871839275222246405745257275088548364400416034343698204186575808495617";
        let Literal::Number(n) = decode(&AbiType::Field, wide).unwrap() else { panic!("expected number") };
        assert_eq!(n.to_string(), wide);
        let Literal::Number(n) = decode(&AbiType::Field, "1e3").unwrap() else { panic!("expected number") };
        // exponent spelling is normalized, digits are not
        assert_eq!(n.to_string(), "1e+3");
    }

    #[test]
    fn sign_of_any_notation() {
        let num = |s: &str| match decode(&AbiType::Field, s).unwrap() {
            Literal::Number(n) => n,
            other => panic!("expected number, got {other:?}"),
        };
        for negative in ["-1", "-0.5", "-18446744073709551616", "-2E3"] {
            assert!(is_negative(&num(negative)), "{negative}");
        }
        for not_negative in ["0", "-0", "-0.0", "-0e7", "3", "18446744073709551616"] {
            assert!(!is_negative(&num(not_negative)), "{not_negative}");
        }
    }

    #[test]
    fn null_is_reported_where_it_occurs() {
        let err = decode(&AbiType::tuple(vec![]), r#"[1, {"a": null}]"#).unwrap_err();
        assert_eq!(err.path.to_string(), "[1].a");
    }
}
