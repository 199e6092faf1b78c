// Strongly-typed ABI descriptors. Mirrors the compiler's `abi.parameters` JSON.
use std::fmt;
use serde::{Deserialize, Serialize};

use crate::value::{Path, PathSegment};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AbiType {
    Field,                                  // unconstrained field element
    Boolean,
    String { length: usize },               // exact character count
    Integer { sign: Sign, width: u32 },
    Array {
        length: usize,
        #[serde(rename = "type")]
        ty: Box<AbiType>,
    },
    Tuple { fields: Vec<AbiType> },         // positional, exact arity
    Struct {
        #[serde(default)]
        path: String,                       // declared type path, display only
        fields: Vec<AbiField>,              // declared order, names unique
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sign {
    Signed,
    Unsigned,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: AbiType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
    Databus,
}

/// One named top-level input of a program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: AbiType,
    #[serde(default)]
    pub visibility: Option<Visibility>,
}

impl AbiType {
    pub fn integer(sign: Sign, width: u32) -> Self { Self::Integer { sign, width } }
    pub fn string(length: usize) -> Self { Self::String { length } }
    pub fn array(ty: AbiType, length: usize) -> Self { Self::Array { length, ty: Box::new(ty) } }
    pub fn tuple(fields: Vec<AbiType>) -> Self { Self::Tuple { fields } }
    pub fn structure<I, S>(path: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = (S, AbiType)>,
        S: Into<String>,
    {
        let fields = fields
            .into_iter()
            .map(|(name, ty)| AbiField { name: name.into(), ty })
            .collect();
        Self::Struct { path: path.into(), fields }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Field | Self::Boolean | Self::String { .. } | Self::Integer { .. })
    }
}

impl AbiType {
    /// Descriptor of the child addressed by `segment`.
    pub fn child(&self, segment: &PathSegment) -> Option<&AbiType> {
        match (self, segment) {
            (Self::Array { length, ty }, PathSegment::Index(i)) if i < length => Some(ty.as_ref()),
            (Self::Tuple { fields }, PathSegment::Index(i)) => fields.get(*i),
            (Self::Struct { fields, .. }, PathSegment::Key(k)) => {
                fields.iter().find(|f| f.name == *k).map(|f| &f.ty)
            }
            _ => None,
        }
    }
}

/// Descriptor at `path` in a program's parameter list; the first segment names
/// the parameter.
pub fn type_at<'a>(params: &'a [AbiParameter], path: &Path) -> Option<&'a AbiType> {
    let (head, rest) = path.segments().split_first()?;
    let PathSegment::Key(name) = head else { return None };
    let param = params.iter().find(|p| p.name == *name)?;
    rest.iter().try_fold(&param.ty, |ty, seg| ty.child(seg))
}

impl Sign {
    pub fn is_signed(self) -> bool { matches!(self, Self::Signed) }
}

impl fmt::Display for AbiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field => f.write_str("Field"),
            Self::Boolean => f.write_str("bool"),
            Self::String { length } => write!(f, "str<{length}>"),
            Self::Integer { sign, width } => {
                let prefix = if sign.is_signed() { 'i' } else { 'u' };
                write!(f, "{prefix}{width}")
            }
            Self::Array { length, ty } => write!(f, "[{ty}; {length}]"),
            Self::Tuple { fields } => {
                f.write_str("(")?;
                for (i, ty) in fields.iter().enumerate() {
                    if i > 0 { f.write_str(", ")?; }
                    write!(f, "{ty}")?;
                }
                f.write_str(")")
            }
            Self::Struct { path, .. } if path.is_empty() => f.write_str("struct"),
            Self::Struct { path, .. } => f.write_str(path),
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Public => f.write_str("public"),
            Self::Private => f.write_str("private"),
            Self::Databus => f.write_str("databus"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_compiler_abi_shape() {
        let src = json!({
            "name": "point",
            "type": {
                "kind": "struct",
                "path": "geo::Point",
                "fields": [
                    { "name": "x", "type": { "kind": "integer", "sign": "unsigned", "width": 32 } },
                    { "name": "tags", "type": { "kind": "array", "length": 2, "type": { "kind": "string", "length": 3 } } },
                    { "name": "pair", "type": { "kind": "tuple", "fields": [{ "kind": "field" }, { "kind": "boolean" }] } }
                ]
            },
            "visibility": "private"
        });
        let param: AbiParameter = serde_json::from_value(src).unwrap();
        assert_eq!(param.visibility, Some(Visibility::Private));
        let expected = AbiType::structure("geo::Point", [
            ("x", AbiType::integer(Sign::Unsigned, 32)),
            ("tags", AbiType::array(AbiType::string(3), 2)),
            ("pair", AbiType::tuple(vec![AbiType::Field, AbiType::Boolean])),
        ]);
        assert_eq!(param.ty, expected);
    }

    #[test]
    fn type_titles() {
        assert_eq!(AbiType::integer(Sign::Signed, 8).to_string(), "i8");
        assert_eq!(AbiType::array(AbiType::Field, 4).to_string(), "[Field; 4]");
        assert_eq!(
            AbiType::tuple(vec![AbiType::Boolean, AbiType::string(5)]).to_string(),
            "(bool, str<5>)"
        );
        assert_eq!(AbiType::structure("", Vec::<(String, AbiType)>::new()).to_string(), "struct");
    }

    #[test]
    fn resolves_types_along_paths() {
        let params = vec![AbiParameter {
            name: "p".into(),
            ty: AbiType::structure("P", [("xs", AbiType::array(AbiType::Boolean, 2))]),
            visibility: None,
        }];
        assert_eq!(type_at(&params, &"p.xs[1]".parse().unwrap()), Some(&AbiType::Boolean));
        assert_eq!(type_at(&params, &"p.xs[2]".parse().unwrap()), None);
        assert_eq!(type_at(&params, &"q".parse().unwrap()), None);
        assert_eq!(type_at(&params, &Path::root()), None);
    }
}

#[cfg(test)]
pub(crate) mod strategy {
    use super::*;
    use crate::value::InputValue;
    use indexmap::IndexMap;
    use proptest::prelude::*;
    use serde_json::Number;

    /// Arbitrary finite-depth descriptors with unique struct field names.
    pub(crate) fn arb_abi_type() -> impl Strategy<Value = AbiType> {
        let leaf = prop_oneof![
            Just(AbiType::Field),
            Just(AbiType::Boolean),
            (0usize..6).prop_map(AbiType::string),
            (any::<bool>(), prop::sample::select(vec![1u32, 8, 16, 32, 64])).prop_map(|(signed, width)| {
                AbiType::integer(if signed { Sign::Signed } else { Sign::Unsigned }, width)
            }),
        ];
        leaf.prop_recursive(3, 32, 4, |inner| {
            prop_oneof![
                (inner.clone(), 0usize..4).prop_map(|(ty, n)| AbiType::array(ty, n)),
                prop::collection::vec(inner.clone(), 0..4).prop_map(AbiType::tuple),
                prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                    .prop_map(|fields| AbiType::structure("Gen", fields)),
            ]
        })
    }

    /// Trees that conform to `ty`, leaves drawn from the whole domain (wide
    /// field elements included).
    pub(crate) fn arb_value_for(ty: &AbiType) -> BoxedStrategy<InputValue> {
        match ty {
            AbiType::Field => prop_oneof![
                any::<i64>().prop_map(InputValue::from),
                "[1-9][0-9]{20,76}".prop_map(|digits| InputValue::Number(digits.parse::<Number>().unwrap())),
            ]
            .boxed(),
            AbiType::Integer { sign: Sign::Signed, .. } => any::<i64>().prop_map(InputValue::from).boxed(),
            AbiType::Integer { sign: Sign::Unsigned, .. } => any::<u64>().prop_map(InputValue::from).boxed(),
            AbiType::Boolean => any::<bool>().prop_map(InputValue::from).boxed(),
            AbiType::String { length } => prop::collection::vec(prop::char::range('a', 'z'), *length)
                .prop_map(|chars| InputValue::Str(chars.into_iter().collect()))
                .boxed(),
            AbiType::Array { length, ty } => prop::collection::vec(arb_value_for(ty), *length)
                .prop_map(InputValue::List)
                .boxed(),
            AbiType::Tuple { fields } => fields
                .iter()
                .map(arb_value_for)
                .collect::<Vec<_>>()
                .prop_map(InputValue::List)
                .boxed(),
            AbiType::Struct { fields, .. } => {
                let names: Vec<String> = fields.iter().map(|f| f.name.clone()).collect();
                fields
                    .iter()
                    .map(|f| arb_value_for(&f.ty))
                    .collect::<Vec<_>>()
                    .prop_map(move |values| {
                        InputValue::Struct(names.iter().cloned().zip(values).collect::<IndexMap<_, _>>())
                    })
                    .boxed()
            }
        }
    }

    /// A descriptor paired with a conforming tree.
    pub(crate) fn arb_typed_value() -> impl Strategy<Value = (AbiType, InputValue)> {
        arb_abi_type().prop_flat_map(|ty| {
            let tree = arb_value_for(&ty);
            (Just(ty), tree)
        })
    }
}
