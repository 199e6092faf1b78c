//! Copy-on-write replacement of one node in an input tree.
//!
//! Ancestors of the addressed node are rebuilt; siblings are carried over
//! unchanged. A path that does not address an existing node is a caller bug
//! and comes back as [`EngineError::ShapeMismatch`].
use crate::error::EngineError;
use crate::value::{InputMap, InputValue, Path, PathSegment};

pub fn mutate(tree: &InputValue, path: &Path, value: InputValue) -> Result<InputValue, EngineError> {
    replace_at(tree, path.segments(), value, path)
}

/// [`mutate`] over a whole input map; the first segment names the parameter.
pub fn mutate_map(inputs: &InputMap, path: &Path, value: InputValue) -> Result<InputMap, EngineError> {
    let Some((head, rest)) = path.segments().split_first() else {
        return Err(EngineError::shape(path, "empty path does not name a parameter"));
    };
    let PathSegment::Key(name) = head else {
        return Err(EngineError::shape(path, "first segment must be a parameter name"));
    };
    let current = inputs
        .get(name)
        .ok_or_else(|| EngineError::shape(path, format!("no parameter named `{name}`")))?;
    let replaced = replace_at(current, rest, value, path)?;
    let mut out = inputs.clone();
    out.insert(name.clone(), replaced);
    Ok(out)
}

fn replace_at(
    node: &InputValue,
    rest: &[PathSegment],
    value: InputValue,
    full: &Path,
) -> Result<InputValue, EngineError> {
    let Some((head, tail)) = rest.split_first() else {
        return Ok(value);
    };
    match (node, head) {
        (InputValue::List(items), PathSegment::Index(i)) => {
            let current = items.get(*i).ok_or_else(|| {
                EngineError::shape(full, format!("index {i} out of bounds for length {}", items.len()))
            })?;
            let replaced = replace_at(current, tail, value, full)?;
            let mut items = items.clone();
            items[*i] = replaced;
            Ok(InputValue::List(items))
        }
        (InputValue::Struct(fields), PathSegment::Key(k)) => {
            let current = fields
                .get(k)
                .ok_or_else(|| EngineError::shape(full, format!("no field named `{k}`")))?;
            let replaced = replace_at(current, tail, value, full)?;
            let mut fields = fields.clone();
            // existing key: position is kept
            fields.insert(k.clone(), replaced);
            Ok(InputValue::Struct(fields))
        }
        (node, _) => Err(EngineError::shape(
            full,
            format!("cannot descend into {} with segment {head:?}", node.kind_name()),
        )),
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::ir::strategy::arb_abi_type;
    use crate::synth::synthesize;
    use proptest::prelude::*;

    /// Every leaf path in `value`.
    fn leaf_paths(value: &InputValue, at: Path, out: &mut Vec<Path>) {
        match value {
            InputValue::List(items) => {
                for (i, item) in items.iter().enumerate() { leaf_paths(item, at.child(i), out); }
            }
            InputValue::Struct(fields) => {
                for (k, v) in fields { leaf_paths(v, at.child(k.as_str()), out); }
            }
            _ => out.push(at),
        }
    }

    proptest! {
        #[test]
        fn only_the_addressed_leaf_changes(ty in arb_abi_type(), pick in any::<prop::sample::Index>()) {
            let tree = synthesize(&ty, None);
            let mut leaves = Vec::new();
            leaf_paths(&tree, Path::root(), &mut leaves);
            prop_assume!(!leaves.is_empty());
            let target = &leaves[pick.index(leaves.len())];
            let marker = InputValue::from("marker");

            let out = mutate(&tree, target, marker.clone()).unwrap();
            prop_assert_eq!(out.get_path(target.segments()), Some(&marker));
            for leaf in leaves.iter().filter(|p| *p != target) {
                prop_assert_eq!(out.get_path(leaf.segments()), tree.get_path(leaf.segments()));
            }
            prop_assert_eq!(mutate(&out, target, marker.clone()).unwrap(), out);
        }
    }
}
