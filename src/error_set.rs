//! Per-path validity bookkeeping behind the execute gate.
use std::collections::BTreeMap;

use crate::value::Path;

/// Currently-invalid paths. Only invalid entries are stored: registering a
/// path as valid removes it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorSet {
    entries: BTreeMap<Path, bool>,
}

impl ErrorSet {
    pub fn new() -> Self { Self::default() }

    pub fn register(&mut self, path: &Path, invalid: bool) {
        if invalid {
            self.entries.insert(path.clone(), true);
        } else {
            self.entries.remove(path);
        }
    }

    /// Forget `path` and every path below it; used when a whole subtree is
    /// replaced by a valid value.
    pub fn clear_subtree(&mut self, path: &Path) {
        self.entries.retain(|p, _| !p.starts_with(path));
    }

    pub fn any_invalid(&self) -> bool {
        self.entries.values().any(|invalid| *invalid)
    }

    pub fn is_invalid(&self, path: &Path) -> bool {
        self.entries.get(path).copied().unwrap_or(false)
    }

    pub fn invalid_paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().filter(|(_, invalid)| **invalid).map(|(p, _)| p)
    }

    pub fn invalid_count(&self) -> usize { self.invalid_paths().count() }

    pub fn reset(&mut self) { self.entries.clear(); }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> Path { s.parse().unwrap() }

    #[test]
    fn flag_tracks_remaining_invalid_paths() {
        let mut set = ErrorSet::new();
        assert!(!set.any_invalid());
        set.register(&p("a"), true);
        set.register(&p("b[1]"), true);
        set.register(&p("a"), false);
        assert!(set.any_invalid());
        assert_eq!(set.invalid_paths().collect::<Vec<_>>(), [&p("b[1]")]);
        set.register(&p("b[1]"), false);
        assert!(!set.any_invalid());
    }

    #[test]
    fn clearing_a_valid_path_is_a_no_op() {
        let mut set = ErrorSet::new();
        set.register(&p("x"), false);
        assert_eq!(set, ErrorSet::new());
    }

    #[test]
    fn subtree_clear_and_reset() {
        let mut set = ErrorSet::new();
        set.register(&p("s.xs[0]"), true);
        set.register(&p("s.xs[1]"), true);
        set.register(&p("t"), true);
        set.clear_subtree(&p("s.xs"));
        assert_eq!(set.invalid_count(), 1);
        assert!(set.is_invalid(&p("t")));
        set.reset();
        assert!(!set.any_invalid());
    }
}
