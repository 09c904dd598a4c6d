//! Selected (mod, file) pairs for one install run

use std::collections::BTreeMap;

use crate::catalog::{ModLoaderType, ModRef};

/// Game-version/loader filter active for a run
#[derive(Debug, Clone, Default)]
pub struct ResolveContext {
    pub game_version: Option<String>,
    pub loader: Option<ModLoaderType>,
}

impl ResolveContext {
    pub fn new(game_version: Option<String>, loader: Option<ModLoaderType>) -> Self {
        Self {
            game_version,
            loader,
        }
    }
}

/// Mapping from mod id to the chosen file id, one file per mod
///
/// Created fresh per install run and discarded at the end. The resolver
/// only fills in mods absent from the set; an entry present here is never
/// replaced, which is both the user-choice guarantee and the cycle guard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    chosen: BTreeMap<i64, i64>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a user's explicit pick, replacing any previous pick for the mod
    pub fn select(&mut self, mod_ref: ModRef) {
        self.chosen.insert(mod_ref.mod_id, mod_ref.file_id);
    }

    /// Fill in a resolved dependency; a no-op when the mod is already chosen
    pub(crate) fn fill(&mut self, mod_id: i64, file_id: i64) -> bool {
        if self.chosen.contains_key(&mod_id) {
            return false;
        }
        self.chosen.insert(mod_id, file_id);
        true
    }

    pub fn contains_mod(&self, mod_id: i64) -> bool {
        self.chosen.contains_key(&mod_id)
    }

    pub fn file_for(&self, mod_id: i64) -> Option<i64> {
        self.chosen.get(&mod_id).copied()
    }

    pub fn mod_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.chosen.keys().copied()
    }

    pub fn file_ids(&self) -> Vec<i64> {
        self.chosen.values().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = ModRef> + '_ {
        self.chosen
            .iter()
            .map(|(&mod_id, &file_id)| ModRef { mod_id, file_id })
    }

    pub fn len(&self) -> usize {
        self.chosen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chosen.is_empty()
    }

    /// True when every entry of `other` appears here with the same file
    pub fn is_superset_of(&self, other: &SelectionSet) -> bool {
        other
            .chosen
            .iter()
            .all(|(mod_id, file_id)| self.chosen.get(mod_id) == Some(file_id))
    }
}

impl FromIterator<ModRef> for SelectionSet {
    fn from_iter<I: IntoIterator<Item = ModRef>>(iter: I) -> Self {
        let mut set = SelectionSet::new();
        for mod_ref in iter {
            set.select(mod_ref);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_never_replaces_an_existing_pick() {
        let mut set = SelectionSet::new();
        set.select(ModRef::new(10, 100));
        assert!(!set.fill(10, 999));
        assert_eq!(set.file_for(10), Some(100));
        assert!(set.fill(20, 200));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn superset_requires_matching_files() {
        let small: SelectionSet = [ModRef::new(1, 11)].into_iter().collect();
        let big: SelectionSet = [ModRef::new(1, 11), ModRef::new(2, 22)].into_iter().collect();
        let conflicting: SelectionSet = [ModRef::new(1, 99)].into_iter().collect();

        assert!(big.is_superset_of(&small));
        assert!(!small.is_superset_of(&big));
        assert!(!conflicting.is_superset_of(&small));
    }
}
