use indexmap::IndexSet;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::ModName;

/// Set of mods a single conditional operation requires.
///
/// Equality ignores insertion order: `{A, B} == {B, A}`. Iteration keeps the
/// order names were first seen, which is what package-id resolution relies on.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ModSet(IndexSet<ModName>);

impl ModSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the name was already present.
    pub fn insert(&mut self, name: ModName) -> bool {
        self.0.insert(name)
    }

    pub fn contains(&self, name: &ModName) -> bool {
        self.0.contains(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModName> {
        self.0.iter()
    }
}

impl PartialEq for ModSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|name| other.contains(name))
    }
}

impl Eq for ModSet {}

impl FromIterator<ModName> for ModSet {
    fn from_iter<I: IntoIterator<Item = ModName>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ModSet {
    type Item = &'a ModName;
    type IntoIter = indexmap::set::Iter<'a, ModName>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Value-deduplicated collection of [`ModSet`]s.
///
/// Two sets holding the same names count as one member, whichever order
/// their names were declared in.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ModSetCollection(Vec<ModSet>);

impl ModSetCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `set` unless an equal set is already a member. Returns whether it was added.
    pub fn add(&mut self, set: ModSet) -> bool {
        if self.has(&set) {
            return false;
        }
        self.0.push(set);
        true
    }

    /// Union with `other`, keeping value deduplication.
    pub fn merge_with(&mut self, other: &ModSetCollection) {
        for set in other.iter() {
            self.add(set.clone());
        }
    }

    pub fn has(&self, set: &ModSet) -> bool {
        self.0.iter().any(|member| member == set)
    }

    pub fn is_equal_to(&self, other: &ModSetCollection) -> bool {
        self.size() == other.size() && self.0.iter().all(|set| other.has(set))
    }

    pub fn size(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModSet> {
        self.0.iter()
    }

    /// Union of every member's names, in first-seen order.
    pub fn all_names(&self) -> Vec<ModName> {
        let names: IndexSet<&ModName> = self.0.iter().flat_map(|set| set.iter()).collect();
        names.into_iter().cloned().collect()
    }
}

impl PartialEq for ModSetCollection {
    fn eq(&self, other: &Self) -> bool {
        self.is_equal_to(other)
    }
}

impl Eq for ModSetCollection {}

impl FromIterator<ModSet> for ModSetCollection {
    fn from_iter<I: IntoIterator<Item = ModSet>>(iter: I) -> Self {
        let mut out = Self::new();
        for set in iter {
            out.add(set);
        }
        out
    }
}
