// src/stats/mod.rs
use indexmap::IndexMap;
use serde::Serialize;

use crate::merge::StudentIdentity;

/// Students counted into one class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassEntry {
    pub count: usize,
    pub members: Vec<StudentIdentity>,
}

/// Per-class counts and member lists for the run report. Classes keep the
/// order in which they were first seen. Never consulted by the merge itself.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ClassStats {
    classes: IndexMap<String, ClassEntry>,
}

impl ClassStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, class_label: &str, id: StudentIdentity) {
        let entry = self.classes.entry(class_label.to_string()).or_default();
        entry.count += 1;
        entry.members.push(id);
    }

    pub fn get(&self, class_label: &str) -> Option<&ClassEntry> {
        self.classes.get(class_label)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ClassEntry)> {
        self.classes.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn total(&self) -> usize {
        self.classes.values().map(|c| c.count).sum()
    }
}
