// src/merge/mod.rs
//! Identity resolution: fold roster rows into one record per student.

pub mod identity;
pub mod record;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::normalize::GenderRules;
use crate::source::SourceRow;

pub use identity::StudentIdentity;
pub use record::{Guardian, MergedRecord, TARGET_COLUMNS, TARGET_HEADER};

/// What folding one row did to the map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeOutcome {
    /// First row for the student; record created with the guardian in slot 1.
    Created,
    /// Slot 1 existed but had no surname; this row's guardian filled it.
    FirstGuardian,
    /// Guardian placed in slot 2.
    SecondGuardian,
    /// Guardian already present in one of the slots; nothing changed.
    DuplicateGuardian,
    /// Both slots filled; the row's guardian was dropped.
    ExcessGuardian,
    /// Later row without a guardian surname; nothing changed.
    NoGuardian,
}

/// Per-outcome tallies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeCounts {
    pub created: usize,
    pub first_guardian: usize,
    pub second_guardian: usize,
    pub duplicate_guardian: usize,
    pub excess_guardian: usize,
    pub no_guardian: usize,
}

impl OutcomeCounts {
    pub fn add(&mut self, outcome: MergeOutcome) {
        match outcome {
            MergeOutcome::Created => self.created += 1,
            MergeOutcome::FirstGuardian => self.first_guardian += 1,
            MergeOutcome::SecondGuardian => self.second_guardian += 1,
            MergeOutcome::DuplicateGuardian => self.duplicate_guardian += 1,
            MergeOutcome::ExcessGuardian => self.excess_guardian += 1,
            MergeOutcome::NoGuardian => self.no_guardian += 1,
        }
    }

    pub fn merge(&mut self, other: &OutcomeCounts) {
        self.created += other.created;
        self.first_guardian += other.first_guardian;
        self.second_guardian += other.second_guardian;
        self.duplicate_guardian += other.duplicate_guardian;
        self.excess_guardian += other.excess_guardian;
        self.no_guardian += other.no_guardian;
    }
}

/// StudentIdentity → record, in first-seen order. Lives for one run and
/// holds exactly one record per identity.
#[derive(Debug, Default)]
pub struct MergeMap {
    records: IndexMap<StudentIdentity, MergedRecord>,
}

impl MergeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &StudentIdentity) -> Option<&MergedRecord> {
        self.records.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StudentIdentity, &MergedRecord)> {
        self.records.iter()
    }

    /// Drain the records in insertion order.
    pub fn into_records(self) -> impl Iterator<Item = MergedRecord> {
        self.records.into_values()
    }

    /// Fold one row into the map.
    ///
    /// Slots are assigned by arrival: the first row for a student owns
    /// slot 1 whatever its relation, the next distinct guardian gets slot 2,
    /// anything after that is dropped. A later row with no guardian surname
    /// never takes a slot.
    pub fn merge(
        &mut self,
        row: &SourceRow,
        class_label: &str,
        rules: &GenderRules,
    ) -> (StudentIdentity, MergeOutcome) {
        let fresh = MergedRecord::from_first_row(row, class_label, rules);
        let id = StudentIdentity::from_name(&fresh.student);

        let Some(rec) = self.records.get_mut(&id) else {
            info!(student = %id, class = class_label, "record created with guardian 1");
            self.records.insert(id.clone(), fresh);
            return (id, MergeOutcome::Created);
        };

        let guardian = fresh.guardian1;
        if !guardian.is_filled() {
            debug!(student = %id, class = class_label, "row has no guardian name; slots unchanged");
            return (id, MergeOutcome::NoGuardian);
        }

        let slots = [&rec.guardian1, &rec.guardian2];
        if slots.iter().any(|g| g.same_as(&guardian)) {
            debug!(student = %id, class = class_label, "guardian already recorded");
            return (id, MergeOutcome::DuplicateGuardian);
        }

        if !rec.guardian1.is_filled() {
            info!(student = %id, class = class_label, "guardian 1 filled from later row");
            rec.guardian1 = guardian;
            (id, MergeOutcome::FirstGuardian)
        } else if !rec.guardian2.is_filled() {
            info!(student = %id, class = class_label, "guardian 2 added");
            rec.guardian2 = guardian;
            (id, MergeOutcome::SecondGuardian)
        } else {
            warn!(
                student = %id,
                class = class_label,
                dropped = %guardian.name.surname,
                "student has more than two guardians; extra data ignored"
            );
            (id, MergeOutcome::ExcessGuardian)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(student: &str, guardian: &str, relation: &str) -> SourceRow {
        SourceRow {
            file_number: "1".into(),
            admission_date: "01.09.2020".into(),
            student_name: student.into(),
            student_gender: "M".into(),
            student_birth_date: "01.01.2013".into(),
            guardian_relation: relation.into(),
            guardian_name: guardian.into(),
            guardian_birth_date: "02.02.1980".into(),
            guardian_phone: "555".into(),
            guardian_email: String::new(),
        }
    }

    const PETR: &str = "Ivanov Petr Ivanovich";

    #[test]
    fn two_guardians_fill_both_slots() {
        let rules = GenderRules::default();
        let mut map = MergeMap::new();

        let (id, o1) = map.merge(&row(PETR, "Petrov Ivan Ivanovich", "father"), "5A", &rules);
        let (_, o2) = map.merge(&row(PETR, "Petrova Anna Ivanovna", "mother"), "5A", &rules);
        assert_eq!(o1, MergeOutcome::Created);
        assert_eq!(o2, MergeOutcome::SecondGuardian);
        assert_eq!(map.len(), 1);

        let rec = map.get(&id).unwrap();
        assert_eq!(rec.class_label, "5A");
        assert_eq!(rec.guardian1.name.surname, "Petrov");
        assert_eq!(rec.guardian1.gender, "M");
        assert_eq!(rec.guardian1.relation, "father");
        assert_eq!(rec.guardian2.name.surname, "Petrova");
        assert_eq!(rec.guardian2.gender, "F");
    }

    #[test]
    fn third_guardian_never_changes_record() {
        let rules = GenderRules::default();
        let mut map = MergeMap::new();
        map.merge(&row(PETR, "Petrov Ivan", "father"), "5A", &rules);
        map.merge(&row(PETR, "Petrova Anna", "mother"), "5A", &rules);
        let id = StudentIdentity::from_text(PETR);
        let before = map.get(&id).unwrap().clone();

        let (_, o) = map.merge(&row(PETR, "Sidorova Olga", "grandmother"), "5B", &rules);
        assert_eq!(o, MergeOutcome::ExcessGuardian);
        assert_eq!(map.get(&id).unwrap(), &before);
    }

    #[test]
    fn slot_order_follows_arrival_not_relation() {
        let rules = GenderRules::default();
        let mut map = MergeMap::new();
        map.merge(&row(PETR, "Petrova Anna", "mother"), "5A", &rules);
        map.merge(&row(PETR, "Petrov Ivan", "father"), "5A", &rules);

        let rec = map.get(&StudentIdentity::from_text(PETR)).unwrap();
        assert_eq!(rec.guardian1.relation, "mother");
        assert_eq!(rec.guardian2.relation, "father");
    }

    #[test]
    fn duplicate_rows_are_idempotent() {
        let rules = GenderRules::default();
        let mut map = MergeMap::new();
        let r = row(PETR, "Petrov Ivan", "father");
        map.merge(&r, "5A", &rules);
        let snapshot = map.get(&StudentIdentity::from_text(PETR)).unwrap().clone();

        let (_, o) = map.merge(&r, "5A", &rules);
        assert_eq!(o, MergeOutcome::DuplicateGuardian);
        assert_eq!(map.get(&StudentIdentity::from_text(PETR)).unwrap(), &snapshot);
    }

    #[test]
    fn empty_first_slot_is_filled_before_second() {
        let rules = GenderRules::default();
        let mut map = MergeMap::new();
        map.merge(&row(PETR, "", ""), "5A", &rules);
        let (_, o) = map.merge(&row(PETR, "Petrova Anna", "mother"), "5A", &rules);
        assert_eq!(o, MergeOutcome::FirstGuardian);

        let rec = map.get(&StudentIdentity::from_text(PETR)).unwrap();
        assert_eq!(rec.guardian1.name.surname, "Petrova");
        assert!(!rec.guardian2.is_filled());
    }

    #[test]
    fn nameless_guardian_does_not_take_a_slot() {
        let rules = GenderRules::default();
        let mut map = MergeMap::new();
        map.merge(&row(PETR, "Petrov Ivan", "father"), "5A", &rules);

        let mut bare = row(PETR, "", "mother");
        bare.guardian_phone = "999".into();
        let (_, o) = map.merge(&bare, "5A", &rules);
        assert_eq!(o, MergeOutcome::NoGuardian);
        let rec = map.get(&StudentIdentity::from_text(PETR)).unwrap();
        assert!(!rec.guardian2.is_filled());
        assert_eq!(rec.guardian2.relation, "");
        assert_eq!(rec.guardian2.mobile_phone, "");

        let (_, o) = map.merge(&row(PETR, "Petrova Anna", "mother"), "5A", &rules);
        assert_eq!(o, MergeOutcome::SecondGuardian);
        let rec = map.get(&StudentIdentity::from_text(PETR)).unwrap();
        assert_eq!(rec.guardian2.name.surname, "Petrova");
        assert_eq!(rec.guardian2.mobile_phone, "555");
    }

    #[test]
    fn outcome_counts_tally_nameless_rows() {
        let mut counts = OutcomeCounts::default();
        counts.add(MergeOutcome::Created);
        counts.add(MergeOutcome::NoGuardian);
        counts.add(MergeOutcome::NoGuardian);
        assert_eq!(counts.created, 1);
        assert_eq!(counts.no_guardian, 2);
    }

    #[test]
    fn class_label_comes_from_first_row() {
        let rules = GenderRules::default();
        let mut map = MergeMap::new();
        map.merge(&row(PETR, "Petrov Ivan", "father"), "5A", &rules);
        map.merge(&row(PETR, "Petrova Anna", "mother"), "6B", &rules);
        assert_eq!(
            map.get(&StudentIdentity::from_text(PETR)).unwrap().class_label,
            "5A"
        );
    }

    #[test]
    fn one_record_per_identity_in_first_seen_order() {
        let rules = GenderRules::default();
        let mut map = MergeMap::new();
        let students = ["B C D", "A B C", "B  C D", "E F", "A B C"];
        for s in students {
            map.merge(&row(s, "X Y Z", "aunt"), "5A", &rules);
        }
        let ids: Vec<String> = map.iter().map(|(id, _)| id.to_string()).collect();
        assert_eq!(ids, vec!["B C D", "A B C", "E F "]);
        assert_eq!(map.into_records().count(), 3);
    }
}
