// src/merge/record.rs
use serde::Serialize;

use crate::normalize::{extract_date, split_full_name, FullName, GenderRules};
use crate::source::SourceRow;

/// Column header of the consolidated table, in output order.
pub const TARGET_HEADER: [&str; 29] = [
    "StudentSurname",
    "StudentGiven",
    "StudentPatronymic",
    "StudentGender",
    "StudentBirthDate",
    "FileNumber",
    "AdmissionDate",
    "ClassLabel",
    "EnrollmentDate",
    "OrderNumber",
    "OrderDate",
    "G1Surname",
    "G1Given",
    "G1Patronymic",
    "G1Gender",
    "G1BirthDate",
    "G1Relation",
    "G1HomePhone",
    "G1MobilePhone",
    "G1Email",
    "G2Surname",
    "G2Given",
    "G2Patronymic",
    "G2Gender",
    "G2BirthDate",
    "G2Relation",
    "G2HomePhone",
    "G2MobilePhone",
    "G2Email",
];

pub const TARGET_COLUMNS: usize = TARGET_HEADER.len();

/// One guardian slot of a merged record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Guardian {
    pub name: FullName,
    pub gender: String,
    pub birth_date: String,
    pub relation: String,
    pub home_phone: String,
    pub mobile_phone: String,
    pub email: String,
}

impl Guardian {
    pub fn from_row(row: &SourceRow, rules: &GenderRules) -> Self {
        Self {
            name: split_full_name(&row.guardian_name),
            gender: rules.infer_label(&row.guardian_relation),
            birth_date: extract_date(&row.guardian_birth_date),
            relation: row.guardian_relation.clone(),
            // rosters carry a single phone column; it is the mobile number
            home_phone: String::new(),
            mobile_phone: row.guardian_phone.clone(),
            email: row.guardian_email.clone(),
        }
    }

    /// A slot counts as filled once it has a surname.
    pub fn is_filled(&self) -> bool {
        !self.name.surname.is_empty()
    }

    /// Same person in the same role, ignoring contact details.
    pub fn same_as(&self, other: &Guardian) -> bool {
        self.name == other.name
            && self.relation.to_lowercase() == other.relation.to_lowercase()
    }

    fn push_cells(&self, out: &mut Vec<String>) {
        out.extend([
            self.name.surname.clone(),
            self.name.given.clone(),
            self.name.patronymic.clone(),
            self.gender.clone(),
            self.birth_date.clone(),
            self.relation.clone(),
            self.home_phone.clone(),
            self.mobile_phone.clone(),
            self.email.clone(),
        ]);
    }
}

/// Consolidated output row for one student.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergedRecord {
    pub student: FullName,
    pub gender: String,
    pub birth_date: String,
    pub file_number: String,
    pub admission_date: String,
    pub class_label: String,
    // Not present in class rosters; written empty.
    pub enrollment_date: String,
    pub order_number: String,
    pub order_date: String,
    pub guardian1: Guardian,
    pub guardian2: Guardian,
}

impl MergedRecord {
    /// New record from the first row seen for a student. The row's guardian
    /// takes slot 1.
    pub fn from_first_row(row: &SourceRow, class_label: &str, rules: &GenderRules) -> Self {
        Self {
            student: split_full_name(&row.student_name),
            gender: row.student_gender.clone(),
            birth_date: extract_date(&row.student_birth_date),
            file_number: row.file_number.clone(),
            admission_date: extract_date(&row.admission_date),
            class_label: class_label.to_string(),
            guardian1: Guardian::from_row(row, rules),
            ..Default::default()
        }
    }

    /// The record as a target-table row, in `TARGET_HEADER` order.
    pub fn to_row(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(TARGET_COLUMNS);
        out.extend([
            self.student.surname.clone(),
            self.student.given.clone(),
            self.student.patronymic.clone(),
            self.gender.clone(),
            self.birth_date.clone(),
            self.file_number.clone(),
            self.admission_date.clone(),
            self.class_label.clone(),
            self.enrollment_date.clone(),
            self.order_number.clone(),
            self.order_date.clone(),
        ]);
        self.guardian1.push_cells(&mut out);
        self.guardian2.push_cells(&mut out);
        out
    }
}
