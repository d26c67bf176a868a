// src/source/row.rs
use serde::Serialize;

use super::filter::RowRejection;
use crate::normalize::normalize_value;

// Column positions of a class roster export. One row per student/guardian pair.
pub const FILE_NUMBER: usize = 0;
pub const ADMISSION_DATE: usize = 1;
pub const STUDENT_NAME: usize = 2;
pub const STUDENT_GENDER: usize = 3;
pub const STUDENT_BIRTH_DATE: usize = 4;
pub const GUARDIAN_RELATION: usize = 6;
pub const GUARDIAN_NAME: usize = 8;
pub const GUARDIAN_BIRTH_DATE: usize = 9;
pub const GUARDIAN_PHONE: usize = 12;
pub const GUARDIAN_EMAIL: usize = 13;

/// Minimum number of cells a roster row must carry.
pub const SOURCE_WIDTH: usize = GUARDIAN_EMAIL + 1;

/// One roster row with its cells resolved to named, trimmed fields.
/// Date columns keep their raw text; dates are extracted during merging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceRow {
    pub file_number: String,
    pub admission_date: String,
    pub student_name: String,
    pub student_gender: String,
    pub student_birth_date: String,
    pub guardian_relation: String,
    pub guardian_name: String,
    pub guardian_birth_date: String,
    pub guardian_phone: String,
    pub guardian_email: String,
}

impl SourceRow {
    pub fn from_cells(cells: &[String]) -> Result<Self, RowRejection> {
        if cells.len() < SOURCE_WIDTH {
            return Err(RowRejection::Narrow { width: cells.len() });
        }
        let cell = |i: usize| normalize_value(cells.get(i).map(String::as_str));
        Ok(Self {
            file_number: cell(FILE_NUMBER),
            admission_date: cell(ADMISSION_DATE),
            student_name: cell(STUDENT_NAME),
            student_gender: cell(STUDENT_GENDER),
            student_birth_date: cell(STUDENT_BIRTH_DATE),
            guardian_relation: cell(GUARDIAN_RELATION),
            guardian_name: cell(GUARDIAN_NAME),
            guardian_birth_date: cell(GUARDIAN_BIRTH_DATE),
            guardian_phone: cell(GUARDIAN_PHONE),
            guardian_email: cell(GUARDIAN_EMAIL),
        })
    }
}
