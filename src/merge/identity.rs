// src/merge/identity.rs
use serde::Serialize;
use std::fmt;

use crate::normalize::{split_full_name, FullName};

/// Merge key for a student: surname, given name and patronymic joined by
/// single spaces, missing parts left empty (`"Ivanov Petr "`).
///
/// Depends on nothing but the name, so the same student gets the same key
/// in every table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct StudentIdentity(String);

impl StudentIdentity {
    pub fn from_name(name: &FullName) -> Self {
        StudentIdentity(format!(
            "{} {} {}",
            name.surname, name.given, name.patronymic
        ))
    }

    pub fn from_text(full_name: &str) -> Self {
        Self::from_name(&split_full_name(full_name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StudentIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
