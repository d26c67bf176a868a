// src/normalize/gender.rs
use std::collections::HashSet;

use crate::config::{fold, Config};

/// Gender inferred from a guardian's relation to the student.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Gender {
    Female,
    Male,
    /// Relation text not recognised. Not an error.
    Unknown,
}

/// Relation word sets and the labels written for each gender.
#[derive(Debug, Clone)]
pub struct GenderRules {
    female: HashSet<String>,
    male: HashSet<String>,
    female_label: String,
    male_label: String,
}

impl GenderRules {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            female: cfg.female_relations.iter().map(|r| fold(r)).collect(),
            male: cfg.male_relations.iter().map(|r| fold(r)).collect(),
            female_label: cfg.female_label.clone(),
            male_label: cfg.male_label.clone(),
        }
    }

    pub fn infer(&self, relation: &str) -> Gender {
        let rel = fold(relation);
        if self.female.contains(&rel) {
            Gender::Female
        } else if self.male.contains(&rel) {
            Gender::Male
        } else {
            Gender::Unknown
        }
    }

    pub fn label(&self, gender: Gender) -> &str {
        match gender {
            Gender::Female => &self.female_label,
            Gender::Male => &self.male_label,
            Gender::Unknown => "",
        }
    }

    /// `infer` followed by `label`.
    pub fn infer_label(&self, relation: &str) -> String {
        self.label(self.infer(relation)).to_string()
    }
}

impl Default for GenderRules {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
