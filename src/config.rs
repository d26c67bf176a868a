// src/config.rs
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fs, path::Path};

use crate::error::{MergeError, MergeResult};

/// Tunables for filtering and normalization. Every key is optional in the
/// YAML file; missing keys keep their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Exact (trimmed) cell texts that mark a row as a repeated header line.
    pub header_keywords: Vec<String>,
    /// Rows with fewer non-empty cells than this are dropped.
    pub min_populated_cells: usize,
    pub female_relations: Vec<String>,
    pub male_relations: Vec<String>,
    pub female_label: String,
    pub male_label: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            header_keywords: strings(&[
                "Full Name",
                "Gender",
                "File Number",
                "Guardian Full Name",
                "Guardian Type",
                "Guardian Phone",
                "ФИО",
                "Пол",
                "Личное дело №",
                "ФИО представителя",
                "Тип представителя",
                "Телефон представителя",
            ]),
            min_populated_cells: 5,
            female_relations: strings(&[
                "mother",
                "grandmother",
                "sister",
                "aunt",
                "мать",
                "бабушка",
                "сестра",
                "тётя",
                "тетя",
            ]),
            male_relations: strings(&[
                "father",
                "grandfather",
                "brother",
                "uncle",
                "отец",
                "дедушка",
                "брат",
                "дядя",
            ]),
            female_label: "F".into(),
            male_label: "M".into(),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Config {
    /// Load a YAML config file, falling back to defaults for absent keys.
    pub fn load<P: AsRef<Path>>(path: P) -> MergeResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| MergeError::Config(format!("reading {}: {}", path.display(), e)))?;
        let cfg: Config = serde_yaml::from_str(&text)
            .map_err(|e| MergeError::Config(format!("parsing {}: {}", path.display(), e)))?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> MergeResult<()> {
        if self.female_label.trim().is_empty() || self.male_label.trim().is_empty() {
            return Err(MergeError::Config("gender labels must not be empty".into()));
        }
        let female: HashSet<String> = self.female_relations.iter().map(|r| fold(r)).collect();
        if let Some(both) = self.male_relations.iter().find(|r| female.contains(&fold(r))) {
            return Err(MergeError::Config(format!(
                "relation `{}` is listed as both female and male",
                both
            )));
        }
        Ok(())
    }

    /// Header keywords, trimmed, for exact-match lookups.
    pub fn header_set(&self) -> HashSet<String> {
        self.header_keywords
            .iter()
            .map(|k| k.trim().to_string())
            .collect()
    }
}

/// Lower-case + trim, the comparison form of relation words.
pub(crate) fn fold(s: &str) -> String {
    s.trim().to_lowercase()
}
