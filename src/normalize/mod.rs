// src/normalize/mod.rs
//! Pure cell-level conversions applied to every source row before merging.

pub mod date;
pub mod gender;

pub use date::extract_date;
pub use gender::{Gender, GenderRules};

/// A person's name split into its three positional components.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, serde::Serialize)]
pub struct FullName {
    pub surname: String,
    pub given: String,
    pub patronymic: String,
}

impl FullName {
    pub fn is_empty(&self) -> bool {
        self.surname.is_empty() && self.given.is_empty() && self.patronymic.is_empty()
    }
}

/// Split on whitespace into (surname, given, patronymic). Missing parts are
/// empty, tokens past the third are ignored.
pub fn split_full_name(text: &str) -> FullName {
    let mut parts = text.split_whitespace().map(str::to_string);
    FullName {
        surname: parts.next().unwrap_or_default(),
        given: parts.next().unwrap_or_default(),
        patronymic: parts.next().unwrap_or_default(),
    }
}

/// Missing cell → empty string, anything else → its trimmed text.
pub fn normalize_value(cell: Option<&str>) -> String {
    cell.map(|c| c.trim().to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_name_three_parts() {
        let n = split_full_name("  Ivanov   Petr Ivanovich ");
        assert_eq!(n.surname, "Ivanov");
        assert_eq!(n.given, "Petr");
        assert_eq!(n.patronymic, "Ivanovich");
    }

    #[test]
    fn full_name_pads_and_truncates() {
        let short = split_full_name("Ivanov");
        assert_eq!(
            short,
            FullName {
                surname: "Ivanov".into(),
                ..Default::default()
            }
        );

        let long = split_full_name("Ivanov Petr Ivanovich ogly extra");
        assert_eq!(long.patronymic, "Ivanovich");

        assert!(split_full_name("   ").is_empty());
    }

    #[test]
    fn normalize_value_handles_missing() {
        assert_eq!(normalize_value(None), "");
        assert_eq!(normalize_value(Some("  a b ")), "a b");
        assert_eq!(normalize_value(Some("")), "");
    }
}
