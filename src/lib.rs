// src/lib.rs
//! Consolidate per-class student rosters (one row per student/guardian pair)
//! into one record per student and append them to a fixed-schema table.

pub mod config;
pub mod error;
pub mod merge;
pub mod normalize;
pub mod run;
pub mod source;
pub mod stats;
pub mod target;

pub use config::Config;
pub use error::{MergeError, MergeResult};
pub use run::{discover_sources, run, RunContext, RunReport};
