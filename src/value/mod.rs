//! Cell values
//!
//! Rows hold `sea_query::Value`s. This module provides:
//! - Null detection and per-type null values ([`types`])
//! - Checking/coercing a value against a column definition ([`types::conform`])
//! - JSON encoding keyed by column type, used by store snapshots ([`json`])

pub mod json;
pub mod types;

pub use json::{from_json, to_json};
pub use types::{conform, is_null, null_of};
