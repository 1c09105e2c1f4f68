//! Course catalogue access.
//!
//! Types mirror the NUSMods v2 JSON layout. Every optional field tolerates
//! absence so partially populated records still decode.

mod client;

pub use client::CatalogueClient;

use crate::error::{ModplanError, Result};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::sync::LazyLock;

static ACAD_YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})-(\d{4})$").expect("valid academic year regex"));

/// A single module's full record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CatalogueEntry {
    pub module_code: String,
    pub title: String,
    pub description: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub module_credit: Option<String>,
    pub department: Option<String>,
    pub faculty: Option<String>,
    /// Weekly workload; upstream sends either a list of hours or free text.
    pub workload: Option<Value>,
    pub prerequisite: Option<String>,
    pub preclusion: Option<String>,
    pub corequisite: Option<String>,
    pub prerequisite_tree: Option<Value>,
    pub fulfill_requirements: Vec<String>,
    pub semester_data: Vec<SemesterData>,
}

/// Offering of a module in one semester.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SemesterData {
    pub semester: u8,
    pub exam_date: Option<String>,
    pub exam_duration: Option<u32>,
    pub timetable: Vec<ScheduleBlock>,
}

/// One timetable slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScheduleBlock {
    pub class_no: String,
    pub day: String,
    pub start_time: String,
    pub end_time: String,
    pub venue: String,
    pub lesson_type: String,
    /// Teaching staff; the public feed usually omits this.
    pub staff: Vec<String>,
    /// Teaching weeks, either a list of week numbers or a date range object.
    pub weeks: Option<Value>,
    pub size: Option<u32>,
}

/// Entry in the per-year module list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModuleSummary {
    pub module_code: String,
    pub title: String,
    pub semesters: Vec<u8>,
}

/// The full module list for one academic year, in catalogue order.
pub type CatalogueIndex = Vec<ModuleSummary>;

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Normalise a module code: trim, uppercase, drop anything not alphanumeric.
pub fn normalize_code(raw: &str) -> Result<String> {
    let code: String = raw
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if code.is_empty() {
        return Err(ModplanError::Validation(
            "module_code is required".to_string(),
        ));
    }
    Ok(code)
}

/// Level of a module: the first digit of its numeric component.
pub fn module_level(code: &str) -> Option<u8> {
    code.chars()
        .find(|c| c.is_ascii_digit())
        .and_then(|c| c.to_digit(10))
        .map(|d| d as u8)
}

/// Check that an academic year looks like `2025-2026`.
pub fn validate_acad_year(year: &str) -> Result<()> {
    let invalid = || {
        ModplanError::Validation(format!(
            "acad_year must follow the YYYY-YYYY format (for example 2024-2025), got '{}'",
            year
        ))
    };

    let caps = ACAD_YEAR_RE.captures(year).ok_or_else(invalid)?;
    let start: u32 = caps[1].parse().map_err(|_| invalid())?;
    let end: u32 = caps[2].parse().map_err(|_| invalid())?;
    if end != start + 1 {
        return Err(invalid());
    }
    Ok(())
}
