//! Typed capability calls and their request/result envelopes.

use crate::catalogue::{normalize_code, validate_acad_year};
use crate::error::{ModplanError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Capabilities the planner may request.
#[derive(Debug, Clone, PartialEq)]
pub enum Capability {
    /// Module metadata without schedule detail.
    ModuleOverview {
        module_code: String,
        acad_year: Option<String>,
    },

    /// Prerequisite, preclusion and fulfilment structure.
    ModulePrerequisites {
        module_code: String,
        acad_year: Option<String>,
    },

    /// Lesson blocks, optionally for one semester.
    ModuleTimetable {
        module_code: String,
        acad_year: Option<String>,
        semester: Option<u8>,
        limit_lessons: Option<usize>,
    },

    /// Keyword search over the module list.
    ModuleSearch {
        query: String,
        acad_year: Option<String>,
        level: Option<u8>,
        limit: usize,
    },
}

const DEFAULT_SEARCH_LIMIT: usize = 10;

impl Capability {
    /// Wire name of this capability.
    pub fn name(&self) -> &'static str {
        match self {
            Capability::ModuleOverview { .. } => "module_overview",
            Capability::ModulePrerequisites { .. } => "module_prerequisites",
            Capability::ModuleTimetable { .. } => "module_timetable",
            Capability::ModuleSearch { .. } => "module_search",
        }
    }
}

/// A planner's request to run one capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityRequest {
    /// Call id assigned by the planner, echoed back in the result.
    pub id: String,
    pub name: String,
    /// Arguments as sent by the planner. Unparseable payloads arrive as a JSON string.
    pub arguments: Value,
}

impl CapabilityRequest {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// Outcome of running one capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CapabilityOutcome {
    Success { output: Value },
    Error { kind: String, message: String },
}

/// Result paired with the request that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityResult {
    pub call_id: String,
    pub name: String,
    pub outcome: CapabilityOutcome,
}

impl CapabilityResult {
    pub fn success(request: &CapabilityRequest, output: Value) -> Self {
        Self {
            call_id: request.id.clone(),
            name: request.name.clone(),
            outcome: CapabilityOutcome::Success { output },
        }
    }

    pub fn failure(request: &CapabilityRequest, error: &ModplanError) -> Self {
        Self {
            call_id: request.id.clone(),
            name: request.name.clone(),
            outcome: CapabilityOutcome::Error {
                kind: error.kind().to_string(),
                message: error.to_string(),
            },
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, CapabilityOutcome::Error { .. })
    }

    /// Text handed back to the planner as the tool message body.
    pub fn to_content(&self) -> String {
        match &self.outcome {
            CapabilityOutcome::Success { output } => output.to_string(),
            CapabilityOutcome::Error { kind, message } => json!({
                "error": { "kind": kind, "message": message }
            })
            .to_string(),
        }
    }
}

/// Decode a planner request into a typed capability.
pub fn parse_capability(request: &CapabilityRequest) -> Result<Capability> {
    let args = match &request.arguments {
        Value::Object(map) => map.clone(),
        Value::Null => Map::new(),
        other => {
            return Err(ModplanError::Validation(format!(
                "Arguments for '{}' must be a JSON object, got: {}",
                request.name, other
            )))
        }
    };

    match request.name.as_str() {
        "module_overview" => Ok(Capability::ModuleOverview {
            module_code: module_code_arg(&args)?,
            acad_year: acad_year_arg(&args)?,
        }),
        "module_prerequisites" => Ok(Capability::ModulePrerequisites {
            module_code: module_code_arg(&args)?,
            acad_year: acad_year_arg(&args)?,
        }),
        "module_timetable" => Ok(Capability::ModuleTimetable {
            module_code: module_code_arg(&args)?,
            acad_year: acad_year_arg(&args)?,
            semester: ranged_arg(&args, "semester", 1, 4)?.map(|v| v as u8),
            limit_lessons: ranged_arg(&args, "limit_lessons", 1, 100)?.map(|v| v as usize),
        }),
        "module_search" => {
            let query = string_arg(&args, "query")?
                .filter(|q| !q.trim().is_empty())
                .ok_or_else(|| {
                    ModplanError::Validation("Missing 'query' argument".to_string())
                })?;
            Ok(Capability::ModuleSearch {
                query,
                acad_year: acad_year_arg(&args)?,
                level: ranged_arg(&args, "level", 0, 9)?.map(|v| v as u8),
                limit: ranged_arg(&args, "limit", 1, 50)?
                    .map(|v| v as usize)
                    .unwrap_or(DEFAULT_SEARCH_LIMIT),
            })
        }
        other => Err(ModplanError::Validation(format!("Unknown capability: {}", other))),
    }
}

fn string_arg(args: &Map<String, Value>, key: &str) -> Result<Option<String>> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(ModplanError::Validation(format!(
            "'{}' must be a string, got: {}",
            key, other
        ))),
    }
}

fn module_code_arg(args: &Map<String, Value>) -> Result<String> {
    let raw = string_arg(args, "module_code")?
        .ok_or_else(|| ModplanError::Validation("Missing 'module_code' argument".to_string()))?;
    normalize_code(&raw)
}

fn acad_year_arg(args: &Map<String, Value>) -> Result<Option<String>> {
    match string_arg(args, "acad_year")? {
        Some(year) if !year.trim().is_empty() => {
            let year = year.trim().to_string();
            validate_acad_year(&year)?;
            Ok(Some(year))
        }
        _ => Ok(None),
    }
}

/// Integer argument within `[min, max]`.
///
/// Models often quote numbers or emit `1.0`, so numeric strings and
/// integral floats are accepted.
fn ranged_arg(args: &Map<String, Value>, key: &str, min: u64, max: u64) -> Result<Option<u64>> {
    let value = match args.get(key) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_u64().or_else(|| n.as_f64().and_then(integral)),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        Some(_) => None,
    };

    match value {
        Some(v) if (min..=max).contains(&v) => Ok(Some(v)),
        _ => Err(ModplanError::Validation(format!(
            "'{}' must be an integer between {} and {}, got: {}",
            key, min, max, args[key]
        ))),
    }
}

fn integral(f: f64) -> Option<u64> {
    (f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64).then_some(f as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, arguments: Value) -> CapabilityRequest {
        CapabilityRequest::new("call_1", name, arguments)
    }

    #[test]
    fn test_parse_timetable() {
        let tool = parse_capability(&request(
            "module_timetable",
            json!({"module_code": "dsa4213", "semester": "1"}),
        ))
        .unwrap();

        match tool {
            Capability::ModuleTimetable {
                module_code,
                acad_year,
                semester,
                limit_lessons,
            } => {
                assert_eq!(module_code, "DSA4213");
                assert_eq!(acad_year, None);
                assert_eq!(semester, Some(1));
                assert_eq!(limit_lessons, None);
            }
            _ => panic!("Expected ModuleTimetable capability"),
        }
    }

    #[test]
    fn test_parse_search_defaults() {
        let tool = parse_capability(&request(
            "module_search",
            json!({"query": "data", "level": 2}),
        ))
        .unwrap();

        assert_eq!(
            tool,
            Capability::ModuleSearch {
                query: "data".to_string(),
                acad_year: None,
                level: Some(2),
                limit: 10,
            }
        );
        assert_eq!(tool.name(), "module_search");
    }

    #[test]
    fn test_parse_rejects_bad_arguments() {
        let cases = [
            request("module_overview", json!({})),
            request("module_overview", json!({"module_code": 2040})),
            request("module_overview", json!({"module_code": "CS2040", "acad_year": "2025"})),
            request("module_timetable", json!({"module_code": "CS2040", "semester": 7})),
            request("module_search", json!({"query": "  "})),
            request("module_search", json!({"query": "data", "limit": 0})),
            request("module_timetable", json!({"module_code": "CS2040", "semester": 1.5})),
            request("module_overview", Value::String("{not json".to_string())),
            request("weather_lookup", json!({})),
        ];

        for case in cases {
            let err = parse_capability(&case).unwrap_err();
            assert!(
                matches!(err, ModplanError::Validation(_)),
                "expected validation error for {:?}",
                case
            );
        }
    }

    #[test]
    fn test_integral_floats_accepted() {
        let tool = parse_capability(&request(
            "module_timetable",
            json!({"module_code": "CS2040", "semester": 1.0, "limit_lessons": "5.0"}),
        ))
        .unwrap();
        assert_eq!(
            tool,
            Capability::ModuleTimetable {
                module_code: "CS2040".to_string(),
                acad_year: None,
                semester: Some(1),
                limit_lessons: Some(5),
            }
        );
    }

    #[test]
    fn test_null_year_is_default() {
        let tool = parse_capability(&request(
            "module_prerequisites",
            json!({"module_code": "CS2040", "acad_year": null}),
        ))
        .unwrap();
        assert_eq!(
            tool,
            Capability::ModulePrerequisites {
                module_code: "CS2040".to_string(),
                acad_year: None,
            }
        );
    }

    #[test]
    fn test_result_content() {
        let req = request("module_overview", json!({"module_code": "ZZ9999"}));
        let result = CapabilityResult::failure(&req, &ModplanError::NotFound("ZZ9999".into()));
        assert!(result.is_error());

        let content: Value = serde_json::from_str(&result.to_content()).unwrap();
        assert_eq!(content["error"]["kind"], "not_found");
        assert_eq!(result.call_id, "call_1");

        let ok = CapabilityResult::success(&req, json!({"moduleCode": "CS2040"}));
        assert_eq!(ok.to_content(), r#"{"moduleCode":"CS2040"}"#);
    }
}
