//! LLM-as-judge grading of assistant answers.
//!
//! A judge model scores an answer against the question and an optional
//! ground truth on accuracy, relevance and coherence. Scores are parsed from
//! a JSON object when the judge returns one, falling back to `key: value`
//! pairs in free text.

mod grader;

pub use grader::{Grader, OpenAIGrader};

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Score keys the judge must return.
pub const SCORE_KEYS: [&str; 3] = ["accuracy", "relevance", "coherence"];

static SCORE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(accuracy|relevance|coherence)\b\s*[:=]\s*(-?\d+(?:\.\d+)?)")
        .expect("valid score regex")
});

pub const GRADER_SYSTEM_PROMPT: &str = "You are an impartial grading assistant for a course-planning chatbot. \
Follow the evaluation rubric exactly and respond with a single JSON object containing only the keys \
accuracy, relevance, and coherence. Round each score to one decimal place and do not include any extra \
commentary, markdown, or prose.";

const GRADER_USER_TEMPLATE: &str = r#"Evaluate the chatbot's response to a given academic query.

QUESTION:
{{question}}

GROUND TRUTH:
{{ground_truth}}

PREDICTED ANSWER:
{{answer}}

---

### Evaluation Criteria (0-1 for each)
1. **Accuracy (0-1):** How correctly does the chatbot understand the user and provide the right information? Compare the response to the ground truth where one is given.

2. **Relevance (0-1):** Does the response directly answer the question or address the user's needs?

3. **Fluency and Coherence (0-1):** Is the response grammatically correct, easy to understand, and logically structured?

---

Each score must be between 0 and 1, using increments of 0.1.

### Output Format
Return only a single JSON object with numeric scores rounded to one decimal place:

{"accuracy": <score>, "relevance": <score>, "coherence": <score>}"#;

/// Render the judge's user prompt.
pub fn grader_prompt(question: &str, ground_truth: Option<&str>, answer: &str) -> String {
    let ground_truth = ground_truth
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .unwrap_or("[ground truth not provided]");
    let answer = match answer.trim() {
        "" => "[no answer provided]",
        a => a,
    };

    GRADER_USER_TEMPLATE
        .replace("{{question}}", question.trim())
        .replace("{{ground_truth}}", ground_truth)
        .replace("{{answer}}", answer)
}

/// Scores recovered from a judge reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedScores {
    /// Each usable score, rounded to one decimal and clamped to `[0, 1]`.
    pub scores: BTreeMap<String, f64>,
    /// Missing or non-numeric keys, if any.
    pub error: Option<String>,
    pub used_regex_fallback: bool,
}

/// Outcome of grading one answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Evaluation {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub scores: BTreeMap<String, f64>,
    /// Sum of the available scores, rounded to one decimal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub grader_prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

impl Evaluation {
    /// Build an evaluation from the judge's raw reply.
    pub fn from_response(grader_prompt: String, raw: &str) -> Self {
        let parsed = parse_scores(raw);
        let total = (!parsed.scores.is_empty()).then(|| round1(parsed.scores.values().sum()));

        Self {
            scores: parsed.scores,
            total,
            error: parsed.error,
            grader_prompt,
            raw_response: Some(raw.trim().to_string()),
        }
    }

    /// An evaluation whose judge call failed.
    pub fn failed(grader_prompt: String, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            grader_prompt,
            ..Self::default()
        }
    }
}

/// Parse judge scores: a JSON object first, then `key: number` pairs.
pub fn parse_scores(text: &str) -> ParsedScores {
    let (raw_values, used_regex_fallback) = match extract_json_object(text) {
        Some(object) => (
            object
                .into_iter()
                .map(|(k, v)| (k.to_lowercase(), v))
                .collect::<BTreeMap<_, _>>(),
            false,
        ),
        None => {
            let mut values = BTreeMap::new();
            for caps in SCORE_RE.captures_iter(text) {
                values.insert(caps[1].to_lowercase(), Value::String(caps[2].to_string()));
            }
            (values, true)
        }
    };

    let mut scores = BTreeMap::new();
    let mut missing = Vec::new();
    let mut invalid = Vec::new();

    for key in SCORE_KEYS {
        match raw_values.get(key) {
            None | Some(Value::Null) => missing.push(key),
            Some(value) => match numeric(value) {
                Some(n) => {
                    scores.insert(key.to_string(), round1(n).clamp(0.0, 1.0));
                }
                None => invalid.push(key),
            },
        }
    }

    let mut parts = Vec::new();
    if !invalid.is_empty() {
        invalid.sort_unstable();
        parts.push(format!("Invalid numeric value for: {}", invalid.join(", ")));
    }
    if !missing.is_empty() {
        missing.sort_unstable();
        parts.push(format!("Missing scores for: {}", missing.join(", ")));
    }
    if scores.is_empty() {
        parts.push("Grader response did not contain usable scores.".to_string());
    }

    ParsedScores {
        scores,
        error: (!parts.is_empty()).then(|| parts.join(" ")),
        used_regex_fallback,
    }
}

/// The whole text as a JSON object, or the span from the first `{` to the last `}`.
fn extract_json_object(text: &str) -> Option<Map<String, Value>> {
    let candidate = text.trim();
    if candidate.is_empty() {
        return None;
    }
    if let Ok(Value::Object(object)) = serde_json::from_str(candidate) {
        return Some(object);
    }

    let start = candidate.find('{')?;
    let end = candidate.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str(&candidate[start..=end]) {
        Ok(Value::Object(object)) => Some(object),
        _ => None,
    }
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
