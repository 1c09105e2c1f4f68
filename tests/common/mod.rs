//! Shared fixtures: a mock catalogue server and a scripted planner.

#![allow(dead_code)]

use async_trait::async_trait;
use modplan::capability::{CapabilityExecutor, CapabilityRequest, CapabilitySet};
use modplan::catalogue::CatalogueClient;
use modplan::config::CatalogueSettings;
use modplan::conversation::{Assistant, Message, PlanStep, Planner};
use modplan::{ModplanError, Result};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const YEAR: &str = "2025-2026";

pub fn catalogue_settings(base_url: &str) -> CatalogueSettings {
    CatalogueSettings {
        base_url: base_url.to_string(),
        acad_year: YEAR.to_string(),
        timeout_secs: 5,
        max_lessons: 20,
    }
}

pub fn catalogue_client(server: &MockServer) -> Arc<CatalogueClient> {
    Arc::new(CatalogueClient::new(&catalogue_settings(&server.uri())).expect("valid settings"))
}

pub fn dsa4213() -> Value {
    json!({
        "moduleCode": "DSA4213",
        "title": "Natural Language Processing for Data Science",
        "description": "Text representation, language models and applications.",
        "moduleCredit": "4",
        "department": "Statistics and Data Science",
        "faculty": "Science",
        "prerequisite": "DSA3102 or CS3244",
        "preclusion": "CS4248",
        "prerequisiteTree": {"or": ["DSA3102", "CS3244"]},
        "semesterData": [
            {
                "semester": 1,
                "examDate": "2025-11-27T05:00:00.000Z",
                "examDuration": 120,
                "timetable": [
                    {"classNo": "1", "startTime": "1000", "endTime": "1200", "weeks": [1,2,3,4,5,6,7,8,9,10,11,12,13], "venue": "LT27", "day": "Monday", "lessonType": "Lecture", "size": 180},
                    {"classNo": "01", "startTime": "1400", "endTime": "1500", "weeks": [3,4,5,6,7,8,9,10,11,12,13], "venue": "S16-0430", "day": "Wednesday", "lessonType": "Tutorial", "size": 30}
                ]
            },
            {
                "semester": 2,
                "timetable": [
                    {"classNo": "1", "startTime": "0900", "endTime": "1100", "venue": "LT28", "day": "Friday", "lessonType": "Lecture"}
                ]
            }
        ]
    })
}

pub fn module_list() -> Value {
    json!([
        {"moduleCode": "CS2040", "title": "Data Structures and Algorithms", "semesters": [1, 2]},
        {"moduleCode": "DSA1101", "title": "Introduction to Data Science", "semesters": [1, 2]},
        {"moduleCode": "DSA2101", "title": "Essential Data Analytics Tools: Data Visualisation", "semesters": [1]},
        {"moduleCode": "DSA2102", "title": "Essential Data Analytics Tools: Numerical Computation", "semesters": [2]},
        {"moduleCode": "DSA4213", "title": "Natural Language Processing for Data Science", "semesters": [1, 2]},
        {"moduleCode": "ST2334", "title": "Probability and Statistics", "semesters": [1, 2]}
    ])
}

pub async fn mount_module(server: &MockServer, code: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/{}/modules/{}.json", YEAR, code)))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

pub async fn mount_missing(server: &MockServer, code: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/{}/modules/{}.json", YEAR, code)))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;
}

pub fn request(id: &str, name: &str, arguments: Value) -> CapabilityRequest {
    CapabilityRequest::new(id, name, arguments)
}

/// Plays back a fixed script of plan steps and records what it was shown.
///
/// Once the script runs out the last step is repeated.
pub struct ScriptedPlanner {
    steps: Mutex<VecDeque<PlanStep>>,
    last: Mutex<Option<PlanStep>>,
    seen: Mutex<Vec<Vec<Message>>>,
    prompts: Mutex<Vec<String>>,
    failure: Option<String>,
}

impl ScriptedPlanner {
    pub fn new(steps: Vec<PlanStep>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            last: Mutex::new(None),
            seen: Mutex::new(Vec::new()),
            prompts: Mutex::new(Vec::new()),
            failure: None,
        })
    }

    /// A planner whose every call fails like an unreachable model endpoint.
    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(VecDeque::new()),
            last: Mutex::new(None),
            seen: Mutex::new(Vec::new()),
            prompts: Mutex::new(Vec::new()),
            failure: Some(message.to_string()),
        })
    }

    /// System prompts passed to each `plan` call, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    /// Histories passed to each `plan` call, in order.
    pub fn seen(&self) -> Vec<Vec<Message>> {
        self.seen.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl Planner for ScriptedPlanner {
    async fn plan(
        &self,
        system_prompt: &str,
        history: &[Message],
        _capabilities: &CapabilitySet,
    ) -> Result<PlanStep> {
        self.seen.lock().unwrap().push(history.to_vec());
        self.prompts.lock().unwrap().push(system_prompt.to_string());

        if let Some(message) = &self.failure {
            return Err(ModplanError::OpenAI(message.clone()));
        }

        let next = self.steps.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        match next {
            Some(step) => {
                *last = Some(step.clone());
                Ok(step)
            }
            None => Ok(last
                .clone()
                .unwrap_or_else(|| PlanStep::Answer(String::new()))),
        }
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

pub fn assistant(server: &MockServer, planner: Arc<ScriptedPlanner>) -> Assistant {
    let executor = CapabilityExecutor::new(catalogue_client(server), 20);
    Assistant::new(
        planner,
        executor,
        Arc::new(CapabilitySet::standard(20)),
        "You are a test planner.",
    )
}
