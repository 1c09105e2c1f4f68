mod common;

use async_trait::async_trait;
use common::{assistant, ScriptedPlanner};
use modplan::cli::commands::router;
use modplan::conversation::{PlanStep, SessionStore};
use modplan::grading::{Evaluation, Grader};
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::MockServer;

/// Grades by echoing a fixed judge reply through the score parser.
struct FixedGrader(&'static str);

#[async_trait]
impl Grader for FixedGrader {
    async fn grade(&self, question: &str, ground_truth: Option<&str>, answer: &str) -> Evaluation {
        let prompt = modplan::grading::grader_prompt(question, ground_truth, answer);
        Evaluation::from_response(prompt, self.0)
    }

    fn model(&self) -> &str {
        "fixed-judge"
    }
}

async fn spawn_api(planner: Arc<ScriptedPlanner>) -> (String, MockServer) {
    let (base, catalogue, _) = spawn_with(planner, None).await;
    (base, catalogue)
}

async fn spawn_with(
    planner: Arc<ScriptedPlanner>,
    grader: Option<Arc<dyn Grader>>,
) -> (String, MockServer, Arc<SessionStore>) {
    let catalogue = MockServer::start().await;
    let sessions = Arc::new(SessionStore::new());
    let app = router(
        Arc::new(assistant(&catalogue, planner)),
        sessions.clone(),
        grader,
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), catalogue, sessions)
}

#[tokio::test]
async fn chat_session_lifecycle() {
    let planner = ScriptedPlanner::new(vec![PlanStep::Answer("Happy to help.".into())]);
    let (base, _catalogue) = spawn_api(planner).await;
    let http = reqwest::Client::new();

    let health: Value = http
        .get(format!("{}/health", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");

    let first: Value = http
        .post(format!("{}/api/chat", base))
        .json(&json!({"prompt": "Hi there", "developer_view": true}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(first["answer"], "Happy to help.");
    assert_eq!(first["history"].as_array().unwrap().len(), 2);
    assert_eq!(first["developer_view"]["configuration"]["model"], "scripted");
    assert_eq!(first["developer_view"]["model_input"].as_array().unwrap().len(), 1);

    let session_id = first["session_id"].as_str().unwrap().to_string();

    let second: Value = http
        .post(format!("{}/api/chat", base))
        .json(&json!({"prompt": "Thanks", "session_id": session_id}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(second["history"].as_array().unwrap().len(), 4);
    assert!(second.get("developer_view").is_none());

    let reset = http
        .post(format!("{}/api/reset", base))
        .json(&json!({"session_id": session_id}))
        .send()
        .await
        .unwrap();
    assert!(reset.status().is_success());

    let stored: Value = http
        .get(format!("{}/api/sessions/{}", base, session_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(stored["history"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn rejects_blank_prompt_and_unknown_session() {
    let planner = ScriptedPlanner::new(vec![PlanStep::Answer("unused".into())]);
    let (base, _catalogue) = spawn_api(planner.clone()).await;
    let http = reqwest::Client::new();

    let blank = http
        .post(format!("{}/api/chat", base))
        .json(&json!({"prompt": "   "}))
        .send()
        .await
        .unwrap();
    assert_eq!(blank.status(), reqwest::StatusCode::BAD_REQUEST);

    let unknown = http
        .post(format!("{}/api/chat", base))
        .json(&json!({"prompt": "hello", "session_id": "6f1c2d4e-8a9b-4c3d-9e2f-1a2b3c4d5e6f"}))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status(), reqwest::StatusCode::NOT_FOUND);

    assert_eq!(planner.calls(), 0);
}

#[tokio::test]
async fn failed_turn_does_not_leak_new_sessions() {
    let planner = ScriptedPlanner::failing("connection refused");
    let (base, _catalogue, sessions) = spawn_with(planner.clone(), None).await;
    let http = reqwest::Client::new();

    for _ in 0..3 {
        let response = http
            .post(format!("{}/api/chat", base))
            .json(&json!({"prompt": "When is CS2040?"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);

        let body: Value = response.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("connection refused"));
        assert!(body.get("session_id").is_none());
    }

    assert_eq!(planner.calls(), 3);
    assert_eq!(sessions.len(), 0);
}

#[tokio::test]
async fn failed_turn_on_existing_session_reports_its_id() {
    let planner = ScriptedPlanner::failing("model overloaded");
    let (base, _catalogue, sessions) = spawn_with(planner, None).await;
    let http = reqwest::Client::new();
    let (id, _) = sessions.create();

    let body: Value = http
        .post(format!("{}/api/chat", base))
        .json(&json!({"prompt": "Hello", "session_id": id}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["session_id"], id.to_string());
    assert_eq!(sessions.len(), 1);

    let deleted = http
        .delete(format!("{}/api/sessions/{}", base, id))
        .send()
        .await
        .unwrap();
    assert!(deleted.status().is_success());
    assert!(sessions.is_empty());

    let again = http
        .delete(format!("{}/api/sessions/{}", base, id))
        .send()
        .await
        .unwrap();
    assert_eq!(again.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn per_request_system_prompt_reaches_planner() {
    let planner = ScriptedPlanner::new(vec![PlanStep::Answer("Noted.".into())]);
    let (base, _catalogue) = spawn_api(planner.clone()).await;
    let http = reqwest::Client::new();

    let custom: Value = http
        .post(format!("{}/api/chat", base))
        .json(&json!({
            "prompt": "Plan my year",
            "system_prompt": "Answer in one sentence.",
            "developer_view": true
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        custom["developer_view"]["configuration"]["system_prompt"],
        "Answer in one sentence."
    );

    // The override applies to that turn only
    let session_id = custom["session_id"].as_str().unwrap().to_string();
    let response = http
        .post(format!("{}/api/chat", base))
        .json(&json!({"prompt": "And next year?", "session_id": session_id}))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    assert_eq!(
        planner.prompts(),
        vec!["Answer in one sentence.", "You are a test planner."]
    );
}

#[tokio::test]
async fn grade_endpoint_scores_answers() {
    let planner = ScriptedPlanner::new(vec![PlanStep::Answer("unused".into())]);
    let grader: Arc<dyn Grader> =
        Arc::new(FixedGrader(r#"{"accuracy": 0.9, "relevance": 1.2, "coherence": 0.75}"#));
    let (base, _catalogue, _) = spawn_with(planner, Some(grader)).await;
    let http = reqwest::Client::new();

    let graded: Value = http
        .post(format!("{}/api/grade", base))
        .json(&json!({
            "question": "What are the prerequisites of DSA4213?",
            "ground_truth": "DSA3102 or CS3244",
            "answer": "You need DSA3102 or CS3244."
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(graded["model"], "fixed-judge");
    assert_eq!(graded["scores"]["accuracy"], 0.9);
    assert_eq!(graded["scores"]["relevance"], 1.0);
    assert_eq!(graded["scores"]["coherence"], 0.8);
    assert_eq!(graded["total"], 2.7);
    assert!(graded["grader_prompt"]
        .as_str()
        .unwrap()
        .contains("DSA3102 or CS3244"));
}

#[tokio::test]
async fn grade_endpoint_without_grader_is_unavailable() {
    let planner = ScriptedPlanner::new(vec![PlanStep::Answer("unused".into())]);
    let (base, _catalogue) = spawn_api(planner).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/grade", base))
        .json(&json!({"question": "q", "answer": "a"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);
}
