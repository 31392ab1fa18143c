//! End-to-end debates over offline agents.

use std::sync::Arc;

use tribunal_core::{AgentId, Domain};
use tribunal_runtime::providers::offline_response;
use tribunal_runtime::{
    BackendKind, DebateRequest, DebateResponse, DebateService, DebateStore, JsonFileStore,
    MemoryStore, RuntimeConfig,
};

/// Two agents without credentials; `general` is restricted to them.
fn offline_config() -> RuntimeConfig {
    RuntimeConfig::from_yaml(
        r#"
agents:
  - id: A
    backend: openai
    model: gpt-4.1
    api_key_env: TRIBUNAL_IT_UNSET_KEY_A
  - id: B
    backend: groq
    model: llama3-70b-8192
    api_key_env: TRIBUNAL_IT_UNSET_KEY_B
routing:
  general: [A, B]
classifier: A
judge: A
request_timeout: 2s
"#,
    )
    .unwrap()
}

fn debate(question: &str) -> DebateRequest {
    DebateRequest {
        question: question.to_string(),
        use_improved: true,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_explain_gravity_offline() {
    let store = Arc::new(MemoryStore::new());
    let service = DebateService::from_config(&offline_config())
        .unwrap()
        .with_store(store.clone());

    let response = service.handle(debate("Explain gravity")).await.unwrap();
    let DebateResponse::Debated(report) = response else {
        panic!("expected a debate report");
    };

    assert_eq!(report.domain, Domain::General);
    assert_eq!(report.agents, vec![AgentId::from("A"), AgentId::from("B")]);
    assert_eq!(
        report.initial.get("A"),
        Some(offline_response(BackendKind::OpenAi, "gpt-4.1", "Explain gravity", None).as_str())
    );
    assert_eq!(
        report.initial.get("B"),
        Some(offline_response(BackendKind::Groq, "llama3-70b-8192", "Explain gravity", None).as_str())
    );

    let critique = report.critiques.get("A").unwrap();
    assert!(critique.contains("[A]"));
    assert!(critique.contains("[B]"));

    assert_eq!(report.winner.as_str(), "A");
    assert!(report.scoreboard.is_empty());
    assert_eq!(report.reason, "Judge fallback");
    assert_eq!(report.answer, report.initial.get("A").unwrap());

    let saved = store.load(&report.conversation_id).await.unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].prompt, "Explain gravity");
}

#[tokio::test]
async fn test_round_keys_match_selection() {
    let service = DebateService::from_config(&offline_config())
        .unwrap()
        .with_store(Arc::new(MemoryStore::new()));

    let DebateResponse::Debated(report) = service.handle(debate("What is entropy?")).await.unwrap()
    else {
        panic!("expected a debate report");
    };

    for round in [&report.initial, &report.critiques, &report.defenses] {
        let keys: Vec<_> = round.agents().cloned().collect();
        assert_eq!(keys, report.agents);
    }
    assert!(report.initial.contains(report.winner.as_str()));
}

#[tokio::test]
async fn test_offline_classifier_routes_general() {
    let service = DebateService::from_config(&offline_config()).unwrap();

    for question in ["Sort a vector in Rust", "Derivative of sin x", "Torque on a lever"] {
        assert_eq!(service.router().classify(question).await, Domain::General);
    }
}

#[tokio::test]
async fn test_short_question_asks_for_confirmation() {
    let store = Arc::new(MemoryStore::new());
    let service = DebateService::from_config(&offline_config())
        .unwrap()
        .with_store(store.clone());

    let response = service
        .handle(DebateRequest::new("Explain gravity"))
        .await
        .unwrap();

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["status"], "needs_confirmation");
    assert_eq!(json["domain"], "general");
    assert_eq!(
        json["improved_prompt"],
        "Provide a detailed, well-structured explanation about: Explain gravity"
    );
    assert_eq!(store.conversation_count(), 0);
}

#[tokio::test]
async fn test_conversation_appends_to_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = offline_config();
    config.history_dir = dir.path().to_path_buf();
    let service = DebateService::from_config(&config).unwrap();

    for question in ["first question", "second question"] {
        let mut request = debate(question);
        request.conversation_id = Some("conv-42".to_string());
        service.handle(request).await.unwrap();
    }

    let records = JsonFileStore::new(dir.path()).load("conv-42").await.unwrap();
    let prompts: Vec<_> = records.iter().map(|r| r.prompt.as_str()).collect();
    assert_eq!(prompts, ["first question", "second question"]);

    let text = std::fs::read_to_string(dir.path().join("conv-42.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json[1]["verdict"]["winner"], "A");
}
