mod helpers;

use serde_json::json;
use steward::integrations::{HandoffProject, IntegrationError, Platform};
use steward::memory::types::category;
use tempfile::TempDir;

fn hello() -> serde_json::Value {
    json!({"choices": [{"message": {"content": "hello"}}], "usage": {"total_tokens": 7}})
}

#[tokio::test]
async fn query_against_stub_returns_text() {
    let (base, seen) = helpers::stub_vendor(200, hello()).await;
    let tmp = TempDir::new().unwrap();
    let integrator = helpers::integrator_at(helpers::test_facade(), &base, tmp.path());

    integrator.configure("perplexity", "pk-test").unwrap();
    let reply = integrator
        .query(Platform::Perplexity, "hi", "")
        .await
        .unwrap();

    assert_eq!(reply.text, "hello");
    assert_eq!(reply.usage, Some(json!({"total_tokens": 7})));

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].headers["authorization"], "Bearer pk-test");
    assert_eq!(seen[0].body["model"], "llama-3.1-sonar-large-128k-online");
    assert_eq!(seen[0].body["messages"][1]["content"], "hi");
}

#[tokio::test]
async fn deepagent_uses_api_key_header() {
    let (base, seen) = helpers::stub_vendor(200, json!({"choices": [{"text": "ok"}]})).await;
    let tmp = TempDir::new().unwrap();
    let integrator = helpers::integrator_at(helpers::test_facade(), &base, tmp.path());

    integrator.configure("deepagent", "da-key").unwrap();
    let reply = integrator
        .query(Platform::DeepAgent, "build it", "ctx")
        .await
        .unwrap();
    assert_eq!(reply.text, "ok");

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0].path, "deepagent");
    assert_eq!(seen[0].headers["x-api-key"], "da-key");
    assert!(seen[0].headers.get("authorization").is_none());
    assert!(seen[0].body["prompt"].as_str().unwrap().ends_with("build it"));
}

#[tokio::test]
async fn fan_out_isolates_missing_credential() {
    let (base, _) = helpers::stub_vendor(200, hello()).await;
    let tmp = TempDir::new().unwrap();
    let integrator = helpers::integrator_at(helpers::test_facade(), &base, tmp.path());
    integrator.configure("abacus", "ab-key").unwrap();

    let fan = integrator
        .fan_out("hi", &[Platform::Perplexity, Platform::AbacusAi])
        .await;

    assert_eq!(fan.results.len(), 2);
    assert!(matches!(
        fan.results[&Platform::Perplexity],
        Err(IntegrationError::MissingCredential(Platform::Perplexity))
    ));
    assert_eq!(fan.results[&Platform::AbacusAi].as_ref().unwrap().text, "hello");

    let view = fan.to_json();
    assert_eq!(view["results"]["abacus"]["success"], true);
    assert_eq!(view["results"]["perplexity"]["success"], false);
}

#[tokio::test]
async fn http_status_and_bad_shape_are_tagged_errors() {
    let tmp = TempDir::new().unwrap();

    let (base, _) = helpers::stub_vendor(503, json!({"error": "busy"})).await;
    let integrator = helpers::integrator_at(helpers::test_facade(), &base, tmp.path());
    integrator.configure("perplexity", "k").unwrap();
    let err = integrator
        .query(Platform::Perplexity, "hi", "")
        .await
        .unwrap_err();
    assert!(matches!(err, IntegrationError::Status { status: 503, .. }));

    let (base, _) = helpers::stub_vendor(200, json!({"answer": "wrong shape"})).await;
    let integrator = helpers::integrator_at(helpers::test_facade(), &base, tmp.path());
    integrator.configure("perplexity", "k").unwrap();
    let err = integrator
        .query(Platform::Perplexity, "hi", "")
        .await
        .unwrap_err();
    assert!(matches!(err, IntegrationError::MalformedResponse { .. }));
}

#[tokio::test]
async fn unreachable_endpoint_is_an_http_error() {
    let tmp = TempDir::new().unwrap();
    // Bind then drop to get a port nothing listens on.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let integrator = helpers::integrator_at(
        helpers::test_facade(),
        &format!("http://127.0.0.1:{port}"),
        tmp.path(),
    );
    integrator.configure("abacus", "k").unwrap();

    let fan = integrator.fan_out("hi", &[Platform::AbacusAi]).await;
    assert!(matches!(
        fan.results[&Platform::AbacusAi],
        Err(IntegrationError::Http { platform: Platform::AbacusAi, .. })
    ));
}

#[tokio::test]
async fn ask_merges_replies_and_scores_learning() {
    let (base, _) = helpers::stub_vendor(200, hello()).await;
    let tmp = TempDir::new().unwrap();
    let facade = helpers::test_facade();
    let integrator = helpers::integrator_at(facade.clone(), &base, tmp.path());
    integrator.configure("perplexity", "k").unwrap();

    let answer = integrator
        .ask("what's new", &[Platform::Perplexity, Platform::DeepAgent])
        .await
        .unwrap();

    assert!(answer.text.starts_with("Multi-Platform AI Response:"));
    assert!(answer.text.contains("Perplexity Response:\nhello"));
    assert!(!answer.text.contains("DeepAgent Response:"));

    let event = &facade.recent_learning(1)[0];
    assert_eq!(event.input, "what's new");
    assert_eq!(event.success_score, 0.5);
}

#[tokio::test]
async fn handoff_writes_package_and_records_it() {
    let tmp = TempDir::new().unwrap();
    let facade = helpers::test_facade();
    for i in 0..12 {
        facade.save(&format!("note_{i:02}"), i, category::GENERAL).unwrap();
    }
    let integrator = helpers::integrator_at(facade.clone(), "http://unused", tmp.path());

    let project = HandoffProject {
        name: "Dash Cam".into(),
        description: "Ring buffer recorder".into(),
        code: "fn main() {}".into(),
        requirements: vec!["rust".into()],
    };
    let receipt = integrator.handoff(&project, "finish the uploader").await.unwrap();

    assert!(receipt.filename.starts_with("handoff_Dash_Cam_"));
    assert!(receipt.path.starts_with(tmp.path()));

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&receipt.path).unwrap()).unwrap();
    assert_eq!(written["project_name"], "Dash Cam");
    assert_eq!(written["instructions"], "finish the uploader");
    assert_eq!(written["handoff_type"], "development_continuation");
    assert_eq!(written["user_preferences"]["name"], "Owner");

    let context = written["memory_context"].as_object().unwrap();
    assert_eq!(context.len(), 10);
    assert!(context.contains_key("note_11"));
    assert!(!context.contains_key("note_01"));

    let recorded = facade
        .entry(&format!("handoff_{}", receipt.filename))
        .unwrap();
    assert_eq!(recorded.category, category::HANDOFFS);
}

#[tokio::test]
async fn handoff_to_unwritable_dir_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let blocker = tmp.path().join("not_a_dir");
    std::fs::write(&blocker, "x").unwrap();

    let integrator = helpers::integrator_at(helpers::test_facade(), "http://unused", &blocker);
    let err = integrator
        .handoff(&HandoffProject::default(), "go")
        .await
        .unwrap_err();
    assert!(matches!(err, IntegrationError::Handoff { .. }));
}
