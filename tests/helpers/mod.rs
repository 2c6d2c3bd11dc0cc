#![allow(dead_code)]

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use rusqlite::Connection;
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use steward::config::{IntegrationsConfig, UserProfile};
use steward::db;
use steward::integrations::PlatformIntegrator;
use steward::memory::Facade;

/// Open a fresh in-memory database with schema and migrations applied.
pub fn test_db() -> Connection {
    db::open_memory_database().unwrap()
}

pub fn test_facade() -> Arc<Facade> {
    Arc::new(Facade::in_memory(UserProfile::default()).unwrap())
}

/// Integrator whose three vendor endpoints all point at `base`.
pub fn integrator_at(facade: Arc<Facade>, base: &str, handoff_dir: &Path) -> PlatformIntegrator {
    let settings = IntegrationsConfig {
        perplexity_endpoint: Some(format!("{base}/perplexity")),
        abacus_endpoint: Some(format!("{base}/abacus")),
        deepagent_endpoint: Some(format!("{base}/deepagent")),
        ..IntegrationsConfig::default()
    };
    PlatformIntegrator::with_settings(facade, &settings, handoff_dir.to_path_buf())
}

/// A request the stub vendor received.
#[derive(Debug, Clone)]
pub struct Seen {
    pub path: String,
    pub headers: HeaderMap,
    pub body: Value,
}

#[derive(Clone)]
struct StubState {
    status: StatusCode,
    reply: Value,
    path: &'static str,
    seen: Arc<Mutex<Vec<Seen>>>,
}

async fn reply(
    State(state): State<StubState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.seen.lock().unwrap().push(Seen {
        path: state.path.to_string(),
        headers,
        body,
    });
    (state.status, Json(state.reply.clone()))
}

/// Serve `reply` with `status` on every vendor path at a local port.
/// Returns the base URL and the log of received requests.
pub async fn stub_vendor(status: u16, body: Value) -> (String, Arc<Mutex<Vec<Seen>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let status = StatusCode::from_u16(status).unwrap();

    let mut app = Router::new();
    for path in ["perplexity", "abacus", "deepagent"] {
        let state = StubState {
            status,
            reply: body.clone(),
            path,
            seen: Arc::clone(&seen),
        };
        app = app.route(&format!("/{path}"), post(reply).with_state(state));
    }

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), seen)
}
