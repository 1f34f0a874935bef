#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::ws::Message;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tokio::sync::broadcast;
use tower::ServiceExt;
use uuid::Uuid;

use uplink_api::auth::jwt::{generate_access_token, JwtConfig};
use uplink_api::config::{PipelineConfig, ServerConfig};
use uplink_api::groundstation::GroundStationGateway;
use uplink_api::router::build_app_router;
use uplink_api::state::AppState;
use uplink_core::frame::Frame;
use uplink_core::types::Operator;
use uplink_events::{AuditEvent, EventBus};
use uplink_pipeline::artifacts::MemoryArtifactStore;
use uplink_pipeline::collaborators::{ArtifactRef, CompiledPlan, Compiler};
use uplink_pipeline::error::CompileError;
use uplink_pipeline::{
    DecisionHandler, DispatchQueue, DispatchWorker, PendingRegistry, SubmissionHandler,
};

pub const TEST_SECRET: &str = "test-secret";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
            access_token_expiry_mins: 15,
        },
        pipeline: PipelineConfig {
            gs_response_timeout_secs: 2,
            ..PipelineConfig::default()
        },
    }
}

/// Compiler double that records every body it is asked to compile.
#[derive(Default)]
pub struct RecordingCompiler {
    pub bodies: Mutex<Vec<Value>>,
    pub fail: bool,
}

impl RecordingCompiler {
    pub fn calls(&self) -> usize {
        self.bodies.lock().unwrap().len()
    }
}

#[async_trait]
impl Compiler for RecordingCompiler {
    async fn compile(
        &self,
        body: &Value,
        _requester: &Operator,
    ) -> Result<CompiledPlan, CompileError> {
        self.bodies.lock().unwrap().push(body.clone());
        if self.fail {
            return Err(CompileError::Rejected("unknown command 'warp'".into()));
        }
        Ok(CompiledPlan {
            compiled: json!({"compiled": body}),
            artifact: ArtifactRef("compiled-artifact".into()),
        })
    }
}

/// A fully wired application with handles on its collaborators.
pub struct TestApp {
    pub router: Router,
    pub registry: Arc<PendingRegistry>,
    pub compiler: Arc<RecordingCompiler>,
    pub artifacts: Arc<MemoryArtifactStore>,
    pub gateway: Arc<GroundStationGateway>,
    pub events: broadcast::Receiver<AuditEvent>,
}

/// Build the application router with the real registry, dispatch worker and
/// gateway, plus a recording compiler and an in-memory artifact store.
pub fn build_test_app() -> TestApp {
    build_test_app_with(RecordingCompiler::default())
}

pub fn build_test_app_with(compiler: RecordingCompiler) -> TestApp {
    let config = test_config();
    let event_bus = Arc::new(EventBus::default());
    let events = event_bus.subscribe();

    let registry = Arc::new(PendingRegistry::new());
    let artifacts = Arc::new(MemoryArtifactStore::new());
    let compiler = Arc::new(compiler);
    let gateway = Arc::new(GroundStationGateway::new(Duration::from_secs(
        config.pipeline.gs_response_timeout_secs,
    )));

    let (queue, jobs) = DispatchQueue::new();
    let worker = DispatchWorker::new(
        Arc::clone(&registry),
        gateway.clone(),
        gateway.clone(),
        Arc::clone(&event_bus),
    );
    tokio::spawn(worker.run(jobs, tokio_util::sync::CancellationToken::new()));

    let state = AppState {
        config: Arc::new(config.clone()),
        submissions: SubmissionHandler::new(
            Arc::clone(&registry),
            artifacts.clone(),
            Arc::clone(&event_bus),
        ),
        decisions: DecisionHandler::new(
            Arc::clone(&registry),
            compiler.clone(),
            queue,
            Arc::clone(&event_bus),
        ),
        gateway: Arc::clone(&gateway),
        event_bus,
    };

    TestApp {
        router: build_app_router(state, &config),
        registry,
        compiler,
        artifacts,
        gateway,
        events,
    }
}

/// A valid access token for operator `sub`.
pub fn token_for(sub: &str) -> String {
    let config = test_config();
    generate_access_token(sub, "operator", &config.jwt).unwrap()
}

// ---------------------------------------------------------------------------
// Ground station double
// ---------------------------------------------------------------------------

/// Frames a fake ground station has received.
pub type ReceivedFrames = Arc<Mutex<Vec<Frame>>>;

/// Connect a fake ground station that acknowledges every frame it receives.
pub async fn connect_station(gateway: &Arc<GroundStationGateway>, gs_id: Uuid) -> ReceivedFrames {
    let received: ReceivedFrames = Arc::default();
    let (_session, mut rx) = gateway.connect(gs_id, "test-station".into()).await;

    let gateway = Arc::clone(gateway);
    let frames = Arc::clone(&received);
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let Message::Text(text) = msg else { continue };
            let frame: Frame = serde_json::from_str(text.as_str()).unwrap();
            let request_id = frame.request_id.unwrap();
            frames.lock().unwrap().push(frame);

            let reply = json!({"in_response_to": request_id, "data": {"status": "queued"}});
            gateway.handle_message(gs_id, &reply.to_string()).await;
        }
    });

    received
}

/// Wait for the next event with the given descriptor, skipping others.
pub async fn next_event(
    events: &mut broadcast::Receiver<AuditEvent>,
    descriptor: &str,
) -> AuditEvent {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let event = events.recv().await.unwrap();
            if event.descriptor == descriptor {
                return event;
            }
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {descriptor} event"))
}

/// Let in-flight work settle, then count buffered events with the descriptor.
pub async fn count_further_events(
    events: &mut broadcast::Receiver<AuditEvent>,
    descriptor: &str,
) -> usize {
    tokio::time::sleep(Duration::from_millis(100)).await;
    let mut count = 0;
    while let Ok(event) = events.try_recv() {
        if event.descriptor == descriptor {
            count += 1;
        }
    }
    count
}

// ---------------------------------------------------------------------------
// HTTP helpers
// ---------------------------------------------------------------------------

pub async fn get(app: &Router, uri: &str) -> axum::response::Response {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn post_json(
    app: &Router,
    uri: &str,
    token: Option<&str>,
    body: Value,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_json(response).await)
}

pub async fn post_empty(app: &Router, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method("POST").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = builder.body(Body::empty()).unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_json(response).await)
}

/// A well-formed submission targeting `gs_id`.
pub fn submission_for(gs_id: Uuid) -> Value {
    json!({
        "flight_plan": {"name": "commands", "body": [{"name": "gpio.set", "args": [1]}]},
        "datetime": "2025-01-01T12:00:00+01:00",
        "gs_id": gs_id.to_string(),
        "sat_name": "SAT-1",
    })
}

/// Submit a flight plan and return its identifier.
pub async fn submit(app: &TestApp, gs_id: Uuid, token: &str) -> Uuid {
    let (status, json) = post_json(
        &app.router,
        "/api/v1/scheduling/save",
        Some(token),
        submission_for(gs_id),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "unexpected body: {json}");
    json["fp_id"].as_str().unwrap().parse().unwrap()
}
