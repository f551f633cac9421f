//! Build server panel tests

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use tokio::sync::{broadcast, Notify, RwLock};
use tower::ServiceExt;

use common::{machine, settings_with_env, source_fixture, FakeCloud, FakeRunner, FakeTransfer};
use skylift::filesys::file::File;
use skylift::server::gate::{ServerStatus, StatusGate};
use skylift::server::serve::router;
use skylift::server::state::ServerState;
use skylift::storage::settings::Settings;

struct Harness {
    router: Router,
    gate: Arc<StatusGate>,
    conf: Arc<File>,
    cloud: Arc<FakeCloud>,
    runner: Arc<FakeRunner>,
    _source: tempfile::TempDir,
    _conf_dir: tempfile::TempDir,
}

fn harness_with_cloud(cloud: FakeCloud) -> Harness {
    let source = source_fixture();
    let conf_dir = tempfile::tempdir().expect("tempdir");
    let conf = Arc::new(File::new(conf_dir.path().join("build.json")));

    let settings = settings_with_env("default", vec![machine("web")]);
    let gate = Arc::new(StatusGate::new());
    let cloud = Arc::new(cloud);
    let runner = Arc::new(FakeRunner::new());
    let (shutdown_tx, _) = broadcast::channel(1);

    let state = Arc::new(ServerState::new(
        Arc::new(RwLock::new(settings)),
        conf.clone(),
        gate.clone(),
        cloud.clone(),
        runner.clone(),
        Arc::new(FakeTransfer::new()),
        Some(source.path().to_path_buf()),
        "trunk".to_string(),
        shutdown_tx,
    ));

    Harness {
        router: router(state),
        gate,
        conf,
        cloud,
        runner,
        _source: source,
        _conf_dir: conf_dir,
    }
}

fn harness() -> Harness {
    harness_with_cloud(FakeCloud::new())
}

fn get(path: &str) -> Request<Body> {
    Request::builder()
        .uri(path)
        .body(Body::empty())
        .expect("request")
}

fn post_action(action: &str, env: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("action={}&env={}", action, env)))
        .expect("request")
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf8")
}

async fn wait_for_status(gate: &StatusGate, wanted: ServerStatus) {
    for _ in 0..400 {
        if gate.current() == wanted {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("gate never reached {}", wanted);
}

#[tokio::test]
async fn test_panel_lists_environments() {
    let harness = harness();

    let response = harness.router.clone().oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let page = body_text(response).await;
    assert!(page.contains("Build Server"));
    assert!(page.contains("waiting"));
    assert!(page.contains("<option value=\"default\">"));
    assert!(page.contains("value=\"Build\""));
    assert!(page.contains("value=\"Update\""));
}

#[tokio::test]
async fn test_unknown_action_is_rejected() {
    let harness = harness();

    let response = harness
        .router
        .clone()
        .oneshot(post_action("Restart", "default"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "unknown action Restart");
    assert_eq!(harness.gate.current(), ServerStatus::Waiting);
}

#[tokio::test]
async fn test_unknown_env_is_rejected() {
    let harness = harness();

    let response = harness
        .router
        .clone()
        .oneshot(post_action("Build", "nope"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "deploy nope not found");
    assert_eq!(harness.gate.current(), ServerStatus::Waiting);
}

#[tokio::test]
async fn test_other_paths_answer_no_content() {
    let harness = harness();

    let response = harness
        .router
        .clone()
        .oneshot(get("/favicon.ico"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_build_accepted_then_busy_then_committed() {
    let release = Arc::new(Notify::new());
    let harness = harness_with_cloud(FakeCloud::new().with_run_gate(release.clone()));

    // The trigger answers immediately while the work runs on its own task
    let response = harness
        .router
        .clone()
        .oneshot(post_action("Build", "default"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/");
    assert_eq!(harness.gate.current(), ServerStatus::Building);

    // A second trigger is turned away with the state in the way
    let busy = harness
        .router
        .clone()
        .oneshot(post_action("Update", "default"))
        .await
        .unwrap();
    assert_eq!(busy.status(), StatusCode::CONFLICT);
    assert_eq!(body_text(busy).await, "busy: building");

    // The panel hides the form while an operation runs
    let page = body_text(harness.router.clone().oneshot(get("/")).await.unwrap()).await;
    assert!(page.contains("building"));
    assert!(!page.contains("value=\"Build\""));

    release.notify_one();
    wait_for_status(&harness.gate, ServerStatus::Waiting).await;

    // The finished build landed in the conf file
    let written: Settings = harness.conf.read_json().await.expect("conf written");
    let committed = &written.deploy["default"][0];
    assert_eq!(committed.host.as_deref(), Some("i-0000.cloud.test"));
    assert_eq!(committed.image.as_deref(), Some("img-0001"));

    let commands = harness.runner.commands();
    assert!(commands.iter().any(|(_, command)| command == "echo ok"));
    assert_eq!(harness.cloud.images.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_failed_operation_frees_the_gate() {
    // Updating a machine that was never built fails on the worker task;
    // the permit drops with it and the panel is usable again.
    let harness = harness();

    let response = harness
        .router
        .clone()
        .oneshot(post_action("Update", "default"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    wait_for_status(&harness.gate, ServerStatus::Waiting).await;

    // Nothing ran and nothing was written back
    assert!(harness.runner.commands().is_empty());
    assert_eq!(harness.cloud.calls().len(), 0);
    assert!(!harness.conf.exists().await);
}
