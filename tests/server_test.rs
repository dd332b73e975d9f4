//! HTTP control surface tests using axum's test utilities.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use dubmerge::config::{Config, ShowTask};
use dubmerge::processor::MergeService;
use dubmerge::server::{create_router, AppContext};
use dubmerge_av::actions::Transcoder;
use dubmerge_av::probe::{MediaInfo, Prober};
use dubmerge_av::MergePlan;
use http_body_util::BodyExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

struct UnreadableProber;

impl Prober for UnreadableProber {
    fn name(&self) -> &'static str {
        "unreadable"
    }

    fn probe(&self, path: &Path) -> dubmerge_av::Result<MediaInfo> {
        Err(dubmerge_av::Error::file_not_found(path))
    }
}

struct NoopTranscoder;

impl Transcoder for NoopTranscoder {
    fn transcode(&self, _plan: &MergePlan) -> dubmerge_av::Result<()> {
        Ok(())
    }
}

fn create_test_context(config: Config) -> AppContext {
    AppContext {
        service: Arc::new(MergeService::new(
            Arc::new(config),
            Arc::new(UnreadableProber),
            Arc::new(NoopTranscoder),
        )),
        cancel: CancellationToken::new(),
    }
}

fn sample_config() -> Config {
    Config {
        tasks: vec![ShowTask {
            title: "Bubbler".into(),
            description: "Season one dubs".into(),
            source_path: PathBuf::from("/nonexistent/source"),
            target_path: PathBuf::from("/nonexistent/library"),
            regex_mapping: vec![r"^(?<name>.+?) S(?<season>\d+)E(?<episode>\d+)".into()],
            manual_mapping: Vec::new(),
            renumber: Vec::new(),
        }],
        ..Config::default()
    }
}

async fn body_json(body: Body) -> serde_json::Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_router(create_test_context(Config::default()));

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"ok");
}

#[tokio::test]
async fn test_status_before_any_run() {
    let app = create_router(create_test_context(Config::default()));

    let response = app
        .oneshot(
            Request::get("/api/processing/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response.into_body()).await;
    assert_eq!(json["status"], "idle");
    assert_eq!(json["last_message"], "Not started yet.");
    assert!(json["last_run_time"].is_null());
}

#[tokio::test]
async fn test_start_processing_accepted() {
    let ctx = create_test_context(sample_config());
    let service = Arc::clone(&ctx.service);
    let app = create_router(ctx);

    let response = app
        .oneshot(
            Request::post("/api/processing/start")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let json = body_json(response.into_body()).await;
    assert_eq!(json["message"], "Processing started.");

    // The run itself happens in the background.
    for _ in 0..100 {
        if !service.gate().is_busy() && service.status().last_run_time.is_some() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert!(service.status().last_run_time.is_some());
}

#[tokio::test]
async fn test_start_processing_conflict_while_running() {
    let ctx = create_test_context(sample_config());
    let _held = ctx.service.gate().try_acquire().unwrap();
    let app = create_router(ctx);

    let response = app
        .oneshot(
            Request::post("/api/processing/start")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response.into_body()).await;
    assert_eq!(json["message"], "Processing is already in progress.");
}

#[tokio::test]
async fn test_general_config_endpoint() {
    let app = create_router(create_test_context(Config::default()));

    let response = app
        .oneshot(Request::get("/api/config/general").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response.into_body()).await;
    assert_eq!(json["language"], "eng");
    assert_eq!(json["processing_interval_secs"], 43200);
    assert_eq!(json["season_dir_prefix"], "Season");
}

#[tokio::test]
async fn test_tasks_config_endpoint() {
    let app = create_router(create_test_context(sample_config()));

    let response = app
        .oneshot(Request::get("/api/config/tasks").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response.into_body()).await;
    let tasks = json.as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["title"], "Bubbler");
    assert_eq!(tasks[0]["source_path"], "/nonexistent/source");
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = create_router(create_test_context(Config::default()));

    let response = app
        .oneshot(Request::get("/api/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
