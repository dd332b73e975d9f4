use crate::server::AppContext;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

pub fn api_routes() -> Router<AppContext> {
    Router::new()
        .route("/processing/start", post(start_processing))
        .route("/processing/status", get(processing_status))
        .route("/config/general", get(general_config))
        .route("/config/tasks", get(tasks_config))
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

async fn start_processing(State(ctx): State<AppContext>) -> impl IntoResponse {
    match ctx.service.spawn_run(ctx.cancel.child_token()) {
        Some(handle) => {
            tokio::spawn(async move {
                if let Err(e) = handle.await {
                    tracing::error!("Processing run panicked: {}", e);
                }
            });
            (
                StatusCode::ACCEPTED,
                Json(MessageResponse {
                    message: "Processing started.",
                }),
            )
        }
        None => (
            StatusCode::CONFLICT,
            Json(MessageResponse {
                message: "Processing is already in progress.",
            }),
        ),
    }
}

async fn processing_status(State(ctx): State<AppContext>) -> impl IntoResponse {
    Json(ctx.service.status())
}

async fn general_config(State(ctx): State<AppContext>) -> impl IntoResponse {
    Json(ctx.service.config().general.clone())
}

async fn tasks_config(State(ctx): State<AppContext>) -> impl IntoResponse {
    Json(ctx.service.config().tasks.clone())
}
