use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use githook_core::PushEvent;
use serde_json::{json, Value};

use super::AppState;
use crate::processor::ProcessError;

pub const ACKNOWLEDGEMENT: &str = "Push event processed. Thanks!";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/hook", post(push_event))
        .route("/push_event", post(push_event))
}

async fn push_event(
    State(state): State<AppState>,
    Json(event): Json<PushEvent>,
) -> Result<impl IntoResponse, (StatusCode, Json<Value>)> {
    state.processor.process(&event).await.map_err(to_error)?;
    Ok(([(header::CONTENT_TYPE, "text/plain")], ACKNOWLEDGEMENT))
}

fn to_error(e: ProcessError) -> (StatusCode, Json<Value>) {
    let status = match &e {
        ProcessError::Payload(_) => StatusCode::BAD_REQUEST,
        ProcessError::Tracker(_) => StatusCode::BAD_GATEWAY,
    };
    (status, Json(json!({ "error": e.to_string() })))
}
