//! HTTP boundary: the assessment page plus JSON endpoints for prediction,
//! report download, and the chat assistant.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Json, State},
    http::{Method, StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use neuropredict_ai::{InferenceEngine, PredictError};
use neuropredict_chat::ChatClient;
use neuropredict_core::{
    DisplayPayload, FeatureGroup, PredictionResult, RawValue, Submission, feature_groups, format,
    readable_input,
};
use neuropredict_report::{REPORT_FILENAME, render_report};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::page;

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<InferenceEngine>,
    pub chat: Arc<ChatClient>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Danger,
    Warning,
}

/// Result of one predict request. Failures are reported in-band so the page
/// can show them next to the form.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PredictOutcome {
    Ok {
        payload: DisplayPayload,
        result: PredictionResult,
        /// Model features that were absent and zero-filled.
        filled: Vec<String>,
    },
    Error {
        message: String,
        severity: Severity,
    },
}

impl From<PredictError> for PredictOutcome {
    fn from(e: PredictError) -> Self {
        let (message, severity) = match &e {
            PredictError::ModelUnavailable(_) => {
                ("Prediction Error: Model not loaded".to_string(), Severity::Warning)
            }
            PredictError::Inference(_) => (e.to_string(), Severity::Warning),
            PredictError::Encoding { .. } | PredictError::MalformedSubmission(_) => {
                (e.to_string(), Severity::Danger)
            }
        };
        Self::Error { message, severity }
    }
}

#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    #[serde(flatten)]
    pub submission: Submission,
    pub result: PredictionResult,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub values: Vec<RawValue>,
    #[serde(default)]
    pub fields: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    /// `None` when the message was blank and nothing was sent.
    pub reply: Option<String>,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/schema", get(schema))
        .route("/api/predict", post(predict))
        .route("/api/report", post(report))
        .route("/api/chat", post(chat))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index(State(state): State<AppState>) -> Html<String> {
    Html(page::render_page(state.engine.unavailable_reason()))
}

async fn health() -> &'static str {
    "ok"
}

async fn schema() -> Json<&'static [FeatureGroup]> {
    Json(feature_groups())
}

async fn predict(
    State(state): State<AppState>,
    Json(submission): Json<Submission>,
) -> Json<PredictOutcome> {
    let outcome = match state.engine.normalize(&submission) {
        Ok(encoded) => match state.engine.predict(&encoded) {
            Ok(result) => {
                info!(
                    label = result.label,
                    probability = result.probability,
                    filled = encoded.filled().len(),
                    "prediction served"
                );
                PredictOutcome::Ok {
                    payload: format(&result),
                    result,
                    filled: encoded.filled().to_vec(),
                }
            }
            Err(e) => {
                warn!(error = %e, "prediction failed");
                e.into()
            }
        },
        Err(e) => {
            warn!(error = %e, "submission rejected");
            e.into()
        }
    };
    Json(outcome)
}

async fn report(State(state): State<AppState>, Json(req): Json<ReportRequest>) -> Response {
    // Same acceptance rules as predict: a report is only produced for a
    // submission the engine would score.
    if let Err(e) = state.engine.normalize(&req.submission) {
        warn!(error = %e, "report request rejected");
        return (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response();
    }

    let input = readable_input(&req.submission);
    let result = req.result;
    let rendered = tokio::task::spawn_blocking(move || {
        render_report(&input, &result).map_err(|e| e.to_string())
    })
    .await;

    match rendered {
        Ok(Ok(bytes)) => (
            [
                (header::CONTENT_TYPE, "application/pdf".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{REPORT_FILENAME}\""),
                ),
            ],
            bytes,
        )
            .into_response(),
        Ok(Err(e)) => {
            error!(error = %e, "report rendering failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e).into_response()
        }
        Err(e) => {
            error!(error = %e, "report task panicked");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn chat(State(state): State<AppState>, Json(req): Json<ChatRequest>) -> Json<ChatReply> {
    if req.message.trim().is_empty() {
        return Json(ChatReply { reply: None });
    }

    let submission = Submission::new(req.values, req.fields);
    let context = match submission.pairs() {
        Ok(_) if !submission.is_empty() => Some(readable_input(&submission)),
        Ok(_) => None,
        Err(e) => {
            debug!(error = %e, "ignoring malformed chat context");
            None
        }
    };

    let reply = state.chat.reply(&req.message, context.as_ref()).await;
    Json(ChatReply { reply: Some(reply) })
}
