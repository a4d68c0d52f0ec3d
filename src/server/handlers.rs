use super::client_ip::ClientIp;
use super::error::ApiError;
use super::AppState;
use crate::corpus::{self, CorpusError, PayloadFile};
use crate::resolver::RejectionReason;
use axum::body::Body;
use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, Method, StatusCode, Uri};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::TryStreamExt;
use serde_json::{Value, json};
use std::convert::Infallible;
use std::net::IpAddr;
use std::time::Duration;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tokio_util::io::ReaderStream;
use tracing::{debug, error, info, warn};

const PAYLOAD_TECHNOLOGY: HeaderName = HeaderName::from_static("x-payload-technology");

/// `GET /rfi/:technology/:filename`
pub async fn serve_payload(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    segments: Result<Path<(String, String)>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path((technology, filename)) = segments.map_err(|e| malformed(e, ip))?;
    serve(state, ip, technology, filename).await
}

/// `GET /rfi/:technology` with no filename segment
pub async fn missing_filename(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    segment: Result<Path<String>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(technology) = segment.map_err(|e| malformed(e, ip))?;
    serve(state, ip, technology, String::new()).await
}

/// Segments that fail to decode are rejected like any other bad filename
fn malformed(rejection: PathRejection, ip: IpAddr) -> ApiError {
    let detail = rejection.body_text();
    warn!(
        reason = "invalid_encoding",
        detail = %detail,
        ip = %ip,
        "Rejected payload request"
    );
    ApiError::MalformedSegment { detail }
}

async fn serve(
    state: AppState,
    ip: IpAddr,
    technology: String,
    filename: String,
) -> Result<Response, ApiError> {
    let resolver = state.resolver.clone();
    let (tech, name) = (technology.clone(), filename.clone());
    let outcome = tokio::task::spawn_blocking(move || {
        resolver.resolve(&tech, &name).map(|resolved| {
            let exists = corpus::file_exists(&resolved);
            (resolved, exists)
        })
    })
    .await
    .map_err(|e| ApiError::internal(&state.settings, e.to_string()))?;

    let (resolved, exists) = match outcome {
        Ok(found) => found,
        Err(reason) => {
            log_rejection(&reason, &technology, &filename, ip);
            return Err(ApiError::Rejected { reason, technology });
        }
    };

    if !exists {
        info!(
            technology = resolved.technology(),
            filename = resolved.filename(),
            ip = %ip,
            "Payload not found"
        );
        return Err(ApiError::PayloadNotFound {
            technology: resolved.technology(),
            filename: resolved.filename().to_string(),
        });
    }

    let content_type = state
        .resolver
        .registry()
        .content_type_for(resolved.technology());

    let payload = corpus::open(&resolved, content_type)
        .await
        .map_err(|e| match e {
            CorpusError::NotFound {
                technology,
                filename,
            } => ApiError::PayloadNotFound {
                technology,
                filename,
            },
            CorpusError::Stream(source) => {
                error!(
                    technology = resolved.technology(),
                    filename = resolved.filename(),
                    error = %source,
                    "Failed to open payload"
                );
                ApiError::Stream
            }
        })?;

    info!(
        technology = payload.technology,
        filename = %payload.filename,
        bytes = payload.length,
        ip = %ip,
        "Serving payload"
    );

    Ok(payload_response(payload))
}

fn log_rejection(reason: &RejectionReason, technology: &str, filename: &str, ip: IpAddr) {
    warn!(
        technology,
        filename,
        reason = reason.as_str(),
        pattern = reason.pattern().unwrap_or_default(),
        ip = %ip,
        "Rejected payload request"
    );
}

fn content_disposition(filename: &str) -> HeaderValue {
    let escaped = filename.replace('\\', "\\\\").replace('"', "\\\"");
    HeaderValue::from_str(&format!("inline; filename=\"{}\"", escaped))
        .unwrap_or_else(|_| HeaderValue::from_static("inline"))
}

fn payload_response(payload: PayloadFile) -> Response {
    let technology = payload.technology;
    let filename = payload.filename.clone();
    let body = ReaderStream::new(payload.file).inspect_err(move |e| {
        error!(
            technology,
            filename = %filename,
            error = %e,
            "Payload stream failed mid-response"
        );
    });

    (
        StatusCode::OK,
        [
            (CONTENT_TYPE, HeaderValue::from_static(payload.content_type)),
            (CONTENT_LENGTH, HeaderValue::from(payload.length)),
            (CONTENT_DISPOSITION, content_disposition(&payload.filename)),
            (PAYLOAD_TECHNOLOGY, HeaderValue::from_static(payload.technology)),
        ],
        Body::from_stream(body),
    )
        .into_response()
}

/// `GET /rfi`: the served technologies with their extensions and MIME type
pub async fn list_technologies(State(state): State<AppState>) -> Json<Value> {
    let registry = state.resolver.registry();
    Json(json!({
        "technologies": registry.entries(),
        "count": registry.technology_count(),
    }))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `GET /logs/stream`: every log record as a server-sent event
pub async fn stream_logs(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!(ip = %ip, "Log stream subscriber connected");

    let stream = BroadcastStream::new(state.logs.subscribe()).filter_map(|record| match record {
        Ok(record) => Event::default().json_data(&record).ok().map(Ok),
        Err(BroadcastStreamRecvError::Lagged(skipped)) => Some(Ok(
            Event::default().comment(format!("skipped {} records", skipped))
        )),
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("heartbeat"),
    )
}

pub async fn not_found(method: Method, uri: Uri) -> ApiError {
    ApiError::RouteNotFound {
        method: method.to_string(),
        uri: uri.to_string(),
    }
}
