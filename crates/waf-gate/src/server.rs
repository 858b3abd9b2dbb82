//! HTTP surface: a single demo route behind the WAF middleware.

use std::net::SocketAddr;

use audit_log::{AuditEntry, AuditEventType, AuditSink, AuditSource, DetectionRecord};
use axum::body::Body;
use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use http::request::Parts;
use http_body_util::LengthLimitError;
use http::StatusCode;
use request_inspector::{extract, InspectionLimits, Inspector};
use tracing::{debug, warn};

const WELCOME: &str = "Welcome! WAF is active.";
const MALFORMED_ALERT: &str = "WAF Alert: Malformed input rejected";
const BODY_TOO_LARGE_ALERT: &str = "WAF Alert: Request body too large";
const UNSUPPORTED_BODY_ALERT: &str = "WAF Alert: Unsupported content type";

/// Shared by every request; cloned per request by axum.
#[derive(Clone)]
pub struct AppState {
    pub inspector: Inspector,
    pub limits: InspectionLimits,
    pub max_body_bytes: usize,
    pub audit: Option<AuditSink>,
}

impl AppState {
    fn audit(&self, entry: AuditEntry) {
        if let Some(sink) = &self.audit {
            sink.log(entry);
        }
    }
}

/// Build the router. Every request, including ones for unknown paths, goes
/// through [`waf_guard`] first.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index).post(index))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state, waf_guard))
}

async fn index() -> &'static str {
    WELCOME
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// Inspect the request and either answer it with a rejection or pass it on
/// with its buffered body restored.
async fn waf_guard(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();

    // A body that could not be buffered was never inspected, so it is never
    // forwarded.
    let bytes = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(err) if is_length_limit(&err) => {
            warn!(
                limit = state.max_body_bytes,
                path = %parts.uri.path(),
                "request body over limit"
            );
            return (StatusCode::PAYLOAD_TOO_LARGE, BODY_TOO_LARGE_ALERT).into_response();
        }
        Err(err) => {
            warn!(%err, path = %parts.uri.path(), "request body unreadable");
            return malformed(&state, &parts, &err.to_string());
        }
    };

    match extract::is_multipart(&parts.headers) {
        Ok(false) => {}
        Ok(true) => {
            warn!(path = %parts.uri.path(), "multipart body rejected");
            return (StatusCode::UNSUPPORTED_MEDIA_TYPE, UNSUPPORTED_BODY_ALERT).into_response();
        }
        Err(err) => {
            warn!(%err, path = %parts.uri.path(), "malformed request rejected");
            return malformed(&state, &parts, &err.to_string());
        }
    }

    let input = match extract::extract_request(&parts, &bytes, &state.limits) {
        Ok(input) => input,
        Err(err) => {
            warn!(%err, path = %parts.uri.path(), "malformed request rejected");
            return malformed(&state, &parts, &err.to_string());
        }
    };

    if let Some(finding) = state.inspector.find_first(&input) {
        let message = finding.detection.alert_message();
        state.audit(
            AuditEntry::new(
                AuditEventType::RequestRejected,
                request_source(&parts),
                serde_json::json!({
                    "status": StatusCode::FORBIDDEN.as_u16(),
                    "fields_inspected": input.len(),
                }),
            )
            .with_detection(DetectionRecord {
                category: finding.detection.category.to_string(),
                rule: finding.detection.rule.clone(),
                field_source: finding.source.to_string(),
                field_name: finding.name.clone(),
            }),
        );
        return (StatusCode::FORBIDDEN, message).into_response();
    }

    debug!(fields = input.len(), path = %parts.uri.path(), "request admitted");
    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

/// Answer 400 and record the reason.
fn malformed(state: &AppState, parts: &Parts, error: &str) -> Response {
    state.audit(AuditEntry::new(
        AuditEventType::MalformedRequest,
        request_source(parts),
        serde_json::json!({
            "status": StatusCode::BAD_REQUEST.as_u16(),
            "error": error,
        }),
    ));
    (StatusCode::BAD_REQUEST, MALFORMED_ALERT).into_response()
}

/// True when buffering stopped because the body exceeded its limit.
fn is_length_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}

fn request_source(parts: &Parts) -> AuditSource {
    AuditSource {
        component: "waf-guard".to_string(),
        remote_addr: parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.to_string()),
        method: Some(parts.method.to_string()),
        path: Some(parts.uri.path().to_string()),
    }
}
