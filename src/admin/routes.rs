//! HTTP surface for the admin trigger

use crate::admin::{AdminTrigger, AuthError, ManualEntry};
use crate::config::CrawlParams;
use crate::crawler::CrawlSummary;
use crate::media::MediaError;
use crate::storage::MediaRecord;
use crate::IngestError;
use axum::{
    body::Bytes,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;

/// Alternative header carrying the raw token
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub success: bool,
    pub saved: Vec<MediaRecord>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<MediaError>,
    pub summary: CrawlSummary,
}

#[derive(Debug, Serialize)]
pub struct MediaResponse {
    pub success: bool,
    pub saved: Vec<MediaRecord>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<MediaError>,
    pub skipped: usize,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Error rendered as `{success: false, error}` with a mapped status
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        let status = match &err {
            IngestError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            IngestError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
            IngestError::Job(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if err.is_client_error() {
            tracing::debug!("Admin request rejected: {}", err);
        } else {
            tracing::error!("Admin request failed: {}", err);
        }

        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({ "success": false, "error": self.message })),
        )
            .into_response()
    }
}

/// Builds the admin router
pub fn router(trigger: AdminTrigger) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/admin/ingest", post(ingest_handler))
        .route("/admin/media", post(media_handler))
        .with_state(trigger)
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Runs one crawl job and returns its summary
///
/// The token is checked before the body is parsed. An empty body crawls
/// with the service defaults.
async fn ingest_handler(
    State(trigger): State<AdminTrigger>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<IngestResponse>, ApiError> {
    let token = authorized_token(&trigger, &headers)?;

    let params: CrawlParams = parse_body(&body)?.unwrap_or_default();
    let mut summary = trigger.trigger_crawl(Some(token), params).await?;

    let saved = std::mem::take(&mut summary.saved);
    let errors = summary.media_errors.clone();

    Ok(Json(IngestResponse {
        success: true,
        saved,
        errors,
        summary,
    }))
}

/// Upserts a list of `{name, video_url}` pairs directly
async fn media_handler(
    State(trigger): State<AdminTrigger>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<MediaResponse>, ApiError> {
    let token = authorized_token(&trigger, &headers)?;

    let entries: Vec<ManualEntry> = parse_body(&body)?
        .ok_or_else(|| ApiError::bad_request("expected a JSON array of {name, video_url}"))?;

    let report = trigger.bulk_upsert(Some(token), entries)?;

    Ok(Json(MediaResponse {
        success: true,
        saved: report.saved,
        errors: report.errors,
        skipped: report.malformed,
    }))
}

/// Tokens presented by a request, in the order they are tried
///
/// `Authorization` comes first (with any `Bearer` prefix stripped, in any
/// case), then `x-admin-token`.
fn presented_tokens(headers: &HeaderMap) -> Vec<&str> {
    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(strip_bearer);
    let admin_header = headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim);

    authorization
        .into_iter()
        .chain(admin_header)
        .filter(|token| !token.is_empty())
        .collect()
}

fn strip_bearer(value: &str) -> &str {
    let value = value.trim();
    let (scheme, rest) = value.split_once(char::is_whitespace).unwrap_or((value, ""));
    if scheme.eq_ignore_ascii_case("bearer") {
        rest.trim()
    } else {
        value
    }
}

/// Returns the first presented token that verifies
fn authorized_token<'a>(
    trigger: &AdminTrigger,
    headers: &'a HeaderMap,
) -> Result<&'a str, ApiError> {
    let tokens = presented_tokens(headers);

    if let Some(token) = tokens
        .iter()
        .copied()
        .find(|token| trigger.authorize(Some(*token)).is_ok())
    {
        return Ok(token);
    }

    let err = if tokens.is_empty() {
        AuthError::MissingToken
    } else {
        AuthError::InvalidToken
    };
    Err(IngestError::from(err).into())
}

/// Parses a JSON body; a blank body yields None
fn parse_body<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<Option<T>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    serde_json::from_slice(body)
        .map(Some)
        .map_err(|e| ApiError::bad_request(format!("Invalid request body: {}", e)))
}
