use axum::{
    body::Body,
    extract::{rejection::QueryRejection, DefaultBodyLimit, Multipart, Path, Query, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE, LOCATION},
        HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use ephemera_core::token::is_well_formed;
use ephemera_core::{
    DiskMedium, Ephemera, FileRecord, ReasonCode, Resolved, StandardResult, StoreError,
};
use serde::Deserialize;
use std::time::Duration;
use tokio_util::io::ReaderStream;
use tower_http::trace::TraceLayer;
use url::Url;

use crate::upload;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub service: Ephemera<DiskMedium>,
}

#[derive(Debug, Deserialize)]
struct CreateQuery {
    link: Option<String>,
    /// Milliseconds
    ttl: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TtlQuery {
    /// Milliseconds
    ttl: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct DownloadQuery {
    dl: Option<String>,
}

impl DownloadQuery {
    fn as_attachment(&self) -> bool {
        self.dl.as_deref() == Some("1")
    }
}

/// Builds the application router
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/api/hash/create", get(create_link))
        .route("/api/hash/find/{token}", get(find_link))
        .route("/api/hash/file/upload", post(upload_file))
        .route("/api/hash/file/{token}", get(get_file))
        .route("/{token}", get(resolve_any))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Parses an absolute http(s) URL that names a host.
///
/// The returned form is normalised: tabs and newlines are stripped and
/// non-ASCII is percent-encoded, so it is always a valid `Location` value.
fn parse_target(candidate: &str) -> Option<Url> {
    Url::parse(candidate)
        .ok()
        .filter(|parsed| matches!(parsed.scheme(), "http" | "https") && parsed.host().is_some())
}

/// A zero TTL means "use the default", same as leaving it out
fn ttl_from_millis(ttl: Option<u64>) -> Option<Duration> {
    ttl.filter(|ms| *ms > 0).map(Duration::from_millis)
}

fn status_for(result: &StandardResult) -> StatusCode {
    match result.reason_code {
        ReasonCode::Success => StatusCode::OK,
        ReasonCode::NotFound | ReasonCode::DanglingReference => StatusCode::NOT_FOUND,
        ReasonCode::GenerationExhausted => StatusCode::SERVICE_UNAVAILABLE,
        ReasonCode::InvalidRequest => StatusCode::BAD_REQUEST,
    }
}

fn respond(result: StandardResult) -> Response {
    (status_for(&result), Json(result)).into_response()
}

fn not_found(token: String) -> Response {
    respond(StandardResult::from_error(&StoreError::NotFound(token)))
}

fn bad_query(rejection: QueryRejection) -> Response {
    respond(StandardResult::invalid_request(format!(
        "Malformed query: {}",
        rejection.body_text()
    )))
}

async fn create_link(
    State(state): State<AppState>,
    query: Result<Query<CreateQuery>, QueryRejection>,
) -> Response {
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => return bad_query(rejection),
    };
    let usage = format!(
        "Usage is {}/api/hash/create?link=",
        state.service.addresses().base_url()
    );
    let Some(link) = query.link.filter(|link| !link.trim().is_empty()) else {
        return respond(StandardResult::invalid_request(format!(
            "No link present in query. {usage}"
        )));
    };
    let Some(target) = parse_target(&link) else {
        return respond(StandardResult::invalid_request(format!(
            "Only absolute http(s) links can be shortened. {usage}"
        )));
    };

    respond(state.service.create_link(String::from(target), ttl_from_millis(query.ttl)))
}

async fn find_link(State(state): State<AppState>, Path(token): Path<String>) -> Response {
    if !is_well_formed(&token) {
        return not_found(token);
    }
    respond(state.service.resolve_link(&token))
}

async fn upload_file(
    State(state): State<AppState>,
    query: Result<Query<TtlQuery>, QueryRejection>,
    mut multipart: Multipart,
) -> Response {
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => return bad_query(rejection),
    };
    let medium = state.service.files().medium();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                return respond(StandardResult::invalid_request(format!(
                    "Malformed form-data: {err}"
                )))
            }
        };
        if field.name() != Some("file") {
            continue;
        }

        let original_name = field.file_name().map(str::to_string);
        let mime_type = field.content_type().map(str::to_string);
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(err) => {
                return respond(StandardResult::invalid_request(format!(
                    "Could not read the uploaded file: {err}"
                )))
            }
        };

        let metadata = match upload::store_upload(
            medium,
            original_name.as_deref(),
            mime_type.as_deref(),
            &bytes,
        )
        .await
        {
            Ok(metadata) => metadata,
            Err(err) => {
                tracing::error!("failed to write upload: {}", err);
                return (StatusCode::INTERNAL_SERVER_ERROR, "failed to store upload").into_response();
            }
        };

        let storage_key = metadata.storage_key.clone();
        let result = state
            .service
            .create_file_record(metadata, ttl_from_millis(query.ttl));
        if !result.ok {
            upload::discard_upload(medium, &storage_key).await;
        }
        return respond(result);
    }

    respond(StandardResult::invalid_request(
        "No file present in form-data. Send it in a field named `file`.",
    ))
}

async fn get_file(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Query(query): Query<DownloadQuery>,
) -> Response {
    if !is_well_formed(&token) {
        return not_found(token);
    }
    match state.service.files().find(&token).await {
        Ok(record) => send_file(&state, &record, query.as_attachment()).await,
        Err(err) => respond(StandardResult::from_error(&err)),
    }
}

/// Link first, then file; neither is a 404
async fn resolve_any(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Query(query): Query<DownloadQuery>,
) -> Response {
    if !is_well_formed(&token) {
        return not_found(token);
    }
    match state.service.resolve(&token).await {
        Ok(Resolved::Link(record)) => {
            match HeaderValue::from_str(&record.payload().target_url) {
                Ok(location) => (StatusCode::FOUND, [(LOCATION, location)]).into_response(),
                Err(_) => {
                    tracing::warn!("link {} has an unusable target", record.token());
                    not_found(token)
                }
            }
        }
        Ok(Resolved::File(record)) => send_file(&state, &record, query.as_attachment()).await,
        Err(err) => respond(StandardResult::from_error(&err)),
    }
}

/// Streams the bytes of a verified file record back to the client
async fn send_file(state: &AppState, record: &FileRecord, attachment: bool) -> Response {
    let file = record.payload();
    let dangling = || {
        respond(StandardResult::from_error(&StoreError::DanglingReference {
            token: record.token().to_string(),
            storage_key: file.storage_key.clone(),
        }))
    };

    let Some(path) = state.service.files().medium().path_for(&file.storage_key) else {
        return dangling();
    };
    // The object can still vanish between verify and open.
    let handle = match tokio::fs::File::open(&path).await {
        Ok(handle) => handle,
        Err(err) => {
            tracing::debug!("open of {} failed: {}", file.storage_key, err);
            return dangling();
        }
    };

    let content_type = HeaderValue::from_str(&file.mime_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let disposition = if attachment { "attachment" } else { "inline" };
    let content_disposition =
        HeaderValue::from_str(&format!("{disposition}; filename=\"{}\"", file.original_name))
            .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    (
        [(CONTENT_TYPE, content_type), (CONTENT_DISPOSITION, content_disposition)],
        Body::from_stream(ReaderStream::new(handle)),
    )
        .into_response()
}
