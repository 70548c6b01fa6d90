use std::time::Instant;

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use fsb_core::{
    formatting::get_readable_time,
    links::FileLinks,
    media::{guess_mime, MediaKind},
    store::{FileAction, FileRecord},
};

use crate::pages;
use crate::range::{parse_range, ByteRange};
use crate::streaming::slice_stream;
use crate::WebState;

const CACHE_CONTROL: &str = "public, max-age=3600";

#[derive(Debug, Deserialize)]
pub struct HashQuery {
    pub hash: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_files: i64,
    pub total_users: i64,
    pub total_views: i64,
    pub total_downloads: i64,
    pub uptime: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Disposition {
    Inline,
    Attachment,
}

impl Disposition {
    fn as_str(self) -> &'static str {
        match self {
            Disposition::Inline => "inline",
            Disposition::Attachment => "attachment",
        }
    }

    fn action(self) -> FileAction {
        match self {
            Disposition::Inline => FileAction::View,
            Disposition::Attachment => FileAction::Download,
        }
    }
}

fn text(status: StatusCode, body: &'static str) -> Response {
    (status, body).into_response()
}

fn internal_error() -> Response {
    text(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

/// GET /
pub async fn index(State(state): State<WebState>) -> Html<String> {
    Html(pages::index(&state.bot_username))
}

/// GET /stats
pub async fn stats(State(state): State<WebState>) -> Response {
    match state.store.get_bot_stats().await {
        Ok(s) => {
            let uptime = (Utc::now() - s.uptime_start).num_seconds().max(0) as u64;
            Json(StatsResponse {
                total_files: s.total_files,
                total_users: s.total_users,
                total_views: s.total_views,
                total_downloads: s.total_downloads,
                uptime: get_readable_time(uptime),
            })
            .into_response()
        }
        Err(e) => {
            tracing::error!("stats lookup failed: {e}");
            internal_error()
        }
    }
}

/// GET /watch/{message_id}/{filename}?hash=
pub async fn watch(
    State(state): State<WebState>,
    Path((message_id, file_name)): Path<(String, String)>,
    Query(q): Query<HashQuery>,
    headers: HeaderMap,
) -> Response {
    serve_file(&state, &message_id, &file_name, q.hash, &headers, Disposition::Inline).await
}

/// GET /dl/{message_id}/{filename}?hash=
pub async fn download(
    State(state): State<WebState>,
    Path((message_id, file_name)): Path<(String, String)>,
    Query(q): Query<HashQuery>,
    headers: HeaderMap,
) -> Response {
    serve_file(&state, &message_id, &file_name, q.hash, &headers, Disposition::Attachment).await
}

/// GET /{file_hash}
pub async fn short_link(State(state): State<WebState>, Path(hash): Path<String>) -> Response {
    let file = match state.store.find_file_by_hash(&hash).await {
        Ok(Some(f)) => f,
        Ok(None) => return text(StatusCode::NOT_FOUND, "File not found"),
        Err(e) => {
            tracing::error!(hash = %hash, "short link lookup failed: {e}");
            return internal_error();
        }
    };

    let name = file.file_name.as_deref().unwrap_or("file");
    match FileLinks::build(&state.public_url, file.message_id, name, &file.file_hash) {
        Ok(links) => Html(pages::file_card(&file, &links.stream, &links.download)).into_response(),
        Err(e) => {
            tracing::error!("link build failed: {e}");
            internal_error()
        }
    }
}

/// GET /thumb/{message_id}
pub async fn thumbnail(State(state): State<WebState>, Path(message_id): Path<String>) -> Response {
    let Ok(message_id) = message_id.parse::<i32>() else {
        return text(StatusCode::NOT_FOUND, "No thumbnail");
    };
    let file = match state.store.find_file_by_message(message_id).await {
        Ok(Some(f)) if f.kind() == Some(MediaKind::Photo) => f,
        Ok(_) => return text(StatusCode::NOT_FOUND, "No thumbnail"),
        Err(e) => {
            tracing::error!(message_id, "thumbnail lookup failed: {e}");
            return text(StatusCode::NOT_FOUND, "No thumbnail");
        }
    };

    match state.files.fetch(&file.file_id).await {
        Ok(data) => (
            [
                (header::CONTENT_TYPE, "image/jpeg"),
                (header::CACHE_CONTROL, CACHE_CONTROL),
            ],
            data,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(message_id, "thumbnail error: {e}");
            text(StatusCode::NOT_FOUND, "No thumbnail")
        }
    }
}

async fn serve_file(
    state: &WebState,
    message_id: &str,
    file_name: &str,
    hash: Option<String>,
    headers: &HeaderMap,
    disposition: Disposition,
) -> Response {
    let started = Instant::now();

    let Some(hash) = hash.filter(|h| !h.is_empty()) else {
        return text(StatusCode::BAD_REQUEST, "Invalid request");
    };
    let Ok(message_id) = message_id.parse::<i32>() else {
        return text(StatusCode::BAD_REQUEST, "Invalid request");
    };

    let file = match state.store.find_file_by_message(message_id).await {
        Ok(Some(f)) => f,
        Ok(None) => return text(StatusCode::NOT_FOUND, "File not found"),
        Err(e) => {
            tracing::error!(message_id, "file lookup failed: {e}");
            return internal_error();
        }
    };
    if file.file_hash != hash {
        return text(StatusCode::FORBIDDEN, "Invalid hash");
    }

    let size = file.file_size.max(0) as u64;
    let range = parse_range(headers.get(header::RANGE).and_then(|v| v.to_str().ok()), size);
    if range == ByteRange::Unsatisfiable {
        return (
            StatusCode::RANGE_NOT_SATISFIABLE,
            [(header::CONTENT_RANGE, format!("bytes */{size}"))],
        )
            .into_response();
    }

    let stream = match state.files.open(&file.file_id).await {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(message_id, "file serving error: {e}");
            return internal_error();
        }
    };

    if let Err(e) = state.store.update_file_stats(file.id, disposition.action()).await {
        tracing::warn!(message_id, "counter update failed: {e}");
    }

    let response = build_file_response(&file, file_name, size, range, disposition, stream);
    if let Err(e) = state
        .store
        .record_response_time(started.elapsed().as_secs_f64() * 1000.0)
        .await
    {
        tracing::debug!("response time not recorded: {e}");
    }

    tracing::debug!(message_id, ?range, mode = disposition.as_str(), "serving {file_name}");
    response.unwrap_or_else(|e| {
        tracing::error!(message_id, "response build failed: {e}");
        internal_error()
    })
}

fn build_file_response(
    file: &FileRecord,
    file_name: &str,
    size: u64,
    range: ByteRange,
    disposition: Disposition,
    stream: fsb_core::ports::ByteStream,
) -> axum::http::Result<Response> {
    let mime = file
        .mime_type
        .clone()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| guess_mime(file_name).to_string());

    let mut builder = Response::builder()
        .header(header::CONTENT_TYPE, mime)
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CACHE_CONTROL, CACHE_CONTROL)
        .header(header::CONTENT_DISPOSITION, content_disposition(disposition, file_name));

    let body = match range {
        ByteRange::Partial { start, end } => {
            builder = builder
                .status(StatusCode::PARTIAL_CONTENT)
                .header(header::CONTENT_RANGE, format!("bytes {start}-{end}/{size}"))
                .header(header::CONTENT_LENGTH, range.len(size));
            Body::from_stream(slice_stream(stream, start, range.len(size)))
        }
        _ => {
            builder = builder.status(StatusCode::OK);
            if size > 0 {
                builder = builder.header(header::CONTENT_LENGTH, size);
            }
            Body::from_stream(stream)
        }
    };
    builder.body(body)
}

/// `inline; filename="ascii"; filename*=UTF-8''percent-encoded`
fn content_disposition(disposition: Disposition, file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if c == ' ' || (c.is_ascii_graphic() && c != '"' && c != '\\') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if fallback == file_name {
        return format!("{}; filename=\"{fallback}\"", disposition.as_str());
    }

    let mut encoded = String::with_capacity(file_name.len() * 3);
    for b in file_name.bytes() {
        if b.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&b) {
            encoded.push(b as char);
        } else {
            encoded.push_str(&format!("%{b:02X}"));
        }
    }
    format!(
        "{}; filename=\"{fallback}\"; filename*=UTF-8''{encoded}",
        disposition.as_str()
    )
}
