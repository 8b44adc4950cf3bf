//! Single-range byte serving with conditional request handling.

use std::io;

use axum::{
    body::Body,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    response::Response,
};
use chrono::{DateTime, Utc};
use tokio_util::io::ReaderStream;
use tracing::warn;

use crate::dissemination::{ArtifactFile, http_date};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeDecision {
    Full,
    /// Inclusive byte offsets.
    Partial { start: u64, end: u64 },
    NotModified,
    Unsatisfiable,
}

/// Decide how to answer a request for an entity of `size` bytes.
pub fn evaluate(
    headers: &HeaderMap,
    etag: &str,
    last_modified: DateTime<Utc>,
    size: u64,
) -> RangeDecision {
    if let Some(if_none_match) = header_str(headers, &header::IF_NONE_MATCH) {
        if etag_list_matches(if_none_match, etag) {
            return RangeDecision::NotModified;
        }
    } else if let Some(since) = header_str(headers, &header::IF_MODIFIED_SINCE)
        .and_then(parse_http_date)
    {
        if last_modified.timestamp() <= since.timestamp() {
            return RangeDecision::NotModified;
        }
    }

    let Some(range) = header_str(headers, &header::RANGE) else {
        return RangeDecision::Full;
    };

    if let Some(if_range) = header_str(headers, &header::IF_RANGE) {
        if !if_range_matches(if_range, etag, last_modified) {
            return RangeDecision::Full;
        }
    }

    match parse_range(range, size) {
        None => RangeDecision::Full,
        Some(Ok((start, end))) => RangeDecision::Partial { start, end },
        Some(Err(())) => RangeDecision::Unsatisfiable,
    }
}

/// Build the response for `file`, streaming the selected bytes.
pub async fn respond(file: &ArtifactFile, headers: &HeaderMap) -> io::Result<Response> {
    let size = file.size();
    let decision = evaluate(headers, file.etag(), file.updated(), size);

    let (status, body, content_length, content_range) = match decision {
        RangeDecision::Full => {
            let reader = file.open_range(0, size).await?;
            (
                StatusCode::OK,
                Body::from_stream(ReaderStream::new(reader)),
                Some(size),
                None,
            )
        }
        RangeDecision::Partial { start, end } => {
            let len = end - start + 1;
            let reader = file.open_range(start, len).await?;
            (
                StatusCode::PARTIAL_CONTENT,
                Body::from_stream(ReaderStream::new(reader)),
                Some(len),
                Some(format!("bytes {start}-{end}/{size}")),
            )
        }
        RangeDecision::NotModified => (StatusCode::NOT_MODIFIED, Body::empty(), None, None),
        RangeDecision::Unsatisfiable => (
            StatusCode::RANGE_NOT_SATISFIABLE,
            Body::empty(),
            None,
            Some(format!("bytes */{size}")),
        ),
    };

    let mut response = Response::new(body);
    *response.status_mut() = status;
    let out = response.headers_mut();
    put(out, header::ACCEPT_RANGES, "bytes");
    put(out, header::ETAG, file.etag());
    put(out, header::LAST_MODIFIED, &http_date(file.updated()));
    if let Some(length) = content_length {
        put(out, header::CONTENT_LENGTH, &length.to_string());
    }
    if let Some(content_range) = content_range {
        put(out, header::CONTENT_RANGE, &content_range);
    }

    Ok(response)
}

/// Insert a header, skipping values that are not valid header text.
pub fn put(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(err) => warn!(?err, header = %name, "dropping invalid header value"),
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

fn opaque_tag(tag: &str) -> &str {
    tag.trim().trim_start_matches("W/")
}

/// Weak comparison, as If-None-Match requires.
fn etag_list_matches(list: &str, etag: &str) -> bool {
    list.split(',')
        .map(str::trim)
        .any(|candidate| candidate == "*" || opaque_tag(candidate) == opaque_tag(etag))
}

/// Strong comparison for entity tags, exact second match for dates.
fn if_range_matches(value: &str, etag: &str, last_modified: DateTime<Utc>) -> bool {
    if value.starts_with('"') || value.starts_with("W/") {
        return !value.starts_with("W/") && value == etag;
    }
    parse_http_date(value)
        .map(|date| date.timestamp() == last_modified.timestamp())
        .unwrap_or(false)
}

/// `None` when the header should be ignored, `Some(Err)` when no byte of the
/// entity is selected.
fn parse_range(value: &str, size: u64) -> Option<Result<(u64, u64), ()>> {
    let (unit, spec) = value.split_once('=')?;
    if !unit.trim().eq_ignore_ascii_case("bytes") {
        return None;
    }
    let spec = spec.trim();
    if spec.contains(',') {
        return None;
    }
    let (first, last) = spec.split_once('-')?;
    let (first, last) = (first.trim(), last.trim());

    if first.is_empty() {
        let suffix: u64 = last.parse().ok()?;
        if suffix == 0 || size == 0 {
            return Some(Err(()));
        }
        return Some(Ok((size.saturating_sub(suffix), size - 1)));
    }

    let start: u64 = first.parse().ok()?;
    let end = if last.is_empty() {
        None
    } else {
        let end: u64 = last.parse().ok()?;
        if end < start {
            return None;
        }
        Some(end)
    };

    if start >= size {
        return Some(Err(()));
    }
    let end = end.map_or(size - 1, |end| end.min(size - 1));
    Some(Ok((start, end)))
}
