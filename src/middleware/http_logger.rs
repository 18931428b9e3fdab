use axum::{
    body::{self, Body, Bytes, HttpBody},
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Instant;

use crate::consts::MAX_REQUEST_BODY_BYTES;

use super::sentry_scrub::{is_sensitive_field, SENSITIVE_FIELDS};

/// Largest body preview attached to a breadcrumb
const BODY_PREVIEW_LIMIT: usize = 10 * 1024;

fn should_capture_body(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| ct.contains("json") || ct.contains("text"))
}

/// Only bodies with a known length under the API limit are buffered.
/// Anything else streams through untouched and the handler decides.
fn fits_capture_limit(body: &Body) -> bool {
    body.size_hint()
        .upper()
        .is_some_and(|len| len <= MAX_REQUEST_BODY_BYTES as u64)
}

fn content_type(headers: &http::HeaderMap) -> Option<String> {
    headers
        .get(http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Logs every request and records it as a Sentry breadcrumb.
///
/// Bodies are only scrubbed and attached when the response status is >= 400.
/// Generation failures are answered with 200, so their detail comes from the
/// handler's own log lines instead.
pub async fn http_logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let request_headers = extract_safe_headers(req.headers());

    let capture = should_capture_body(content_type(req.headers()).as_deref())
        && fits_capture_limit(req.body());
    let (req, request_body) = if capture {
        let (parts, body) = req.into_parts();
        match body::to_bytes(body, MAX_REQUEST_BODY_BYTES).await {
            Ok(bytes) => {
                let preview = (!bytes.is_empty()).then(|| bytes.clone());
                (Request::from_parts(parts, Body::from(bytes)), preview)
            }
            Err(e) => {
                log::warn!("Failed to buffer request body for {} {}: {}", method, path, e);
                return (StatusCode::BAD_REQUEST, "Failed to read request body").into_response();
            }
        }
    } else {
        (req, None)
    };

    let res = next.run(req).await;

    let status = res.status().as_u16();
    let duration_ms = start.elapsed().as_millis() as u64;

    tracing::info!(
        method = %method,
        path = %path,
        status,
        duration_ms,
        "http request"
    );

    if status < 400 {
        add_lightweight_breadcrumb(method.as_str(), &path, status, duration_ms);
        return res;
    }

    let response_headers = extract_safe_headers(res.headers());
    let (res, response_body) = if should_capture_body(content_type(res.headers()).as_deref()) {
        let (parts, body) = res.into_parts();
        match body::to_bytes(body, usize::MAX).await {
            Ok(bytes) => {
                let preview = (!bytes.is_empty()).then(|| bytes.clone());
                (Response::from_parts(parts, Body::from(bytes)), preview)
            }
            Err(e) => {
                log::warn!("Failed to buffer response body: {}", e);
                return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to process response")
                    .into_response();
            }
        }
    } else {
        (res, None)
    };

    add_request_breadcrumb(
        method.as_str(),
        &path,
        &request_headers,
        request_body.as_ref().and_then(preview_body).as_deref(),
    );
    add_response_breadcrumb(
        status,
        duration_ms,
        &response_headers,
        response_body.as_ref().and_then(preview_body).as_deref(),
    );

    res
}

/// Truncated, scrubbed text form of a captured body
fn preview_body(bytes: &Bytes) -> Option<String> {
    if bytes.is_empty() {
        return None;
    }

    let body_str = match std::str::from_utf8(bytes) {
        Ok(s) => truncate_on_char_boundary(s, BODY_PREVIEW_LIMIT),
        Err(_) => return Some(format!("[Binary data, {} bytes]", bytes.len())),
    };

    if contains_sensitive_field(body_str) {
        Some(scrub_body(body_str))
    } else {
        Some(body_str.to_string())
    }
}

fn truncate_on_char_boundary(s: &str, max_bytes: usize) -> &str {
    let mut end = s.len().min(max_bytes);
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

fn extract_safe_headers(headers: &http::HeaderMap) -> BTreeMap<String, Value> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            let name = name.as_str().to_string();
            if is_sensitive_field(&name) {
                Some((name, Value::from("[REDACTED]")))
            } else {
                value.to_str().ok().map(|v| (name, Value::from(v)))
            }
        })
        .collect()
}

fn add_lightweight_breadcrumb(method: &str, path: &str, status: u16, duration_ms: u64) {
    let mut data = BTreeMap::new();
    data.insert("method".to_string(), Value::from(method));
    data.insert("url".to_string(), Value::from(path));
    data.insert("status_code".to_string(), Value::from(status));
    data.insert("duration_ms".to_string(), Value::from(duration_ms));

    sentry::add_breadcrumb(sentry::Breadcrumb {
        ty: "http".to_string(),
        category: Some("http.request".to_string()),
        message: Some(format!("{} {} {} ({}ms)", method, path, status, duration_ms)),
        data: data.into_iter().collect(),
        level: sentry::Level::Info,
        ..Default::default()
    });
}

fn add_request_breadcrumb(
    method: &str,
    path: &str,
    headers: &BTreeMap<String, Value>,
    body_preview: Option<&str>,
) {
    let mut data = BTreeMap::new();
    data.insert("method".to_string(), Value::from(method));
    data.insert("url".to_string(), Value::from(path));
    if !headers.is_empty() {
        data.insert("headers".to_string(), serde_json::json!(headers));
    }
    if let Some(body) = body_preview {
        data.insert("body".to_string(), Value::from(body));
    }

    sentry::add_breadcrumb(sentry::Breadcrumb {
        ty: "http".to_string(),
        category: Some("http.request".to_string()),
        message: Some(format!("{} {}", method, path)),
        data: data.into_iter().collect(),
        level: sentry::Level::Info,
        ..Default::default()
    });
}

fn add_response_breadcrumb(
    status: u16,
    duration_ms: u64,
    headers: &BTreeMap<String, Value>,
    body_preview: Option<&str>,
) {
    let mut data = BTreeMap::new();
    data.insert("status_code".to_string(), Value::from(status));
    data.insert("duration_ms".to_string(), Value::from(duration_ms));
    if !headers.is_empty() {
        data.insert("headers".to_string(), serde_json::json!(headers));
    }
    if let Some(body) = body_preview {
        data.insert("body".to_string(), Value::from(body));
    }

    let level = if status >= 500 {
        sentry::Level::Error
    } else {
        sentry::Level::Warning
    };

    sentry::add_breadcrumb(sentry::Breadcrumb {
        ty: "http".to_string(),
        category: Some("http.response".to_string()),
        message: Some(format!("HTTP {} ({}ms)", status, duration_ms)),
        data: data.into_iter().collect(),
        level,
        ..Default::default()
    });
}

fn contains_sensitive_field(body: &str) -> bool {
    let body_lower = body.to_lowercase();
    SENSITIVE_FIELDS.iter().any(|field| body_lower.contains(field))
}

/// Redacts sensitive keys in a JSON body. Anything that is not JSON is
/// dropped entirely, since there is no structure to redact within.
fn scrub_body(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(mut json) => {
            scrub_json_value(&mut json);
            json.to_string()
        }
        Err(_) => "[REDACTED - Contains sensitive data]".to_string(),
    }
}

fn scrub_json_value(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, val) in map.iter_mut() {
                if is_sensitive_field(key) {
                    *val = Value::from("[REDACTED]");
                } else {
                    scrub_json_value(val);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(scrub_json_value),
        _ => {}
    }
}
