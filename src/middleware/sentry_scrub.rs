use sentry::protocol::{Event, Request as SentryRequest};
use std::sync::Arc;

/// Field names whose values must never reach Sentry
pub const SENSITIVE_FIELDS: &[&str] = &[
    "authorization",
    "bearer",
    "token",
    "api_key",
    "apikey",
    "secret",
    "password",
    "cookie",
    "dsn",
];

/// Checks if a field name contains sensitive data
pub fn is_sensitive_field(field_name: &str) -> bool {
    let field_lower = field_name.to_lowercase();
    SENSITIVE_FIELDS
        .iter()
        .any(|sensitive| field_lower.contains(sensitive))
}

/// Scrubs sensitive data from Sentry events before sending
pub fn scrub_sensitive_data(mut event: Event<'static>) -> Option<Event<'static>> {
    if let Some(request) = &mut event.request {
        scrub_request(request);
    }

    event.extra.retain(|k, _| !is_sensitive_field(k));

    for (_key, context) in event.contexts.iter_mut() {
        if let sentry::protocol::Context::Other(map) = context {
            map.retain(|k, _| !is_sensitive_field(k));
        }
    }

    for breadcrumb in event.breadcrumbs.values.iter_mut() {
        breadcrumb.data.retain(|k, _| !is_sensitive_field(k));
    }

    Some(event)
}

fn scrub_request(request: &mut SentryRequest) {
    for (key, value) in request.headers.iter_mut() {
        if is_sensitive_field(key) {
            *value = "[REDACTED]".to_string();
        }
    }

    if let Some(query_string) = &request.query_string {
        if SENSITIVE_FIELDS
            .iter()
            .any(|field| query_string.to_lowercase().contains(field))
        {
            request.query_string = Some("[REDACTED]".to_string());
        }
    }

    // request.data is a raw string in the Sentry protocol
    if let Some(data_str) = &request.data {
        if SENSITIVE_FIELDS
            .iter()
            .any(|field| data_str.to_lowercase().contains(field))
        {
            request.data = Some("[REDACTED - Contains sensitive data]".to_string());
        }
    }
}

/// Hook for `sentry::ClientOptions::before_send`
pub fn create_before_send() -> Arc<dyn Fn(Event<'static>) -> Option<Event<'static>> + Send + Sync> {
    Arc::new(scrub_sensitive_data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_sensitive_field() {
        assert!(is_sensitive_field("Authorization"));
        assert!(is_sensitive_field("REPLICATE_API_TOKEN"));
        assert!(is_sensitive_field("sentry_dsn"));
        assert!(!is_sensitive_field("prompt"));
        assert!(!is_sensitive_field("aspectRatio"));
    }

    #[test]
    fn test_scrub_event_request_and_extra() {
        let mut event = Event::default();
        let mut request = SentryRequest::default();
        request
            .headers
            .insert("authorization".to_string(), "Bearer r8_live".to_string());
        request
            .headers
            .insert("content-type".to_string(), "application/json".to_string());
        request.data = Some(r#"{"replicate_api_token":"r8_live"}"#.to_string());
        event.request = Some(request);
        event
            .extra
            .insert("api_key".to_string(), serde_json::json!("abc"));
        event
            .extra
            .insert("prediction_id".to_string(), serde_json::json!("p-1"));

        let event = scrub_sensitive_data(event).unwrap();
        let request = event.request.unwrap();

        assert_eq!(request.headers["authorization"], "[REDACTED]");
        assert_eq!(request.headers["content-type"], "application/json");
        assert_eq!(
            request.data.as_deref(),
            Some("[REDACTED - Contains sensitive data]")
        );
        assert!(!event.extra.contains_key("api_key"));
        assert!(event.extra.contains_key("prediction_id"));
    }
}
