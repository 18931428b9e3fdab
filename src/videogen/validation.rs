use std::str::FromStr;

use crate::consts::{DURATION_RANGE_SECS, MIN_PROMPT_CHARS};
use crate::error::{FieldError, VideoGenError};

use super::types::{AspectRatio, GenerateVideoRequest, GenerationRequest, Style};

/// Checks every field of the raw request and either returns the typed request
/// or all the problems found at once.
pub fn validate_request(raw: &GenerateVideoRequest) -> Result<GenerationRequest, VideoGenError> {
    let mut errors = Vec::new();

    let prompt = raw.prompt.as_deref().map(str::trim).unwrap_or_default();
    if prompt.chars().count() < MIN_PROMPT_CHARS {
        errors.push(FieldError::new(
            "prompt",
            format!("must be at least {MIN_PROMPT_CHARS} characters"),
        ));
    }

    let style = match raw.style.as_deref().map(str::trim) {
        Some(label) => Style::from_str(&label.to_lowercase()).ok(),
        None => None,
    };
    if style.is_none() {
        errors.push(FieldError::new(
            "style",
            format!("must be one of {}", Style::labels().join(", ")),
        ));
    }

    let aspect_ratio = raw
        .aspect_ratio
        .as_deref()
        .and_then(|r| AspectRatio::from_str(r.trim()).ok());
    if aspect_ratio.is_none() {
        errors.push(FieldError::new(
            "aspectRatio",
            format!("must be one of {}", AspectRatio::labels().join(", ")),
        ));
    }

    let duration = raw
        .duration
        .filter(|d| d.is_finite() && DURATION_RANGE_SECS.contains(d));
    if duration.is_none() {
        errors.push(FieldError::new(
            "duration",
            format!(
                "must be between {} and {} seconds",
                DURATION_RANGE_SECS.start(),
                DURATION_RANGE_SECS.end()
            ),
        ));
    }

    match (style, aspect_ratio, duration) {
        (Some(style), Some(aspect_ratio), Some(duration)) if errors.is_empty() => Ok(
            GenerationRequest::new(prompt.to_string(), style, aspect_ratio, duration),
        ),
        _ => Err(VideoGenError::Validation(errors)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_raw() -> GenerateVideoRequest {
        GenerateVideoRequest {
            prompt: Some("A lighthouse on a cliff during a storm".to_string()),
            style: Some("cinematic".to_string()),
            aspect_ratio: Some("16:9".to_string()),
            duration: Some(8.0),
        }
    }

    fn rejected_fields(raw: &GenerateVideoRequest) -> Vec<String> {
        match validate_request(raw) {
            Err(VideoGenError::Validation(errors)) => {
                errors.into_iter().map(|e| e.field).collect()
            }
            other => panic!("Expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_request_is_typed() {
        let request = validate_request(&valid_raw()).unwrap();
        assert_eq!(request.prompt(), "A lighthouse on a cliff during a storm");
        assert_eq!(request.style(), Style::Cinematic);
        assert_eq!(request.aspect_ratio(), AspectRatio::Landscape);
        assert_eq!(request.duration_secs(), 8.0);
        assert_eq!(request.frame_count(), 64);
    }

    #[test]
    fn test_prompt_is_trimmed_before_length_check() {
        let mut raw = valid_raw();
        raw.prompt = Some("   short    ".to_string());
        assert_eq!(rejected_fields(&raw), vec!["prompt"]);

        raw.prompt = Some("  exactly10!  ".to_string());
        assert_eq!(validate_request(&raw).unwrap().prompt(), "exactly10!");
    }

    #[test]
    fn test_style_is_case_insensitive_but_enumerated() {
        let mut raw = valid_raw();
        raw.style = Some("Anime".to_string());
        assert_eq!(validate_request(&raw).unwrap().style(), Style::Anime);

        raw.style = Some("vaporwave".to_string());
        assert_eq!(rejected_fields(&raw), vec!["style"]);
    }

    #[test]
    fn test_unsupported_aspect_ratio_rejected() {
        let mut raw = valid_raw();
        raw.aspect_ratio = Some("4:3".to_string());
        assert_eq!(rejected_fields(&raw), vec!["aspectRatio"]);
    }

    #[test]
    fn test_duration_bounds() {
        let mut raw = valid_raw();
        for ok in [4.0, 4.5, 24.0] {
            raw.duration = Some(ok);
            assert!(validate_request(&raw).is_ok(), "duration {ok}");
        }
        for bad in [3.99, 24.01, -1.0, f64::NAN, f64::INFINITY] {
            raw.duration = Some(bad);
            assert_eq!(rejected_fields(&raw), vec!["duration"], "duration {bad}");
        }
    }

    #[test]
    fn test_empty_request_reports_every_field() {
        let raw = GenerateVideoRequest::default();
        assert_eq!(
            rejected_fields(&raw),
            vec!["prompt", "style", "aspectRatio", "duration"]
        );
    }
}
