use reqwest::Url;

use crate::error::VideoGenError;

use super::poll::PollOutcome;
use super::types::GenerationResult;

pub const MOCK_MESSAGE: &str =
    "No provider credential is configured, so a sample video is shown instead. \
     Set REPLICATE_API_TOKEN to generate real clips.";

pub const SUCCESS_MESSAGE: &str = "Your video is ready.";

/// Maps the terminal state of a generation to what the browser renders.
pub fn normalize(outcome: PollOutcome, mock_video_url: &Url) -> GenerationResult {
    match outcome {
        PollOutcome::Mock => GenerationResult::mock(mock_video_url, MOCK_MESSAGE),
        PollOutcome::Succeeded {
            prediction_id,
            video_url,
        } => GenerationResult::succeeded(prediction_id, &video_url, SUCCESS_MESSAGE),
        PollOutcome::Failed {
            prediction_id,
            error,
        } => failure(error, prediction_id),
    }
}

/// A `failed` result for any error, with field detail for validation errors.
pub fn failure(error: VideoGenError, prediction_id: Option<String>) -> GenerationResult {
    let message = error.to_string();
    match error {
        VideoGenError::Validation(field_errors) => {
            GenerationResult::failed(message, prediction_id).with_field_errors(field_errors)
        }
        _ => GenerationResult::failed(message, prediction_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldError;
    use crate::videogen::types::ResultStatus;

    fn mock_url() -> Url {
        Url::parse("https://example.com/sample.mp4").unwrap()
    }

    #[test]
    fn test_mock_outcome() {
        let result = normalize(PollOutcome::Mock, &mock_url());
        assert_eq!(result.status(), ResultStatus::Mock);
        assert_eq!(result.video_url(), Some("https://example.com/sample.mp4"));
        assert_eq!(result.message(), Some(MOCK_MESSAGE));
        assert_eq!(result.prediction_id(), None);
    }

    #[test]
    fn test_succeeded_outcome_carries_video_and_id() {
        let result = normalize(
            PollOutcome::Succeeded {
                prediction_id: "p-9".to_string(),
                video_url: Url::parse("https://x/video.mp4").unwrap(),
            },
            &mock_url(),
        );
        assert_eq!(result.status(), ResultStatus::Succeeded);
        assert_eq!(result.video_url(), Some("https://x/video.mp4"));
        assert_eq!(result.prediction_id(), Some("p-9"));
    }

    #[test]
    fn test_failed_outcomes_never_carry_video() {
        let errors = [
            VideoGenError::ProviderSubmission("rejected".to_string()),
            VideoGenError::ProviderPoll("reset".to_string()),
            VideoGenError::ProviderFailed("nsfw".to_string()),
            VideoGenError::Timeout(300),
            VideoGenError::PayloadShape("expected a video URL, got an object".to_string()),
            VideoGenError::Unknown("?".to_string()),
        ];

        for error in errors {
            let expected = error.to_string();
            let result = normalize(
                PollOutcome::Failed {
                    prediction_id: Some("p-1".to_string()),
                    error,
                },
                &mock_url(),
            );
            assert_eq!(result.status(), ResultStatus::Failed);
            assert_eq!(result.video_url(), None);
            assert_eq!(result.message(), Some(expected.as_str()));
            assert_eq!(result.prediction_id(), Some("p-1"));
        }
    }

    #[test]
    fn test_timeout_and_payload_messages() {
        let result = failure(VideoGenError::Timeout(300), None);
        assert!(result.message().unwrap().contains("timed out"));

        let result = failure(
            VideoGenError::PayloadShape("expected a video URL, got a number".to_string()),
            None,
        );
        assert!(result.message().unwrap().contains("unexpected payload"));
    }

    #[test]
    fn test_validation_failure_lists_fields() {
        let result = failure(
            VideoGenError::Validation(vec![FieldError::new("aspectRatio", "must be one of 16:9, 9:16, 1:1")]),
            None,
        );
        assert_eq!(result.status(), ResultStatus::Failed);
        assert_eq!(result.field_errors().len(), 1);
        assert_eq!(result.field_errors()[0].field, "aspectRatio");
    }
}
