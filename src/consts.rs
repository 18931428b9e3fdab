use std::ops::RangeInclusive;

pub const REPLICATE_API_URL: &str = "https://api.replicate.com/v1";

/// anotherjesse/zeroscope-v2-xl
pub const DEFAULT_REPLICATE_MODEL_VERSION: &str =
    "9f747673945c62801b13b84701c783929c0ee784e4748ec062204894dda1a351";

/// Served in mock mode when no provider credential is configured
pub const MOCK_VIDEO_URL: &str =
    "https://storage.googleapis.com/gtv-videos-bucket/sample/ForBiggerBlazes.mp4";

pub const MIN_PROMPT_CHARS: usize = 10;

pub const DURATION_RANGE_SECS: RangeInclusive<f64> = 4.0..=24.0;

pub const FRAMES_PER_SECOND: f64 = 8.0;

pub const MAX_FRAMES: u32 = 160;

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 3;

pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 300;

pub const DEFAULT_POLL_RETRY_LIMIT: u32 = 2;

pub const DEFAULT_PORT: u16 = 8080;

/// Request bodies are small JSON documents
pub const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;
