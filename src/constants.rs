//! Constants used throughout the application
//!
//! This module centralizes user-visible strings, endpoint paths and default values
//! to improve maintainability and consistency.

// Date sentinels
pub const INVALID_DATE: &str = "Invalid date";
pub const DATE_FORMAT_ERROR: &str = "Error formatting date";

// Backend endpoints
pub const ENDPOINT_COMMITS: &str = "/api/commits";
pub const ENDPOINT_CODE_FREQUENCY: &str = "/api/code_frequency";
pub const ENDPOINT_PULL_REQUESTS: &str = "/api/pull_requests";
pub const ENDPOINT_CONTRIBUTORS: &str = "/api/contributors";
pub const ENDPOINT_LANGUAGES: &str = "/api/languages";

// Fetch messages
pub const MSG_PROCESSING_DEFAULT: &str = "Data is being processed. Please wait...";
pub const MSG_RATE_LIMIT_LATER: &str = "GitHub API rate limit exceeded. Please try again later.";
pub const MSG_RATE_LIMIT_MINUTES: &str = "GitHub API rate limit exceeded. Please try again in {} minutes.";
pub const MSG_HTTP_STATUS: &str = "Request failed with status {}";

// Rate-limit markers inside backend error payloads, matched case-insensitively
pub const RATE_LIMIT_MARKERS: &[&str] = &["rate limit", "api limit"];

/// HTTP status the backend uses for "job accepted, still computing"
pub const STATUS_PROCESSING: u16 = 202;

// Fetch defaults
/// Hard timeout applied to each backend call
pub const DEFAULT_TIMEOUT_MS: u64 = 12_000;
/// Retries after the first attempt for timeouts and connection failures
pub const DEFAULT_MAX_RETRIES: u32 = 2;
/// Base of the linear retry backoff (`base * attempt`)
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 1_000;
/// Delay between polls while the backend is still processing
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5_000;
/// Upper bound accepted for `timeout_ms`
pub const MAX_TIMEOUT_MS: u64 = 120_000;
/// Lower bound accepted for `poll_interval_ms`
pub const MIN_POLL_INTERVAL_MS: u64 = 500;
/// Upper bound accepted for `max_retries`
pub const MAX_RETRIES_LIMIT: u32 = 10;

// API base URL resolution
pub const ENV_API_URL: &str = "REPOSTATS_API_URL";
pub const ENV_ENVIRONMENT: &str = "REPOSTATS_ENV";
pub const DEV_API_URL: &str = "http://localhost:8000";
pub const PROD_API_URL: &str = "http://backend:8000";

// UI Messages
pub const CONFIG_GENERATED: &str = "✅ Generated default configuration file";
pub const STATE_LOADING: &str = "⏳ Loading...";
pub const STATE_PROCESSING: &str = "🔄 Processing";
