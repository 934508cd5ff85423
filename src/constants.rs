// src/constants.rs
//! Domain constants that define the operational boundaries of the system.
//!
//! Each constant is named for the domain concept it constrains, not its
//! technical role. Reading these constants should tell you the story
//! of how the system operates: how deep it crawls, how fast it calls,
//! where it keeps its state.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Notion API boundaries
// ---------------------------------------------------------------------------

/// How many objects the Notion API returns per page of results.
///
/// The Notion API maximum is 100. We use the maximum to minimize
/// round-trips during recursive fetching.
pub const NOTION_API_PAGE_SIZE: usize = 100;

/// Maximum nesting depth when recursively fetching from the Notion API.
///
/// Notion pages can nest arbitrarily deep (pages within databases within
/// pages). This limit prevents stack overflow and runaway fetches.
/// 50 levels is far deeper than any real Notion workspace.
pub const NOTION_MAX_FETCH_DEPTH: u8 = 50;

/// Default nesting depth for block tree and workspace crawls.
pub const DEFAULT_FETCH_DEPTH: u8 = 10;

// ---------------------------------------------------------------------------
// Rate limiting
// ---------------------------------------------------------------------------

/// Length of the rate limiter's rolling window.
pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(1);

/// Default number of API requests admitted per window.
///
/// Notion documents an average of three requests per second per
/// integration. Staying at the documented average keeps long crawls from
/// tripping `rate_limited` responses in the first place.
pub const DEFAULT_MAX_REQUESTS_PER_SECOND: usize = 3;

// ---------------------------------------------------------------------------
// Retry behavior
// ---------------------------------------------------------------------------

/// How many times a transient API failure is retried before giving up.
pub const RETRY_MAX_ATTEMPTS: u32 = 3;

/// Delay before the first retry; doubles on each subsequent attempt.
pub const RETRY_INITIAL_DELAY: Duration = Duration::from_millis(500);

/// Upper bound on the backoff delay between retries.
pub const RETRY_MAX_DELAY: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Manifest storage
// ---------------------------------------------------------------------------

/// Directory (relative to the working directory) holding manifest files.
pub const MANIFEST_DIR_NAME: &str = ".notion2docs";

/// Manifest file name prefix; the root page ID and `.json` follow it.
pub const MANIFEST_FILE_PREFIX: &str = "manifest-";

// ---------------------------------------------------------------------------
// Error display
// ---------------------------------------------------------------------------

/// Maximum characters shown when previewing error response bodies.
pub const ERROR_BODY_PREVIEW_LENGTH: usize = 200;
