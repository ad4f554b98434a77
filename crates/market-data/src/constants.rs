//! Cache TTLs and retry defaults shared across the crate.

/// TTL for live quote cache entries (5 minutes).
pub const QUOTE_TTL_SECS: u64 = 300;

/// TTL for last-known-good fallback entries (1 hour).
pub const FALLBACK_TTL_SECS: u64 = 3_600;

/// TTL for historical FX rates (7 days). Historical values are immutable,
/// the TTL only bounds memory.
pub const HISTORICAL_RATE_TTL_SECS: u64 = 604_800;

/// TTL for the CoinGecko symbol-to-id mapping (24 hours).
pub const COIN_ID_MAP_TTL_SECS: u64 = 86_400;

/// TTL for external search results (60 seconds).
pub const SEARCH_TTL_SECS: u64 = 60;

/// Maximum fetch attempts per provider request.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Base delay for exponential backoff, in milliseconds.
pub const DEFAULT_BASE_DELAY_MS: u64 = 500;

/// Cap on a single backoff delay, in milliseconds.
pub const DEFAULT_MAX_DELAY_MS: u64 = 5_000;

/// Upper bound of the uniform jitter added to each backoff delay.
pub const DEFAULT_JITTER_MS: u64 = 250;

/// Hard timeout for one HTTP attempt, independent of the retry loop.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;
