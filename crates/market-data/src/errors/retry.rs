/// Classification for retry policy.
///
/// Used by [`PriceGateway`](crate::gateway::PriceGateway) to decide how to
/// respond to a failed provider fetch.
///
/// # Behavior Summary
///
/// | Class | Retry This Provider? | Consult Fallback Cache? |
/// |-------|----------------------|-------------------------|
/// | `Never` | No | Yes, immediately |
/// | `WithBackoff` | Yes, until attempts are exhausted | Yes, after exhaustion |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Never retry - bad symbol, validation error, or terminal failure.
    /// The request is fundamentally invalid and retrying won't help.
    Never,

    /// Retry with exponential backoff plus jitter.
    ///
    /// Used for transient errors like rate limiting (429), timeouts, and
    /// provider-side failures. Attempts are capped; once exhausted the
    /// gateway degrades to the long-TTL fallback cache entry.
    WithBackoff,
}
