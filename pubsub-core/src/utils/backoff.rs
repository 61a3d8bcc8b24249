use std::time::Duration;

/// Largest exponent used by [`backoff_delay`] (2^5 = 32 seconds).
pub const MAX_BACKOFF_EXPONENT: u32 = 5;

/// Delay before the next attempt after `failures` consecutive failures.
///
/// Exponential: 2^failures seconds, capped at 2^[`MAX_BACKOFF_EXPONENT`].
pub fn backoff_delay(failures: u32) -> Duration {
    Duration::from_secs(2u64.pow(failures.min(MAX_BACKOFF_EXPONENT)))
}
