//! Utility functions

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// Version information for the tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
}

/// Get version information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown").to_string(),
        build_time: option_env!("BUILD_TIME").unwrap_or("unknown").to_string(),
    }
}

/// Poll loop options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    /// Delay between two checks
    pub interval: Duration,

    /// Upper bound on accumulated delay
    pub timeout: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            timeout: Duration::from_secs(120),
        }
    }
}

/// Result of a bounded poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Polled<T> {
    /// Last value returned by the check
    pub last: T,

    /// Accumulated delay, in whole intervals
    pub elapsed: Duration,

    /// Whether the predicate held for `last`
    pub satisfied: bool,
}

/// Check until `done` holds or the accumulated delay reaches the timeout.
///
/// The check runs once up front, then once after every `sleep_fn(interval)`.
/// Elapsed time is counted in interval increments rather than read from a
/// clock, so a no-op `sleep_fn` gives a fully simulated run. A check error
/// ends the loop immediately.
pub async fn poll_until<T, E, S, SF, P, PF, D>(
    options: &PollOptions,
    sleep_fn: S,
    mut check: P,
    done: D,
) -> Result<Polled<T>, E>
where
    S: Fn(Duration) -> SF,
    SF: Future<Output = ()>,
    P: FnMut() -> PF,
    PF: Future<Output = Result<T, E>>,
    D: Fn(&T) -> bool,
{
    let mut elapsed = Duration::ZERO;
    let mut last = check().await?;

    while !done(&last) && elapsed < options.timeout {
        sleep_fn(options.interval).await;
        elapsed += options.interval;
        last = check().await?;
    }

    let satisfied = done(&last);
    Ok(Polled {
        last,
        elapsed,
        satisfied,
    })
}
