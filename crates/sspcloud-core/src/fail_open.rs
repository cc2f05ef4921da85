//! Fail-open utilities for graceful degradation
//!
//! Reads that feed the user-facing click path must never surface storage
//! failures: when the settings store is unavailable the launcher is opened with
//! the hardcoded defaults instead.
//!
//! DO NOT use fail-open for:
//! - Settings writes (the user expects them to stick)
//! - Content script registration (the caller reports per-domain failures)

use std::future::Future;
use tracing::warn;

use crate::Result;

/// Execute an operation that should fail open
///
/// Logs the error via `tracing::warn!` on failure and returns `None`.
///
/// # Usage
///
/// ```no_run
/// use sspcloud_core::fail_open::fail_open;
/// use sspcloud_core::{Result, Settings};
///
/// async fn read_settings() -> Result<Settings> {
///     Ok(Settings::default())
/// }
///
/// async fn example() {
///     let settings = fail_open("settings_read", || read_settings()).await;
///     // settings is None if read_settings() failed
/// }
/// ```
pub async fn fail_open<F, Fut, T>(operation_name: &str, f: F) -> Option<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match f().await {
        Ok(val) => Some(val),
        Err(e) => {
            warn!("{} failed (fail-open): {}", operation_name, e);
            None
        }
    }
}

/// Like `fail_open` but substitutes `T::default()` on failure
pub async fn fail_open_or_default<F, Fut, T>(operation_name: &str, f: F) -> T
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
    T: Default,
{
    fail_open(operation_name, f).await.unwrap_or_default()
}
