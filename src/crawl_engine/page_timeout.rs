//! Timeout utilities for page operations
//!
//! Every navigation and every DOM evaluation carries its own timeout so a
//! stuck page only loses that operation's result.

use anyhow::Result;
use std::future::Future;
use std::time::Duration;

/// Wrap an async page operation with an explicit timeout.
///
/// Returns an error that names the operation when the timeout fires, so the
/// caller can tell a timeout apart from an operation failure in the logs.
pub async fn with_page_timeout<F, T>(
    operation: F,
    timeout: Duration,
    operation_name: &str,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, operation).await {
        Ok(result) => result,
        Err(_) => Err(anyhow::anyhow!(
            "{operation_name} timeout after {:.1} seconds",
            timeout.as_secs_f64()
        )),
    }
}
