//! Call bounds
//!
//! Every backend call runs under a deadline; expiry is reported as a plain
//! message the caller folds into its transient error variant.

use std::future::Future;
use std::time::Duration;

/// Await `fut`, giving up after `limit`.
pub async fn within<F, T>(limit: Duration, operation: &str, fut: F) -> Result<T, String>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| format!("{} timed out after {}ms", operation, limit.as_millis()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn passes_through_fast_calls() {
        let value = within(Duration::from_secs(1), "noop", async { 7 }).await;
        assert_eq!(value, Ok(7));
    }

    #[tokio::test(start_paused = true)]
    async fn reports_expiry() {
        let result = within(
            Duration::from_millis(50),
            "profile lookup",
            tokio::time::sleep(Duration::from_secs(10)),
        )
        .await;
        assert_eq!(result, Err("profile lookup timed out after 50ms".to_string()));
    }
}
