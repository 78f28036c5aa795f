//! Deadlines for upstream calls.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Why an upstream call produced no response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpstreamError {
    #[error("no response within {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Transport(String),
}

/// Await `call`, failing with [`UpstreamError::Timeout`] once `limit` elapses.
pub async fn with_deadline<F, T, E>(limit: Duration, call: F) -> Result<T, UpstreamError>
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    match tokio::time::timeout(limit, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(UpstreamError::Transport(e.to_string())),
        Err(_) => Err(UpstreamError::Timeout(limit)),
    }
}
