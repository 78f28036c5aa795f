//! Backend self-registration.
//!
//! A backend announces its capabilities to the directory at startup and
//! withdraws them on shutdown. Registration is retried with exponential
//! backoff because backends commonly start before the directory does.

use std::time::Duration;

use crate::directory::client::{DirectoryClient, DirectoryError};
use crate::registry::CapabilityDecl;
use crate::resilience::backoff::calculate_backoff;

#[derive(Debug, Clone)]
pub struct SelfRegistration {
    client: DirectoryClient,
    service_url: String,
    models: Vec<CapabilityDecl>,
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl SelfRegistration {
    pub fn new(client: DirectoryClient, service_url: impl Into<String>, models: Vec<CapabilityDecl>) -> Self {
        Self {
            client,
            service_url: service_url.into(),
            models,
            max_attempts: 10,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
        }
    }

    pub fn with_retry(mut self, max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.base_delay = base_delay;
        self.max_delay = max_delay;
        self
    }

    pub fn service_url(&self) -> &str {
        &self.service_url
    }

    /// Register, retrying until the directory accepts or attempts run out.
    pub async fn register(&self) -> Result<(), DirectoryError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.client.register(&self.service_url, &self.models).await {
                Ok(_) => {
                    tracing::info!(
                        url = %self.service_url,
                        models = self.models.len(),
                        directory = %self.client.base_url(),
                        "Registered with directory"
                    );
                    return Ok(());
                }
                // The directory rejected the payload; retrying will not help.
                Err(DirectoryError::Status { status, body }) if (400..500).contains(&status) => {
                    tracing::error!(status, body = %body, "Directory rejected registration");
                    return Err(DirectoryError::Status { status, body });
                }
                Err(e) if attempt >= self.max_attempts => {
                    tracing::error!(error = %e, attempts = attempt, "Giving up on registration");
                    return Err(e);
                }
                Err(e) => {
                    let delay = calculate_backoff(
                        attempt,
                        self.base_delay.as_millis() as u64,
                        self.max_delay.as_millis() as u64,
                    );
                    tracing::warn!(error = %e, attempt, retry_in = ?delay, "Registration failed, retrying");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Withdraw the registration. Failures are logged, never returned.
    pub async fn unregister(&self) {
        match self.client.unregister(&self.service_url).await {
            Ok(_) => tracing::info!(url = %self.service_url, "Unregistered from directory"),
            Err(e) => tracing::warn!(url = %self.service_url, error = %e, "Failed to unregister"),
        }
    }
}
