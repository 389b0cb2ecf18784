/// Outbound mail client
///
/// Account lifecycle mail (welcome on registration, goodbye on account
/// deletion) goes through an HTTP mail relay. Sends are fire-and-forget:
/// they run on a spawned task, a failure is logged at warn level, and
/// the request that triggered them never waits or fails because of mail.
///
/// Without a configured relay every send is a debug-logged no-op, which
/// is the expected mode for local development and tests.

use serde_json::json;
use tracing::{debug, warn};

use crate::config::MailConfig;

/// Error type for mail delivery
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// The relay could not be reached
    #[error("Mail relay request failed: {0}")]
    Relay(#[from] reqwest::Error),

    /// The relay answered with a non-success status
    #[error("Mail relay rejected the message: {0}")]
    Rejected(reqwest::StatusCode),
}

/// HTTP mail relay client
///
/// Cheap to clone; the underlying HTTP client is shared.
#[derive(Debug, Clone)]
pub struct Mailer {
    client: reqwest::Client,
    config: MailConfig,
}

impl Mailer {
    /// Creates a mailer from configuration
    pub fn new(config: MailConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Sends one message through the relay
    ///
    /// A no-op when no relay is configured.
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        let relay_url = match &self.config.relay_url {
            Some(url) => url,
            None => {
                debug!(to, subject, "Mail relay not configured, skipping send");
                return Ok(());
            }
        };

        let payload = json!({
            "from": self.config.from_address,
            "to": to,
            "subject": subject,
            "text": body,
        });

        let mut request = self.client.post(relay_url).json(&payload);
        if let Some(token) = &self.config.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(MailError::Rejected(response.status()));
        }

        Ok(())
    }

    /// Queues the welcome mail for a new account
    pub fn send_welcome(&self, email: &str, name: &str) {
        self.dispatch(
            email.to_string(),
            "Thanks for joining in!".to_string(),
            format!("Welcome to the app {}", name),
        );
    }

    /// Queues the goodbye mail for a deleted account
    pub fn send_cancellation(&self, email: &str, name: &str) {
        self.dispatch(
            email.to_string(),
            "See you next time!".to_string(),
            format!("Goodbye {}, I hope to see you back sometime soon.", name),
        );
    }

    /// Spawns the actual send so callers never wait on the relay
    fn dispatch(&self, to: String, subject: String, body: String) {
        let mailer = self.clone();
        tokio::spawn(async move {
            if let Err(e) = mailer.send(&to, &subject, &body).await {
                warn!(to, subject, error = %e, "Failed to send mail");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disabled_mailer() -> Mailer {
        Mailer::new(MailConfig {
            relay_url: None,
            api_token: None,
            from_address: "taskhive@allmight.today".to_string(),
        })
    }

    #[tokio::test]
    async fn test_send_without_relay_is_noop() {
        let mailer = disabled_mailer();
        let result = mailer.send("user@example.com", "subject", "body").await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_dispatch_never_panics_without_relay() {
        let mailer = disabled_mailer();
        mailer.send_welcome("user@example.com", "Ada");
        mailer.send_cancellation("user@example.com", "Ada");
        // Give the spawned tasks a moment to run to completion
        tokio::task::yield_now().await;
    }
}
