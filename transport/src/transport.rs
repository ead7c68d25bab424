//! Mailer trait and the Mailgun API transport.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::client::MailgunClient;
use crate::error::MailError;
use crate::message::Email;
use crate::payload::Payload;

/// Name under which the Mailgun API transport registers with a mailer
/// configuration.
pub const TRANSPORT_NAME: &str = "mailgun-api";

/// Async email sending trait.
///
/// Implement this trait to provide alternative email backends (e.g., SES,
/// SMTP relays).
#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    /// Send an email.
    async fn send(&self, email: &Email) -> Result<(), MailError>;

    /// Short identifier of the underlying transport, e.g. `"mailgun-api"`.
    fn transport(&self) -> &'static str;
}

/// Transport that delivers through the Mailgun HTTP API.
///
/// Client handle and sending domain are fixed at construction. Failures are
/// wrapped with a transport-identifying prefix and never retried here; retry
/// policy belongs to the queue worker running [`SendEmailJob`](crate::job::SendEmailJob).
#[derive(Clone)]
pub struct MailgunTransport {
    client: Arc<MailgunClient>,
    domain: String,
}

impl MailgunTransport {
    pub fn new(client: Arc<MailgunClient>, domain: impl Into<String>) -> Self {
        Self {
            client,
            domain: domain.into(),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }
}

impl fmt::Display for MailgunTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{TRANSPORT_NAME}")
    }
}

#[async_trait]
impl Mailer for MailgunTransport {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        let payload = Payload::from_email(email);

        match self.client.send_message(&self.domain, &payload).await {
            Ok(response) => {
                tracing::debug!(id = %response.id, domain = %self.domain, "email sent");
                Ok(())
            }
            Err(e) => Err(MailError::Transport(format!(
                "Unable to send message with the \"{TRANSPORT_NAME}\" transport: {e}"
            ))),
        }
    }

    fn transport(&self) -> &'static str {
        TRANSPORT_NAME
    }
}
