//! Deferred email delivery as a queue job.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::MailError;
use crate::jobs::{Job, JobOpts, JobResult};
use crate::message::Email;
use crate::transport::Mailer;

/// Application state that can resolve mailers by name.
///
/// [`MailerRegistry`](crate::registry::MailerRegistry) implements this, so a
/// registry can serve directly as the job context:
///
/// ```ignore
/// let job = SendEmailJob::<MailerRegistry>::new(email).on_mailer("mailgun");
/// enqueue(&queue, job).await?;
/// ```
pub trait HasMailer: Send + Sync + 'static {
    /// Resolve a mailer; `None` selects the default.
    fn mailer(&self, name: Option<&str>) -> Result<Arc<dyn Mailer>, MailError>;
}

/// Queue job that delivers one email.
///
/// The worker retries up to 3 times on failure; the transport itself never
/// retries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendEmailJob<S = ()> {
    /// The email to send.
    pub email: Email,
    /// Mailer to send through; the context's default when unset.
    #[serde(default)]
    pub mailer: Option<String>,
    #[serde(skip)]
    _marker: PhantomData<S>,
}

impl<S> SendEmailJob<S> {
    /// Wrap an email for queued delivery.
    pub fn new(email: Email) -> Self {
        Self {
            email,
            mailer: None,
            _marker: PhantomData,
        }
    }

    /// Route the job through a named mailer.
    pub fn on_mailer(mut self, name: impl Into<String>) -> Self {
        self.mailer = Some(name.into());
        self
    }
}

#[async_trait]
impl<S: HasMailer> Job for SendEmailJob<S> {
    const JOB_TYPE: &'static str = "mail::send_email";
    type Context = S;

    fn default_opts() -> JobOpts {
        JobOpts {
            max_attempts: 3,
            ..Default::default()
        }
    }

    async fn perform(self, ctx: &Self::Context) -> JobResult {
        let mailer = ctx.mailer(self.mailer.as_deref())?;
        mailer.send(&self.email).await?;
        Ok(None)
    }
}
