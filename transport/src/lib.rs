//! Mail delivery through the Mailgun HTTP API.
//!
//! This crate replaces SMTP delivery with calls to Mailgun's message-send
//! endpoint while keeping a structured message abstraction: recipients,
//! attachments, custom headers, tags, and metadata.
//!
//! # Quick Start
//!
//! ```ignore
//! // 1. Build a client and a transport for a sending domain
//! let client = Arc::new(MailgunClient::from_config(&mailgun_config));
//! let transport = MailgunTransport::new(client, "mg.example.com");
//!
//! // 2. Compose a message
//! let email = Email::builder()
//!     .from("Acme <noreply@example.com>")
//!     .to("user@example.com")
//!     .subject("Welcome!")
//!     .html("<p>Thanks for signing up.</p>")
//!     .tag("onboarding")
//!     .build()?;
//!
//! // 3. Send directly
//! transport.send(&email).await?;
//!
//! // 4. Or hand off to a queue for background delivery
//! let job = SendEmailJob::<AppState>::new(email).on_mailer("mailgun");
//! enqueue(&queue, job).await?;
//! ```
//!
//! Named mailers are configured through [`MailConfig`] and resolved through a
//! [`MailerRegistry`], so application code selects a transport by name the
//! same way it would pick an SMTP relay.

pub mod client;
pub mod config;
pub mod error;
pub mod job;
pub mod jobs;
pub mod message;
pub mod payload;
pub mod registry;
pub mod transport;

pub use client::{MailgunClient, SendResponse};
pub use config::{MailConfig, MailerConfig, MailgunConfig};
pub use error::MailError;
pub use job::{HasMailer, SendEmailJob};
pub use jobs::{
    enqueue, enqueue_with, Job, JobEntry, JobError, JobOpts, JobResult, JobStatus, MemoryQueue,
    QueueProvider,
};
pub use message::{Address, Attachment, Disposition, Email, EmailBuilder};
pub use payload::{FilePart, Payload, PayloadValue};
pub use registry::{MailerRegistry, RegisteredMailer};
pub use transport::{Mailer, MailgunTransport, TRANSPORT_NAME};
