use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("missing required config: {0}")]
    MissingConfig(String),

    #[error("invalid email address: {0}")]
    InvalidAddress(String),

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("mailgun api error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("{0}")]
    Transport(String),

    #[error("Address '{0}' is not allowed to send emails to.")]
    NotWhitelisted(String),
}
