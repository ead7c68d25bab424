//! Mail configuration.
//!
//! Configuration is layered: an optional `mail.toml` file first, then
//! environment variables with the `MAIL` prefix (`__` separates nesting), so
//! `MAIL_MAILGUN__SECRET=key-...` overrides `[mailgun] secret`. A minimal
//! file looks like:
//!
//! ```toml
//! default = "mailgun"
//! app_name = "Acme"
//! from = "Acme <noreply@example.com>"
//! whitelist = ["dev@example.com"]
//!
//! [mailgun]
//! secret = "key-..."
//! endpoint = "https://api.eu.mailgun.net"
//!
//! [mailers.mailgun]
//! transport = "mailgun-api"
//! domain = "mg.example.com"
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::client::DEFAULT_ENDPOINT;
use crate::error::MailError;
use crate::message::Address;

/// Top-level mail configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// Name of the default mailer.
    pub default: String,
    /// Application display name, used for the default test subject.
    pub app_name: String,
    /// Global default sender address.
    pub from: Option<Address>,
    /// Exact-match list of addresses mail may be sent to.
    pub whitelist: Vec<String>,
    /// Named mailer definitions.
    pub mailers: HashMap<String, MailerConfig>,
    /// Mailgun API credentials.
    pub mailgun: Option<MailgunConfig>,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            default: "mailgun".to_string(),
            app_name: "Application".to_string(),
            from: None,
            whitelist: Vec::new(),
            mailers: HashMap::new(),
            mailgun: None,
        }
    }
}

/// A single named mailer.
#[derive(Debug, Clone, Deserialize)]
pub struct MailerConfig {
    /// Transport name, e.g. `"mailgun-api"`.
    pub transport: String,
    /// Sending domain for API transports.
    #[serde(default)]
    pub domain: Option<String>,
    /// Mailer-specific default sender, overriding the global one.
    #[serde(default)]
    pub from: Option<Address>,
}

/// Mailgun API credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct MailgunConfig {
    /// API key.
    pub secret: String,
    /// API base endpoint; full URL or bare host.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

impl MailConfig {
    /// Load from `mail.toml` in the working directory plus the environment.
    pub fn load() -> Result<Self, MailError> {
        Self::from_file("mail.toml")
    }

    /// Load from an explicit file path plus the environment. A missing file
    /// is not an error; the environment alone may carry the configuration.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MailError> {
        let source = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix("MAIL")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(|e| MailError::MissingConfig(e.to_string()))?;

        source
            .try_deserialize()
            .map_err(|e| MailError::MissingConfig(e.to_string()))
    }

    /// Default sender for `mailer`: its own `from`, falling back to the
    /// global one.
    pub fn default_from(&self, mailer: &str) -> Option<Address> {
        self.mailers
            .get(mailer)
            .and_then(|config| config.from.clone())
            .or_else(|| self.from.clone())
    }

    /// Whether `address` is an exact member of the whitelist.
    pub fn is_whitelisted(&self, address: &str) -> bool {
        self.whitelist.iter().any(|allowed| allowed == address)
    }
}
