//! Named mailer registry.
//!
//! Mail configuration declares mailers by name; the registry turns that
//! declaration into live transports once, at startup, so application code
//! selects a mailer the way it would in per-mailer configuration:
//!
//! ```ignore
//! let registry = MailerRegistry::from_config(&config)?;
//! registry.mailer("mailgun")?.send(&email).await?;
//! ```
//!
//! Construction is where configuration errors surface: a mailer declared on
//! the `mailgun-api` transport without API credentials fails here, before any
//! send is attempted.

use std::collections::HashMap;
use std::sync::Arc;

use crate::client::MailgunClient;
use crate::config::MailConfig;
use crate::error::MailError;
use crate::job::HasMailer;
use crate::message::Address;
use crate::transport::{Mailer, MailgunTransport, TRANSPORT_NAME};

/// A configured, ready-to-use mailer.
pub struct RegisteredMailer {
    /// Transport name the mailer was built on.
    pub transport: &'static str,
    /// Mailer-specific default sender.
    pub from: Option<Address>,
    mailer: Arc<dyn Mailer>,
}

impl RegisteredMailer {
    pub fn mailer(&self) -> Arc<dyn Mailer> {
        Arc::clone(&self.mailer)
    }
}

/// All configured mailers, keyed by name.
pub struct MailerRegistry {
    default: String,
    global_from: Option<Address>,
    mailers: HashMap<String, RegisteredMailer>,
}

impl MailerRegistry {
    /// Build every configured mailer.
    ///
    /// All mailers on the `mailgun-api` transport share one
    /// [`MailgunClient`]; missing credentials or an unknown transport string
    /// are configuration errors, fatal before any send.
    pub fn from_config(config: &MailConfig) -> Result<Self, MailError> {
        let client = if config
            .mailers
            .values()
            .any(|mailer| mailer.transport == TRANSPORT_NAME)
        {
            let mailgun = config.mailgun.as_ref().ok_or_else(|| {
                MailError::MissingConfig(
                    "mailgun.secret: cannot instantiate Mailgun API client".to_string(),
                )
            })?;
            if mailgun.secret.is_empty() {
                return Err(MailError::MissingConfig(
                    "mailgun.secret: cannot instantiate Mailgun API client".to_string(),
                ));
            }
            Some(Arc::new(MailgunClient::from_config(mailgun)))
        } else {
            None
        };

        let mut mailers = HashMap::new();
        for (name, mailer_config) in &config.mailers {
            let mailer: Arc<dyn Mailer> = match mailer_config.transport.as_str() {
                TRANSPORT_NAME => {
                    let client = client.clone().ok_or_else(|| {
                        MailError::MissingConfig(format!("mailers.{name}: mailgun client missing"))
                    })?;
                    let domain = mailer_config.domain.clone().ok_or_else(|| {
                        MailError::MissingConfig(format!("mailers.{name}.domain"))
                    })?;
                    Arc::new(MailgunTransport::new(client, domain))
                }
                other => {
                    return Err(MailError::MissingConfig(format!(
                        "mailers.{name}.transport: unknown transport '{other}'"
                    )))
                }
            };

            mailers.insert(
                name.clone(),
                RegisteredMailer {
                    transport: TRANSPORT_NAME,
                    from: mailer_config.from.clone(),
                    mailer,
                },
            );
        }

        Ok(Self {
            default: config.default.clone(),
            global_from: config.from.clone(),
            mailers,
        })
    }

    /// Name of the default mailer.
    pub fn default_mailer(&self) -> &str {
        &self.default
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredMailer> {
        self.mailers.get(name)
    }

    /// Resolve a mailer by name; `None` selects the default.
    pub fn resolve(&self, name: Option<&str>) -> Result<Arc<dyn Mailer>, MailError> {
        let name = name.unwrap_or(&self.default);
        self.mailers
            .get(name)
            .map(RegisteredMailer::mailer)
            .ok_or_else(|| MailError::MissingConfig(format!("mailers.{name}: not configured")))
    }

    /// Transport name a mailer resolves to, for display purposes.
    pub fn transport_name(&self, name: &str) -> Option<&'static str> {
        self.mailers.get(name).map(|mailer| mailer.transport)
    }

    /// Default sender for `name`: the mailer's own, falling back to the
    /// global one.
    pub fn default_from(&self, name: &str) -> Option<Address> {
        self.mailers
            .get(name)
            .and_then(|mailer| mailer.from.clone())
            .or_else(|| self.global_from.clone())
    }
}

impl HasMailer for MailerRegistry {
    fn mailer(&self, name: Option<&str>) -> Result<Arc<dyn Mailer>, MailError> {
        self.resolve(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MailerConfig, MailgunConfig};

    fn config_with_mailer() -> MailConfig {
        let mut config = MailConfig::default();
        config.from = Some(Address::new("global@example.com"));
        config.mailgun = Some(MailgunConfig {
            secret: "key-test".to_string(),
            endpoint: "https://api.mailgun.net".to_string(),
        });
        config.mailers.insert(
            "mailgun".to_string(),
            MailerConfig {
                transport: TRANSPORT_NAME.to_string(),
                domain: Some("mg.example.com".to_string()),
                from: None,
            },
        );
        config
    }

    #[test]
    fn builds_configured_mailers() {
        let registry = MailerRegistry::from_config(&config_with_mailer()).unwrap();

        assert_eq!(registry.default_mailer(), "mailgun");
        assert_eq!(registry.transport_name("mailgun"), Some(TRANSPORT_NAME));
        assert!(registry.resolve(None).is_ok());
        assert!(registry.resolve(Some("mailgun")).is_ok());
    }

    #[test]
    fn missing_client_config_is_fatal() {
        let mut config = config_with_mailer();
        config.mailgun = None;

        let result = MailerRegistry::from_config(&config);
        assert!(matches!(result, Err(MailError::MissingConfig(_))));
    }

    #[test]
    fn missing_domain_is_fatal() {
        let mut config = config_with_mailer();
        config.mailers.get_mut("mailgun").unwrap().domain = None;

        assert!(MailerRegistry::from_config(&config).is_err());
    }

    #[test]
    fn unknown_transport_is_fatal() {
        let mut config = config_with_mailer();
        config.mailers.get_mut("mailgun").unwrap().transport = "smtp".to_string();

        assert!(MailerRegistry::from_config(&config).is_err());
    }

    #[test]
    fn unknown_mailer_fails_resolution() {
        let registry = MailerRegistry::from_config(&config_with_mailer()).unwrap();
        assert!(registry.resolve(Some("missing")).is_err());
    }

    #[test]
    fn from_falls_back_to_global() {
        let registry = MailerRegistry::from_config(&config_with_mailer()).unwrap();
        assert_eq!(
            registry.default_from("mailgun").unwrap().email,
            "global@example.com"
        );
    }
}
