//! Message model: addresses, attachments, and the email builder.

use std::fmt;

use lettre::message::Mailbox;
use serde::{Deserialize, Serialize};

use crate::error::MailError;

/// An email address with an optional display name.
///
/// Formats as `"Name <email>"` when a name is present, bare address otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Address {
    pub name: Option<String>,
    pub email: String,
}

impl Address {
    /// A bare address without a display name.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            name: None,
            email: email.into(),
        }
    }

    /// An address with a display name.
    pub fn with_name(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            email: email.into(),
        }
    }

    /// Parse `"Name <email>"` or a bare address, validating RFC syntax.
    pub fn parse(input: &str) -> Result<Self, MailError> {
        let mailbox: Mailbox = input
            .trim()
            .parse()
            .map_err(|_| MailError::InvalidAddress(input.trim().to_string()))?;

        Ok(Self {
            name: mailbox.name.filter(|name| !name.is_empty()),
            email: mailbox.email.to_string(),
        })
    }

    /// Whether `email` is a syntactically valid bare address.
    pub fn is_valid(email: &str) -> bool {
        email.parse::<lettre::Address>().is_ok()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) if !name.is_empty() => write!(f, "{} <{}>", name, self.email),
            _ => write!(f, "{}", self.email),
        }
    }
}

impl From<&str> for Address {
    fn from(input: &str) -> Self {
        Self::parse(input).unwrap_or_else(|_| Self::new(input.trim()))
    }
}

impl From<String> for Address {
    fn from(input: String) -> Self {
        Self::from(input.as_str())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Parts {
                #[serde(default)]
                name: Option<String>,
                email: String,
            },
            Formatted(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Parts { name, email } => Ok(Address {
                name: name.filter(|name| !name.is_empty()),
                email,
            }),
            Repr::Formatted(input) => Address::parse(&input).map_err(serde::de::Error::custom),
        }
    }
}

/// How an attachment is presented to the recipient.
///
/// Inline parts carry the content-id that `cid:` references in the HTML body
/// resolve against, so an inline attachment without one is unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    Attached,
    Inline { content_id: String },
}

/// A file attached to an email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub content: Vec<u8>,
    pub filename: String,
    pub content_type: String,
    pub disposition: Disposition,
}

impl Attachment {
    /// A regular attachment.
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        content: Vec<u8>,
    ) -> Self {
        Self {
            content,
            filename: filename.into(),
            content_type: content_type.into(),
            disposition: Disposition::Attached,
        }
    }

    /// An inline attachment referenced from the HTML body via `cid:<content_id>`.
    pub fn inline(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        content: Vec<u8>,
        content_id: impl Into<String>,
    ) -> Self {
        Self {
            content,
            filename: filename.into(),
            content_type: content_type.into(),
            disposition: Disposition::Inline {
                content_id: content_id.into(),
            },
        }
    }
}

/// A complete message, ready for a transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Email {
    /// Sender address.
    pub from: Address,
    /// Primary recipients.
    pub to: Vec<Address>,
    /// Carbon copy recipients.
    #[serde(default)]
    pub cc: Vec<Address>,
    /// Blind carbon copy recipients.
    #[serde(default)]
    pub bcc: Vec<Address>,
    /// Email subject line.
    pub subject: String,
    /// Plain text body.
    #[serde(default)]
    pub text: Option<String>,
    /// HTML body.
    #[serde(default)]
    pub html: Option<String>,
    /// Custom headers, in insertion order.
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    /// Provider-side tags, in insertion order.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Opaque key/value metadata, in insertion order.
    #[serde(default)]
    pub metadata: Vec<(String, String)>,
    /// Attachments, in insertion order.
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl Email {
    /// Create a new email builder.
    pub fn builder() -> EmailBuilder {
        EmailBuilder::default()
    }
}

/// Chained builder behind [`Email::builder`].
#[derive(Debug, Default)]
pub struct EmailBuilder {
    from: Option<Address>,
    to: Vec<Address>,
    cc: Vec<Address>,
    bcc: Vec<Address>,
    subject: Option<String>,
    text: Option<String>,
    html: Option<String>,
    headers: Vec<(String, String)>,
    tags: Vec<String>,
    metadata: Vec<(String, String)>,
    attachments: Vec<Attachment>,
}

impl EmailBuilder {
    /// Set the sender address (required).
    pub fn from(mut self, address: impl Into<Address>) -> Self {
        self.from = Some(address.into());
        self
    }

    /// Append a primary recipient.
    pub fn to(mut self, address: impl Into<Address>) -> Self {
        self.to.push(address.into());
        self
    }

    /// Add multiple primary recipients.
    pub fn to_many(mut self, addresses: impl IntoIterator<Item = impl Into<Address>>) -> Self {
        self.to.extend(addresses.into_iter().map(Into::into));
        self
    }

    /// Add a CC recipient.
    pub fn cc(mut self, address: impl Into<Address>) -> Self {
        self.cc.push(address.into());
        self
    }

    /// Add a BCC recipient.
    pub fn bcc(mut self, address: impl Into<Address>) -> Self {
        self.bcc.push(address.into());
        self
    }

    /// Set the subject line.
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Set plain text body content.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set HTML body content.
    pub fn html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    /// Add a custom header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Add a provider-side tag.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Add multiple provider-side tags.
    pub fn tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Add a metadata key/value pair.
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.push((key.into(), value.into()));
        self
    }

    /// Add an attachment.
    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Build the email, validating required fields.
    pub fn build(self) -> Result<Email, MailError> {
        if self.to.is_empty() {
            return Err(MailError::Build("at least one recipient required".into()));
        }

        let from = self
            .from
            .ok_or_else(|| MailError::Build("from address required".into()))?;

        let subject = self
            .subject
            .ok_or_else(|| MailError::Build("subject required".into()))?;

        if self.text.is_none() && self.html.is_none() {
            return Err(MailError::Build("body required (text or html)".into()));
        }

        Ok(Email {
            from,
            to: self.to,
            cc: self.cc,
            bcc: self.bcc,
            subject,
            text: self.text,
            html: self.html,
            headers: self.headers,
            tags: self.tags,
            metadata: self.metadata,
            attachments: self.attachments,
        })
    }
}
