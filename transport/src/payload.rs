//! Flattening of an [`Email`] into the Mailgun message-send field set.
//!
//! Mailgun's `/messages` endpoint takes a flat multipart form: authoritative
//! fields (`from`, `to`, `subject`, ...), custom headers namespaced with an
//! `h:` prefix, metadata with a `v:` prefix, tags repeated under `o:tag`, and
//! file parts named `attachment` or `inline`. A [`Payload`] is built fresh for
//! every send and never mutated afterwards.

use std::collections::BTreeMap;

use crate::message::{Address, Disposition, Email};

/// Field names that may only come from the authoritative passes. Custom
/// headers matching one of these (case-insensitively) are dropped.
const RESERVED_FIELDS: [&str; 5] = ["subject", "from", "to", "cc", "bcc"];

/// A single value in the flat field set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadValue {
    Text(String),
    /// Repeated form values under one field name, order preserved.
    List(Vec<String>),
}

/// A file part of the multipart request.
///
/// `content_id` is present exactly when the source attachment was inline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub content: Vec<u8>,
    pub filename: String,
    pub content_type: String,
    pub content_id: Option<String>,
}

/// The wire-ready field set for one send.
///
/// Field-name ordering is not significant to the provider; value ordering
/// inside recipient lists, tag lists, and the attachment lists is preserved
/// from the source message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload {
    fields: BTreeMap<String, PayloadValue>,
    attachments: Vec<FilePart>,
    inline: Vec<FilePart>,
}

impl Payload {
    /// Flatten `email` into the provider field set.
    ///
    /// Pure and deterministic; the builder preconditions on [`Email`]
    /// (sender present, at least one recipient) make this infallible.
    pub fn from_email(email: &Email) -> Self {
        let mut payload = Self::default();

        payload.set("from", email.from.to_string());
        payload.set("to", join_addresses(&email.to));
        payload.set("subject", email.subject.clone());

        if let Some(text) = &email.text {
            payload.set("text", text.clone());
        }
        if let Some(html) = &email.html {
            payload.set("html", html.clone());
        }

        payload.add_headers(email);
        payload.add_cc_bcc(email);
        payload.add_attachments(email);
        payload.add_tags(email);
        payload.add_metadata(email);

        payload
    }

    /// Custom headers become `h:<Name>` entries, skipping any header whose
    /// name collides with an authoritative field.
    fn add_headers(&mut self, email: &Email) {
        for (name, value) in &email.headers {
            let lowered = name.to_ascii_lowercase();
            if RESERVED_FIELDS.contains(&lowered.as_str()) {
                continue;
            }
            self.set(format!("h:{name}"), value.clone());
        }
    }

    /// `cc`/`bcc` are emitted only when non-empty; the provider treats an
    /// absent key differently from an empty string.
    fn add_cc_bcc(&mut self, email: &Email) {
        if !email.cc.is_empty() {
            self.set("cc", join_addresses(&email.cc));
        }
        if !email.bcc.is_empty() {
            self.set("bcc", join_addresses(&email.bcc));
        }
    }

    fn add_attachments(&mut self, email: &Email) {
        for attachment in &email.attachments {
            match &attachment.disposition {
                Disposition::Inline { content_id } => self.inline.push(FilePart {
                    content: attachment.content.clone(),
                    filename: attachment.filename.clone(),
                    content_type: attachment.content_type.clone(),
                    content_id: Some(content_id.clone()),
                }),
                Disposition::Attached => self.attachments.push(FilePart {
                    content: attachment.content.clone(),
                    filename: attachment.filename.clone(),
                    content_type: attachment.content_type.clone(),
                    content_id: None,
                }),
            }
        }
    }

    /// All tags collect under a single repeated `o:tag` field, absent when
    /// the message carries none.
    fn add_tags(&mut self, email: &Email) {
        if !email.tags.is_empty() {
            self.fields
                .insert("o:tag".to_string(), PayloadValue::List(email.tags.clone()));
        }
    }

    fn add_metadata(&mut self, email: &Email) {
        for (key, value) in &email.metadata {
            self.set(format!("v:{key}"), value.clone());
        }
    }

    fn set(&mut self, name: impl Into<String>, value: String) {
        self.fields.insert(name.into(), PayloadValue::Text(value));
    }

    /// The flat field set, keyed by provider field name.
    pub fn fields(&self) -> &BTreeMap<String, PayloadValue> {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&PayloadValue> {
        self.fields.get(name)
    }

    /// Text value of a field, if present and not a list.
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.fields.get(name) {
            Some(PayloadValue::Text(value)) => Some(value),
            _ => None,
        }
    }

    /// Regular attachments, in message order.
    pub fn attachments(&self) -> &[FilePart] {
        &self.attachments
    }

    /// Inline attachments, in message order.
    pub fn inline(&self) -> &[FilePart] {
        &self.inline
    }
}

fn join_addresses(addresses: &[Address]) -> String {
    addresses
        .iter()
        .map(Address::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Attachment;

    fn base() -> crate::message::EmailBuilder {
        Email::builder()
            .from(Address::with_name("Acme", "noreply@example.com"))
            .to("user@example.com")
            .subject("Hello")
    }

    #[test]
    fn minimal_payload_has_no_extra_keys() {
        let email = base().text("Hi there").build().unwrap();
        let payload = Payload::from_email(&email);

        let keys: Vec<&str> = payload.fields().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["from", "subject", "text", "to"]);
        assert!(payload.attachments().is_empty());
        assert!(payload.inline().is_empty());
    }

    #[test]
    fn addresses_are_formatted_and_ordered() {
        let email = base()
            .to(Address::with_name("Second", "second@example.com"))
            .text("Hi")
            .build()
            .unwrap();
        let payload = Payload::from_email(&email);

        assert_eq!(payload.text("from"), Some("Acme <noreply@example.com>"));
        assert_eq!(
            payload.text("to"),
            Some("user@example.com, Second <second@example.com>")
        );
    }

    #[test]
    fn absent_bodies_are_omitted() {
        let email = base().html("<p>Hi</p>").build().unwrap();
        let payload = Payload::from_email(&email);

        assert_eq!(payload.text("html"), Some("<p>Hi</p>"));
        assert!(payload.get("text").is_none());
    }

    #[test]
    fn reserved_headers_are_skipped() {
        let email = base()
            .text("Hi")
            .header("Subject", "spoofed")
            .header("TO", "spoofed@example.com")
            .header("X-Custom", "kept")
            .build()
            .unwrap();
        let payload = Payload::from_email(&email);

        assert_eq!(payload.text("h:X-Custom"), Some("kept"));
        assert!(payload.get("h:Subject").is_none());
        assert!(payload.get("h:TO").is_none());
        assert_eq!(payload.text("subject"), Some("Hello"));
        assert_eq!(payload.text("to"), Some("user@example.com"));
    }

    #[test]
    fn cc_bcc_omitted_when_empty() {
        let email = base().text("Hi").build().unwrap();
        let payload = Payload::from_email(&email);

        assert!(payload.get("cc").is_none());
        assert!(payload.get("bcc").is_none());
    }

    #[test]
    fn cc_bcc_joined_in_order() {
        let email = base()
            .cc("a@example.com")
            .cc("b@example.com")
            .bcc("c@example.com")
            .text("Hi")
            .build()
            .unwrap();
        let payload = Payload::from_email(&email);

        assert_eq!(payload.text("cc"), Some("a@example.com, b@example.com"));
        assert_eq!(payload.text("bcc"), Some("c@example.com"));
    }

    #[test]
    fn attachments_partition_by_disposition() {
        let email = base()
            .text("Hi")
            .attach(Attachment::new("report.pdf", "application/pdf", vec![1, 2]))
            .attach(Attachment::inline("logo.png", "image/png", vec![3], "logo"))
            .attach(Attachment::new("data.csv", "text/csv", vec![4]))
            .build()
            .unwrap();
        let payload = Payload::from_email(&email);

        let attached: Vec<&str> = payload
            .attachments()
            .iter()
            .map(|part| part.filename.as_str())
            .collect();
        assert_eq!(attached, vec!["report.pdf", "data.csv"]);
        assert!(payload.attachments().iter().all(|part| part.content_id.is_none()));

        assert_eq!(payload.inline().len(), 1);
        assert_eq!(payload.inline()[0].content_id.as_deref(), Some("logo"));
    }

    #[test]
    fn tags_collect_under_one_key_in_order() {
        let email = base()
            .text("Hi")
            .tag("welcome")
            .tag("onboarding")
            .build()
            .unwrap();
        let payload = Payload::from_email(&email);

        assert_eq!(
            payload.get("o:tag"),
            Some(&PayloadValue::List(vec![
                "welcome".to_string(),
                "onboarding".to_string()
            ]))
        );
    }

    #[test]
    fn no_tags_no_tag_key() {
        let email = base().text("Hi").build().unwrap();
        let payload = Payload::from_email(&email);

        assert!(payload.get("o:tag").is_none());
    }

    #[test]
    fn metadata_becomes_prefixed_entries() {
        let email = base()
            .text("Hi")
            .metadata("user-id", "42")
            .metadata("campaign", "spring")
            .build()
            .unwrap();
        let payload = Payload::from_email(&email);

        assert_eq!(payload.text("v:user-id"), Some("42"));
        assert_eq!(payload.text("v:campaign"), Some("spring"));
    }

    #[test]
    fn transform_is_idempotent() {
        let email = base()
            .cc("a@example.com")
            .text("Hi")
            .tag("welcome")
            .metadata("k", "v")
            .attach(Attachment::inline("logo.png", "image/png", vec![1], "logo"))
            .build()
            .unwrap();

        assert_eq!(Payload::from_email(&email), Payload::from_email(&email));
    }
}
