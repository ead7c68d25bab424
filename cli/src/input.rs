//! Send-command input: argument/default merging and the validation rules the
//! re-prompt loop runs every round.

use clap::Args;

use mailgun_transport::{Address, Email, MailConfig, MailError};

#[derive(Args, Debug, Default)]
pub struct SendArgs {
    /// The email address to send the email to.
    pub address: Option<String>,

    /// The subject of the email.
    #[arg(long)]
    pub subject: Option<String>,

    /// The body of the email.
    #[arg(long)]
    pub body: Option<String>,

    /// The email address to send the email from.
    #[arg(long)]
    pub from: Option<String>,

    /// The email address(es) to CC.
    #[arg(long)]
    pub cc: Vec<String>,

    /// The email address(es) to BCC.
    #[arg(long)]
    pub bcc: Vec<String>,

    /// The tag(s) to add.
    #[arg(long)]
    pub tag: Vec<String>,

    /// The queue to dispatch the email to.
    #[arg(long)]
    pub queue: Option<String>,

    /// The mailer to use.
    #[arg(long)]
    pub mailer: Option<String>,
}

/// Command input for one test send, after defaults have been merged in.
#[derive(Debug, Clone)]
pub struct SendInput {
    pub address: String,
    pub subject: String,
    pub body: String,
    pub from: Address,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub tags: Vec<String>,
    pub mailer: String,
    pub queue: Option<String>,
}

/// A field the validation loop can re-prompt for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    Address,
    Subject,
    Body,
    FromAddress,
    Cc(usize),
    Bcc(usize),
    Mailer,
}

impl Field {
    /// Required fields keep their previous value on an empty answer;
    /// optional ones are cleared by it.
    pub fn is_required(&self) -> bool {
        !matches!(self, Field::Cc(_) | Field::Bcc(_))
    }
}

/// First validation failure of a round.
#[derive(Debug, Clone)]
pub struct Violation {
    pub field: Field,
    pub message: String,
}

fn violation(field: Field, message: impl Into<String>) -> Violation {
    Violation {
        field,
        message: message.into(),
    }
}

/// Merge command arguments and flags with the configured defaults.
pub fn collect(args: &SendArgs, config: &MailConfig) -> SendInput {
    let mailer = args
        .mailer
        .clone()
        .unwrap_or_else(|| config.default.clone());

    let from = args
        .from
        .as_deref()
        .map(Address::from)
        .or_else(|| config.default_from(&mailer))
        .unwrap_or_else(|| Address::new(""));

    SendInput {
        address: args.address.clone().unwrap_or_default(),
        subject: args
            .subject
            .clone()
            .unwrap_or_else(|| format!("{} Test Email", config.app_name)),
        body: args
            .body
            .clone()
            .unwrap_or_else(|| "This is a test email".to_string()),
        from,
        cc: args.cc.clone(),
        bcc: args.bcc.clone(),
        tags: args.tag.clone(),
        mailer,
        queue: args.queue.clone(),
    }
}

/// Check every field rule, reporting the first failure.
///
/// The caller loops: prompt for the failing field, apply the answer, and
/// validate the whole input again until this returns `Ok`.
pub fn validate(input: &SendInput) -> Result<(), Violation> {
    if input.address.trim().is_empty() {
        return Err(violation(Field::Address, "The address field is required."));
    }
    if !Address::is_valid(input.address.trim()) {
        return Err(violation(
            Field::Address,
            "The address field must be a valid email address.",
        ));
    }
    if input.subject.trim().is_empty() {
        return Err(violation(Field::Subject, "The subject field is required."));
    }
    if input.body.trim().is_empty() {
        return Err(violation(Field::Body, "The body field is required."));
    }
    if input.from.email.trim().is_empty() {
        return Err(violation(
            Field::FromAddress,
            "The from address field is required.",
        ));
    }
    if !Address::is_valid(input.from.email.trim()) {
        return Err(violation(
            Field::FromAddress,
            "The from address field must be a valid email address.",
        ));
    }
    for (index, entry) in input.cc.iter().enumerate() {
        let entry = entry.trim();
        if !entry.is_empty() && !Address::is_valid(entry) {
            return Err(violation(
                Field::Cc(index),
                format!("The cc.{index} field must be a valid email address."),
            ));
        }
    }
    for (index, entry) in input.bcc.iter().enumerate() {
        let entry = entry.trim();
        if !entry.is_empty() && !Address::is_valid(entry) {
            return Err(violation(
                Field::Bcc(index),
                format!("The bcc.{index} field must be a valid email address."),
            ));
        }
    }
    if input.mailer.trim().is_empty() {
        return Err(violation(Field::Mailer, "The mailer field is required."));
    }
    Ok(())
}

/// Current value of a field, used as the prompt default.
pub fn current_value(input: &SendInput, field: &Field) -> String {
    match field {
        Field::Address => input.address.clone(),
        Field::Subject => input.subject.clone(),
        Field::Body => input.body.clone(),
        Field::FromAddress => input.from.email.clone(),
        Field::Cc(index) => input.cc.get(*index).cloned().unwrap_or_default(),
        Field::Bcc(index) => input.bcc.get(*index).cloned().unwrap_or_default(),
        Field::Mailer => input.mailer.clone(),
    }
}

/// Store a prompted answer back into the input.
pub fn apply(input: &mut SendInput, field: &Field, value: String) {
    match field {
        Field::Address => input.address = value,
        Field::Subject => input.subject = value,
        Field::Body => input.body = value,
        // Re-prompting targets the address part; a display name set via
        // --from survives the correction.
        Field::FromAddress => input.from.email = value,
        Field::Cc(index) => {
            if let Some(slot) = input.cc.get_mut(*index) {
                *slot = value;
            }
        }
        Field::Bcc(index) => {
            if let Some(slot) = input.bcc.get_mut(*index) {
                *slot = value;
            }
        }
        Field::Mailer => input.mailer = value,
    }
}

impl SendInput {
    /// Trim every field and drop cleared cc/bcc/tag entries.
    pub fn normalize(&mut self) {
        self.address = self.address.trim().to_string();
        self.subject = self.subject.trim().to_string();
        self.body = self.body.trim().to_string();
        self.from.email = self.from.email.trim().to_string();
        self.cc.retain_mut(|entry| {
            *entry = entry.trim().to_string();
            !entry.is_empty()
        });
        self.bcc.retain_mut(|entry| {
            *entry = entry.trim().to_string();
            !entry.is_empty()
        });
        self.tags.retain_mut(|entry| {
            *entry = entry.trim().to_string();
            !entry.is_empty()
        });
        if matches!(&self.queue, Some(queue) if queue.trim().is_empty()) {
            self.queue = None;
        }
    }

    /// Every recipient must be an exact member of the whitelist.
    pub fn check_whitelist(&self, config: &MailConfig) -> Result<(), MailError> {
        for address in std::iter::once(&self.address)
            .chain(self.cc.iter())
            .chain(self.bcc.iter())
        {
            if !config.is_whitelisted(address) {
                return Err(MailError::NotWhitelisted(address.clone()));
            }
        }
        Ok(())
    }

    /// Build the test message the way application code would.
    pub fn to_email(&self) -> Result<Email, MailError> {
        let mut builder = Email::builder()
            .from(self.from.clone())
            .to(Address::new(self.address.clone()))
            .subject(self.subject.clone())
            .html(self.body.clone());

        for cc in &self.cc {
            builder = builder.cc(Address::new(cc.clone()));
        }
        for bcc in &self.bcc {
            builder = builder.bcc(Address::new(bcc.clone()));
        }

        builder.tags(self.tags.iter().cloned()).build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailgun_transport::MailerConfig;

    fn config() -> MailConfig {
        let mut config = MailConfig::default();
        config.app_name = "Acme".to_string();
        config.whitelist = vec!["a@x.com".to_string()];
        config.mailers.insert(
            "mailgun".to_string(),
            MailerConfig {
                transport: "mailgun-api".to_string(),
                domain: Some("mg.x.com".to_string()),
                from: Some(Address::new("noreply@x.com")),
            },
        );
        config
    }

    fn args(address: &str) -> SendArgs {
        SendArgs {
            address: Some(address.to_string()),
            ..SendArgs::default()
        }
    }

    #[test]
    fn defaults_are_merged() {
        let input = collect(&args("a@x.com"), &config());

        assert_eq!(input.address, "a@x.com");
        assert_eq!(input.subject, "Acme Test Email");
        assert_eq!(input.body, "This is a test email");
        assert_eq!(input.from.email, "noreply@x.com");
        assert_eq!(input.mailer, "mailgun");
        assert!(input.queue.is_none());
        assert!(validate(&input).is_ok());
    }

    #[test]
    fn from_option_parses_display_name() {
        let mut send_args = args("a@x.com");
        send_args.from = Some("John Doe <john@x.com>".to_string());

        let input = collect(&send_args, &config());
        assert_eq!(input.from.name.as_deref(), Some("John Doe"));
        assert_eq!(input.from.email, "john@x.com");
    }

    #[test]
    fn invalid_address_is_reported_first() {
        let input = collect(&args("not-an-address"), &config());

        let violation = validate(&input).unwrap_err();
        assert_eq!(violation.field, Field::Address);
        assert!(violation.message.contains("valid email address"));
    }

    #[test]
    fn invalid_cc_entry_is_fixable() {
        let mut send_args = args("a@x.com");
        send_args.cc = vec!["bad".to_string()];

        let mut input = collect(&send_args, &config());
        let violation = validate(&input).unwrap_err();
        assert_eq!(violation.field, Field::Cc(0));

        apply(&mut input, &violation.field, "cc@x.com".to_string());
        assert!(validate(&input).is_ok());
    }

    #[test]
    fn cleared_optional_entries_are_dropped() {
        let mut send_args = args("a@x.com");
        send_args.cc = vec!["".to_string(), " cc@x.com ".to_string()];

        let mut input = collect(&send_args, &config());
        input.normalize();
        assert_eq!(input.cc, vec!["cc@x.com".to_string()]);
    }

    #[test]
    fn whitelist_blocks_unlisted_recipients() {
        let mut send_args = args("a@x.com");
        send_args.cc = vec!["b@x.com".to_string()];

        let input = collect(&send_args, &config());
        match input.check_whitelist(&config()) {
            Err(MailError::NotWhitelisted(address)) => assert_eq!(address, "b@x.com"),
            other => panic!("expected whitelist failure, got {other:?}"),
        }
    }

    #[test]
    fn whitelisted_recipients_pass() {
        let input = collect(&args("a@x.com"), &config());
        assert!(input.check_whitelist(&config()).is_ok());
    }

    #[test]
    fn test_mail_is_html_with_tags() {
        let mut send_args = args("a@x.com");
        send_args.tag = vec!["smoke".to_string()];

        let input = collect(&send_args, &config());
        let email = input.to_email().unwrap();

        assert_eq!(email.to[0].email, "a@x.com");
        assert_eq!(email.html.as_deref(), Some("This is a test email"));
        assert!(email.text.is_none());
        assert_eq!(email.tags, vec!["smoke".to_string()]);
    }
}
