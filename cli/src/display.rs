//! Terminal rendering for the send command.

use std::path::Path;

use crossterm::style::Stylize;

use crate::input::SendInput;

/// Two-column summary of what is about to be dispatched.
pub fn summary(input: &SendInput, transport: Option<&str>) {
    println!();
    row("Mailer", input.mailer.clone());
    row("Transport", transport.unwrap_or("unknown").to_string());
    if let Some(queue) = &input.queue {
        row("Queue", queue.as_str().red().to_string());
    }

    println!();
    println!("  {}", "Email Details".dark_grey());
    row("Subject", input.subject.as_str().yellow().bold().to_string());
    row("From", formatted(&input.from.email, input.from.name.as_deref()));
    row("To", input.address.as_str().green().to_string());

    if !input.cc.is_empty() {
        row("CC", join_secondary(&input.cc));
    }
    if !input.bcc.is_empty() {
        row("BCC", join_secondary(&input.bcc));
    }
    if !input.tags.is_empty() {
        row("Tags", join_secondary(&input.tags));
    }
    println!();
}

fn row(label: &str, value: String) {
    println!("  {label:<10} {value}");
}

/// `Name <email>` with the address highlighted, or a bare highlighted address.
fn formatted(email: &str, name: Option<&str>) -> String {
    match name {
        Some(name) if !name.is_empty() => format!("{} <{}>", name, email.green()),
        _ => email.green().to_string(),
    }
}

fn join_secondary(values: &[String]) -> String {
    values
        .iter()
        .map(|value| value.as_str().magenta().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn success(message: &str) {
    println!("\n  {} {message}\n", " SUCCESS ".black().on_green());
}

pub fn info(message: &str) {
    println!("\n  {} {message}\n", " INFO ".black().on_blue());
}

pub fn error(message: &str) {
    eprintln!("\n  {} {message}\n", " ERROR ".white().on_red());
}

/// Actionable remediation for a whitelist violation.
pub fn whitelist_guidance(message: &str, config_path: &Path) {
    error(message);
    println!(
        "  To be able to send emails to this address, add it to the whitelist in your `{}`:",
        config_path.display().to_string().green()
    );
    println!("    {} = [", "whitelist".green());
    println!(
        "      {}, {}, ...",
        "\"<address1>\"".green(),
        "\"<address2>\"".green()
    );
    println!("    ]");
    println!();
}
