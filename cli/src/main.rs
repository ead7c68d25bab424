use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::LevelFilter;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use mailgun_transport::{
    enqueue_with, JobOpts, MailConfig, MailerRegistry, MemoryQueue, SendEmailJob,
};

mod display;
mod input;
mod prompt;

use input::SendArgs;

#[derive(Parser)]
#[command(name = "mailgun", about = "Send mail through the Mailgun API")]
struct Cli {
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbosity: u8,

    /// Path to the mail configuration file.
    #[arg(long, default_value = "mail.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a test email message.
    Send(SendArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let log_level = match cli.verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    TermLogger::init(
        log_level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .unwrap();

    dotenvy::dotenv().ok();

    match &cli.command {
        Commands::Send(args) => send(args, &cli.config).await,
    }
}

/// The send command: collect input, validate with re-prompts, enforce the
/// whitelist, then dispatch.
async fn send(args: &SendArgs, config_path: &Path) -> ExitCode {
    let config = match MailConfig::from_file(config_path) {
        Ok(config) => config,
        Err(e) => {
            display::error(&e.to_string());
            return ExitCode::FAILURE;
        }
    };

    let mut input = input::collect(args, &config);

    // Missing positional argument is prompted for up front; anything invalid
    // is caught by the validation loop below.
    if args.address.is_none() {
        match prompt::text("What email address should the email be sent to?", "", true) {
            Ok(address) => input.address = address,
            Err(_) => {
                display::error("Aborted.");
                return ExitCode::FAILURE;
            }
        }
    }

    // Re-prompt for the first failing field and revalidate the whole input
    // every round, until it passes or stdin is closed.
    loop {
        match input::validate(&input) {
            Ok(()) => break,
            Err(violation) => {
                let default = input::current_value(&input, &violation.field);
                match prompt::text(&violation.message, &default, violation.field.is_required()) {
                    Ok(value) => input::apply(&mut input, &violation.field, value),
                    Err(_) => {
                        display::error("Aborted.");
                        return ExitCode::FAILURE;
                    }
                }
            }
        }
    }
    input.normalize();

    // Policy gate: abort before any network activity when a recipient is not
    // whitelisted.
    if let Err(e) = input.check_whitelist(&config) {
        display::whitelist_guidance(&e.to_string(), config_path);
        return ExitCode::FAILURE;
    }

    let registry = match MailerRegistry::from_config(&config) {
        Ok(registry) => registry,
        Err(e) => {
            display::error(&e.to_string());
            return ExitCode::FAILURE;
        }
    };

    display::summary(&input, registry.transport_name(&input.mailer));

    let email = match input.to_email() {
        Ok(email) => email,
        Err(e) => {
            display::error(&e.to_string());
            return ExitCode::FAILURE;
        }
    };

    if let Some(queue_name) = input.queue.clone() {
        let queue = MemoryQueue::new();
        let job = SendEmailJob::<MailerRegistry>::new(email).on_mailer(input.mailer.clone());
        let opts = JobOpts {
            queue: Some(queue_name.clone()),
            ..JobOpts::default()
        };

        match enqueue_with(&queue, job, opts).await {
            Ok(id) => {
                log::debug!("job {id} enqueued");
                display::info(&format!(
                    "Email to {} has been queued to {queue_name}",
                    input.address
                ));
                ExitCode::SUCCESS
            }
            Err(e) => {
                display::error(&e.to_string());
                ExitCode::FAILURE
            }
        }
    } else {
        let mailer = match registry.resolve(Some(&input.mailer)) {
            Ok(mailer) => mailer,
            Err(e) => {
                display::error(&e.to_string());
                return ExitCode::FAILURE;
            }
        };

        match mailer.send(&email).await {
            Ok(()) => {
                display::success(&format!("Email has been sent to {}", input.address));
                ExitCode::SUCCESS
            }
            Err(e) => {
                display::error(&e.to_string());
                ExitCode::FAILURE
            }
        }
    }
}
