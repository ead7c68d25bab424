//! Line-oriented prompts for the validation loop.

use std::io::{self, BufRead, Write};

use crossterm::style::Stylize;

/// Ask for one line of input.
///
/// Shows `default` when present. An empty answer keeps the default for
/// required fields and clears the value for optional ones. Returns an error
/// when stdin reaches EOF, which callers treat as a user abort.
pub fn text(label: &str, default: &str, required: bool) -> io::Result<String> {
    let mut stdout = io::stdout();

    if !required {
        println!("{}", "Leave the field empty to skip".dark_grey());
    }
    if default.is_empty() {
        print!("{} ", label.bold());
    } else {
        print!("{} {} ", label.bold(), format!("[{default}]").dark_grey());
    }
    stdout.flush()?;

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input aborted"));
    }

    let answer = line.trim();
    if answer.is_empty() {
        return Ok(if required {
            default.to_string()
        } else {
            String::new()
        });
    }
    Ok(answer.to_string())
}
