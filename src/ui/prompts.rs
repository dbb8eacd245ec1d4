//! ui::prompts
//!
//! Interactive prompts and confirmations.
//!
//! Prompts are only shown in interactive mode. In non-interactive mode,
//! operations requiring user input must either have defaults or fail
//! with a clear error message.

use std::io::{self, BufRead, IsTerminal, Write};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("prompt cancelled by user")]
    Cancelled,

    #[error("not in interactive mode")]
    NotInteractive,

    #[error("IO error: {0}")]
    IoError(String),
}

impl From<io::Error> for PromptError {
    fn from(err: io::Error) -> Self {
        PromptError::IoError(err.to_string())
    }
}

/// True when both stdin and stdout are terminals.
pub fn is_interactive() -> bool {
    io::stdin().is_terminal() && io::stdout().is_terminal()
}

/// Interpret a yes/no answer. Empty input takes `default`.
fn parse_answer(answer: &str, default: bool) -> Option<bool> {
    match answer.trim().to_ascii_lowercase().as_str() {
        "" => Some(default),
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

fn read_line() -> Result<String, PromptError> {
    let mut line = String::new();
    let read = io::stdin().lock().read_line(&mut line)?;
    if read == 0 {
        return Err(PromptError::Cancelled);
    }
    Ok(line)
}

/// Prompt for confirmation (yes/no).
///
/// # Errors
///
/// - [`PromptError::NotInteractive`] if `interactive` is false
/// - [`PromptError::Cancelled`] on end of input
pub fn confirm(message: &str, default: bool, interactive: bool) -> Result<bool, PromptError> {
    if !interactive {
        return Err(PromptError::NotInteractive);
    }
    let hint = if default { "[Y/n]" } else { "[y/N]" };
    loop {
        print!("{} {} ", message, hint);
        io::stdout().flush()?;
        if let Some(answer) = parse_answer(&read_line()?, default) {
            return Ok(answer);
        }
        println!("Please answer 'y' or 'n'.");
    }
}

/// Prompt for text input. Empty input takes `default` when there is one.
pub fn input(message: &str, default: Option<&str>, interactive: bool) -> Result<String, PromptError> {
    if !interactive {
        return Err(PromptError::NotInteractive);
    }
    loop {
        match default {
            Some(d) => print!("{} [{}]: ", message, d),
            None => print!("{}: ", message),
        }
        io::stdout().flush()?;
        let answer = read_line()?.trim().to_string();
        match (answer.is_empty(), default) {
            (false, _) => return Ok(answer),
            (true, Some(d)) => return Ok(d.to_string()),
            (true, None) => continue,
        }
    }
}

/// Prompt for masked input (passwords, secrets). The input is not echoed.
pub fn password(message: &str, interactive: bool) -> Result<String, PromptError> {
    if !interactive {
        return Err(PromptError::NotInteractive);
    }
    let value = rpassword::prompt_password(format!("{}: ", message))?;
    if value.is_empty() {
        return Err(PromptError::Cancelled);
    }
    Ok(value)
}
