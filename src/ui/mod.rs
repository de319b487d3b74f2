//! User interface module - interaction (prompts) and formatting.
//!
//! Separates concerns:
//! - `formatter` - Pure formatting functions
//! - `journal` - Scripted interactor for tests and automation
//! - This module - The [Interactor] capability and its console implementations

use console::Term;

use crate::error::{GardenerError, Result};

pub mod formatter;
pub mod journal;

// Re-export formatter functions for convenience
pub use formatter::{
    display_branch_outcome, display_error, display_release_outcome, display_status,
    display_success, display_warning,
};
pub use journal::ScriptedInteractor;

/// Narrow capability for asking the user questions.
///
/// The orchestrator only ever talks to the user through this trait, so the
/// console, non-interactive and scripted implementations are interchangeable.
pub trait Interactor {
    /// Ask a question, falling back to `default` on a blank answer.
    fn ask(&self, prompt: &str, default: Option<&str>) -> Result<String>;

    /// Ask for a secret without echoing it.
    fn ask_secret(&self, prompt: &str) -> Result<String>;
}

/// Prompts on the controlling terminal.
pub struct ConsoleInteractor {
    term: Term,
}

impl ConsoleInteractor {
    pub fn new() -> Self {
        ConsoleInteractor {
            term: Term::stderr(),
        }
    }
}

impl Default for ConsoleInteractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Interactor for ConsoleInteractor {
    /// Re-asks until a non-blank answer arrives when there is no default.
    fn ask(&self, prompt: &str, default: Option<&str>) -> Result<String> {
        loop {
            self.term.write_str(&format!("{}: ", prompt))?;
            let answer = self.term.read_line()?;
            let answer = answer.trim();

            if !answer.is_empty() {
                return Ok(answer.to_string());
            }
            if let Some(default) = default {
                return Ok(default.to_string());
            }
            if !self.term.is_term() {
                // Piped stdin ran dry, asking again would spin forever
                return Err(GardenerError::prompt(format!("no answer to '{}'", prompt)));
            }
        }
    }

    fn ask_secret(&self, prompt: &str) -> Result<String> {
        self.term.write_str(&format!("{}: ", prompt))?;
        let secret = if self.term.is_term() {
            self.term.read_secure_line()?
        } else {
            self.term.read_line()?
        };
        Ok(secret)
    }
}

/// For CI runs: answers with the default or refuses.
#[derive(Debug, Default, Clone, Copy)]
pub struct NonInteractive;

impl Interactor for NonInteractive {
    fn ask(&self, prompt: &str, default: Option<&str>) -> Result<String> {
        default.map(str::to_string).ok_or_else(|| {
            GardenerError::prompt(format!(
                "'{}' needs an answer but input is not interactive",
                prompt
            ))
        })
    }

    fn ask_secret(&self, prompt: &str) -> Result<String> {
        Err(GardenerError::prompt(format!(
            "'{}' needs an answer but input is not interactive",
            prompt
        )))
    }
}
