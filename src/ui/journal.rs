use std::cell::RefCell;
use std::collections::VecDeque;

use crate::error::{GardenerError, Result};
use crate::ui::Interactor;

/// Interactor answering from a queue and remembering every prompt.
///
/// An empty queued answer behaves like a blank line: the default is used.
#[derive(Debug, Default)]
pub struct ScriptedInteractor {
    answers: RefCell<VecDeque<String>>,
    prompts: RefCell<Vec<String>>,
}

impl ScriptedInteractor {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScriptedInteractor {
            answers: RefCell::new(answers.into_iter().map(Into::into).collect()),
            prompts: RefCell::new(Vec::new()),
        }
    }

    /// Prompts shown so far, oldest first
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }

    fn next_answer(&self, prompt: &str) -> Result<String> {
        self.prompts.borrow_mut().push(prompt.to_string());
        self.answers
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| GardenerError::prompt(format!("no scripted answer for '{}'", prompt)))
    }
}

impl Interactor for ScriptedInteractor {
    fn ask(&self, prompt: &str, default: Option<&str>) -> Result<String> {
        let answer = self.next_answer(prompt)?;
        match (answer.trim(), default) {
            ("", Some(default)) => Ok(default.to_string()),
            (answer, _) => Ok(answer.to_string()),
        }
    }

    fn ask_secret(&self, prompt: &str) -> Result<String> {
        self.next_answer(prompt)
    }
}
