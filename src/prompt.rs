//! Interactive confirmation, alerts and field input.

#[cfg(test)]
use std::cell::RefCell;
#[cfg(test)]
use std::collections::VecDeque;
use std::io::{self, Write};

pub trait Prompter {
    /// Ask a yes/no question. Anything but an explicit yes is a no.
    fn confirm(&self, message: &str) -> bool;
    /// Show a message the user has to acknowledge.
    fn alert(&self, message: &str);
    /// Read a value for a form field. None means the user gave up.
    fn ask(&self, label: &str, current: &str) -> Option<String>;
}

/// Prompts on the controlling terminal.
pub struct TerminalPrompter {
    /// One-shot mode: never block on stdin.
    non_interactive: bool,
    auto_yes: bool,
}

impl TerminalPrompter {
    pub fn new(non_interactive: bool, auto_yes: bool) -> Self {
        Self {
            non_interactive,
            auto_yes,
        }
    }

    fn read_line(&self) -> Option<String> {
        let _ = io::stdout().flush();
        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(input.trim_end_matches(&['\r', '\n'][..]).to_string()),
        }
    }
}

impl Prompter for TerminalPrompter {
    fn confirm(&self, message: &str) -> bool {
        if self.auto_yes {
            println!("{} [y/N]: y (--yes)", message);
            return true;
        }
        if self.non_interactive {
            eprintln!("{} [y/N]: n (non-interactive, use --yes to confirm)", message);
            return false;
        }
        print!("{} [y/N]: ", message);
        match self.read_line() {
            Some(answer) => {
                let answer = answer.trim().to_lowercase();
                answer == "y" || answer == "yes"
            }
            None => false,
        }
    }

    fn alert(&self, message: &str) {
        println!("!! {}", message);
        if !self.non_interactive {
            print!("   (press Enter) ");
            let _ = self.read_line();
        }
    }

    fn ask(&self, label: &str, current: &str) -> Option<String> {
        if self.non_interactive {
            return None;
        }
        if current.is_empty() {
            print!("{}: ", label);
        } else {
            print!("{} [{}]: ", label, current);
        }
        let value = self.read_line()?;
        if value.is_empty() {
            Some(current.to_string())
        } else {
            Some(value)
        }
    }
}

/// Prompter with pre-recorded answers, for tests.
#[cfg(test)]
#[derive(Default)]
pub struct ScriptedPrompter {
    confirms: RefCell<VecDeque<bool>>,
    answers: RefCell<VecDeque<String>>,
    pub alerts: RefCell<Vec<String>>,
    pub questions: RefCell<Vec<String>>,
}

#[cfg(test)]
impl ScriptedPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn confirming(answers: &[bool]) -> Self {
        let p = Self::default();
        p.confirms.borrow_mut().extend(answers.iter().copied());
        p
    }

    pub fn push_answer(&self, value: &str) {
        self.answers.borrow_mut().push_back(value.to_string());
    }

    pub fn push_confirm(&self, yes: bool) {
        self.confirms.borrow_mut().push_back(yes);
    }

    pub fn last_alert(&self) -> Option<String> {
        self.alerts.borrow().last().cloned()
    }
}

#[cfg(test)]
impl Prompter for ScriptedPrompter {
    fn confirm(&self, message: &str) -> bool {
        self.questions.borrow_mut().push(message.to_string());
        self.confirms.borrow_mut().pop_front().unwrap_or(false)
    }

    fn alert(&self, message: &str) {
        self.alerts.borrow_mut().push(message.to_string());
    }

    fn ask(&self, _label: &str, _current: &str) -> Option<String> {
        self.answers.borrow_mut().pop_front()
    }
}
