//! Form fields bound to page state, with the constraints a browser form
//! would enforce before submitting.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::prompt::Prompter;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)*$")
        .expect("email pattern compiles")
});

pub fn looks_like_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
    Password,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub value: String,
}

impl Field {
    pub fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            required: false,
            value: String::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Form {
    fields: Vec<Field>,
}

impl Form {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn value(&self, name: &str) -> &str {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
            .unwrap_or("")
    }

    pub fn set(&mut self, name: &str, value: &str) -> Result<(), String> {
        let names = self.field_names();
        match self.fields.iter_mut().find(|f| f.name == name) {
            Some(field) => {
                field.value = value.to_string();
                Ok(())
            }
            None => Err(format!("Unknown field '{}'. Fields: {}", name, names)),
        }
    }

    pub fn clear(&mut self) {
        for field in &mut self.fields {
            field.value.clear();
        }
    }

    fn field_names(&self) -> String {
        self.fields
            .iter()
            .map(|f| f.name)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// First violated constraint, in field order.
    pub fn validate(&self) -> Result<(), String> {
        for field in &self.fields {
            let value = field.value.trim();
            if field.required && value.is_empty() {
                return Err(format!("{} is required", field.label));
            }
            if field.kind == FieldKind::Email && !value.is_empty() && !looks_like_email(value) {
                return Err(format!("{} must be a valid email address", field.label));
            }
        }
        Ok(())
    }

    /// Ask for every field in turn. Stops early if the prompter gives up.
    pub fn fill(&mut self, prompter: &dyn Prompter) {
        for field in &mut self.fields {
            let current = if field.kind == FieldKind::Password {
                ""
            } else {
                field.value.as_str()
            };
            match prompter.ask(field.label, current) {
                Some(value) => field.value = value,
                None => break,
            }
        }
    }

    pub fn render(&self) -> String {
        let width = self.fields.iter().map(|f| f.label.len()).max().unwrap_or(0);
        self.fields
            .iter()
            .map(|f| {
                let shown = match f.kind {
                    FieldKind::Password if !f.value.is_empty() => "*".repeat(8),
                    _ => f.value.clone(),
                };
                let marker = if f.required { "*" } else { " " };
                format!("  {:width$}{} : {}", f.label, marker, shown, width = width)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Shared `set`/`fill`/`show` actions. None when `action` is not one of them.
    pub fn handle_action(
        &mut self,
        action: &str,
        args: &[String],
        prompter: &dyn Prompter,
    ) -> Option<Result<(), String>> {
        match action {
            "set" => {
                if args.is_empty() {
                    return Some(Err(format!(
                        "Usage: set <field> <value>. Fields: {}",
                        self.field_names()
                    )));
                }
                let value = args[1..].join(" ");
                Some(self.set(&args[0], &value))
            }
            "fill" => {
                self.fill(prompter);
                Some(Ok(()))
            }
            "show" => Some(Ok(())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ScriptedPrompter;

    fn sample() -> Form {
        Form::new(vec![
            Field::new("name", "Name", FieldKind::Text).required(),
            Field::new("email", "Email", FieldKind::Email),
            Field::new("password", "Password", FieldKind::Password),
        ])
    }

    #[test]
    fn test_email_shapes() {
        assert!(looks_like_email("a@b"));
        assert!(looks_like_email("first.last+tag@example.co.uk"));
        assert!(!looks_like_email("plain"));
        assert!(!looks_like_email("a@"));
        assert!(!looks_like_email("@b.com"));
        assert!(!looks_like_email("a b@c.com"));
    }

    #[test]
    fn test_required_and_email_constraints() {
        let mut form = sample();
        assert_eq!(form.validate().unwrap_err(), "Name is required");

        form.set("name", "Ada").unwrap();
        assert!(form.validate().is_ok(), "optional empty email is fine");

        form.set("email", "nope").unwrap();
        assert!(form.validate().unwrap_err().contains("valid email"));

        form.set("email", "ada@example.com").unwrap();
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_unknown_field() {
        let mut form = sample();
        let err = form.set("age", "3").unwrap_err();
        assert!(err.contains("name, email, password"));
    }

    #[test]
    fn test_set_action_joins_words() {
        let mut form = sample();
        let prompter = ScriptedPrompter::new();
        let args = vec!["name".to_string(), "Ada".to_string(), "Lovelace".to_string()];
        assert_eq!(form.handle_action("set", &args, &prompter), Some(Ok(())));
        assert_eq!(form.value("name"), "Ada Lovelace");
        assert!(form.handle_action("submit", &[], &prompter).is_none());
    }

    #[test]
    fn test_fill_stops_when_prompter_gives_up() {
        let mut form = sample();
        let prompter = ScriptedPrompter::new();
        prompter.push_answer("Ada");
        form.fill(&prompter);
        assert_eq!(form.value("name"), "Ada");
        assert_eq!(form.value("email"), "");
    }

    #[test]
    fn test_render_masks_password() {
        let mut form = sample();
        form.set("password", "hunter2").unwrap();
        let out = form.render();
        assert!(!out.contains("hunter2"));
        assert!(out.contains("********"));
    }
}
