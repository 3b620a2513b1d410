use std::time::Duration;

use super::form::{Field, FieldKind, Form};
use super::{heading, render_notice, Flash, Outcome, Page, Services};
use crate::router::PROFILE_PATH;
use crate::session::Session;

/// How long a failed request's message stays on screen.
const ERROR_TTL: Duration = Duration::from_secs(5);

pub struct LoginPage {
    form: Form,
    error: Option<Flash>,
}

impl LoginPage {
    pub fn new() -> Self {
        Self {
            form: Form::new(vec![
                Field::new("email", "Email", FieldKind::Email),
                Field::new("password", "Password", FieldKind::Password),
            ]),
            error: None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error
            .as_ref()
            .filter(|f| f.is_visible())
            .map(|f| f.text.as_str())
    }

    fn submit(&mut self, svc: &Services) -> Outcome {
        if let Err(msg) = self.form.validate() {
            self.error = Some(Flash::sticky(&msg));
            return Outcome::Stay;
        }
        let email = self.form.value("email").to_string();
        let password = self.form.value("password").to_string();

        let resp = match svc.api.login(&email, &password) {
            Ok(resp) => resp,
            Err(e) => {
                svc.report("login", "login", &e);
                svc.record(|j| j.login_failed(&email, &e.to_string()));
                self.error = Some(Flash::expiring(&e.to_string(), ERROR_TTL));
                return Outcome::Stay;
            }
        };

        match resp.token.as_deref().filter(|t| !t.is_empty()) {
            Some(token) => {
                if let Err(e) = Session::establish(svc.store, token, resp.role.as_deref()) {
                    tracing::error!(error = %e, "failed to store session");
                    self.error = Some(Flash::expiring(&format!("{:#}", e), ERROR_TTL));
                    return Outcome::Stay;
                }
                tracing::debug!(%email, "login accepted");
                tracing::info!(role = ?resp.role, "logged in");
                svc.record(|j| {
                    j.login(
                        &email,
                        token,
                        resp.role.as_deref(),
                        resp.expiration_time.as_deref(),
                    )
                });
                self.error = None;
                Outcome::Reload(PROFILE_PATH.to_string())
            }
            None => {
                let message = resp
                    .message
                    .clone()
                    .or_else(|| resp.error.clone())
                    .unwrap_or_else(|| "Login failed".to_string());
                tracing::debug!(%email, "login refused");
                tracing::info!(%message, "login refused");
                svc.record(|j| j.login_failed(&email, &message));
                self.error = Some(Flash::sticky(&message));
                Outcome::Stay
            }
        }
    }
}

impl Page for LoginPage {
    fn title(&self) -> &'static str {
        "Login"
    }

    fn render(&self) -> String {
        let mut out = heading("Login");
        out.push('\n');
        render_notice(&mut out, self.error.as_ref());
        out.push_str(&self.form.render());
        out
    }

    fn actions(&self) -> Vec<(&'static str, &'static str)> {
        vec![
            ("set <field> <value>", "set email or password"),
            ("fill", "enter email and password interactively"),
            ("submit", "log in"),
        ]
    }

    fn handle(&mut self, action: &str, args: &[String], svc: &Services) -> Outcome {
        if let Some(result) = self.form.handle_action(action, args, svc.prompter) {
            if let Err(msg) = result {
                self.error = Some(Flash::sticky(&msg));
            }
            return Outcome::Stay;
        }
        match action {
            "submit" | "login" => self.submit(svc),
            _ => Outcome::Unhandled,
        }
    }
}
