use super::form::{Field, FieldKind, Form};
use super::{heading, render_notice, Flash, Outcome, Page, Services};
use crate::api::User;
use crate::router::USER_MANAGEMENT_PATH;

pub struct RegistrationPage {
    form: Form,
    notice: Option<Flash>,
}

impl RegistrationPage {
    pub fn new() -> Self {
        Self {
            form: Form::new(vec![
                Field::new("name", "Name", FieldKind::Text).required(),
                Field::new("email", "Email", FieldKind::Email).required(),
                Field::new("password", "Password", FieldKind::Password).required(),
                Field::new("role", "Role", FieldKind::Text).required(),
                Field::new("city", "City", FieldKind::Text).required(),
            ]),
            notice: None,
        }
    }

    fn user(&self) -> User {
        User {
            id: None,
            name: self.form.value("name").to_string(),
            email: self.form.value("email").to_string(),
            password: self.form.value("password").to_string(),
            role: self.form.value("role").to_string(),
            city: self.form.value("city").to_string(),
        }
    }

    fn submit(&mut self, svc: &Services) -> Outcome {
        if let Err(msg) = self.form.validate() {
            self.notice = Some(Flash::sticky(&msg));
            return Outcome::Stay;
        }
        self.notice = None;

        let user = self.user();
        let token = svc.token();
        match svc.api.register(&user, token.as_deref()) {
            Ok(_) => {
                tracing::info!(email = %user.email, role = %user.role, "user registered");
                svc.record(|j| j.user_registered(&user.email, &user.role));
                self.form.clear();
                svc.prompter.alert("User registered successfully");
                Outcome::Navigate(USER_MANAGEMENT_PATH.to_string())
            }
            Err(e) => {
                svc.report("register", "register", &e);
                svc.prompter.alert("An error occurred while registering user");
                Outcome::Stay
            }
        }
    }
}

impl Page for RegistrationPage {
    fn title(&self) -> &'static str {
        "Registration"
    }

    fn render(&self) -> String {
        let mut out = heading("Registration");
        out.push('\n');
        render_notice(&mut out, self.notice.as_ref());
        out.push_str(&self.form.render());
        out
    }

    fn actions(&self) -> Vec<(&'static str, &'static str)> {
        vec![
            ("set <field> <value>", "name, email, password, role or city"),
            ("fill", "enter every field interactively"),
            ("submit", "register the user"),
        ]
    }

    fn handle(&mut self, action: &str, args: &[String], svc: &Services) -> Outcome {
        if let Some(result) = self.form.handle_action(action, args, svc.prompter) {
            self.notice = result.err().map(|msg| Flash::sticky(&msg));
            return Outcome::Stay;
        }
        match action {
            "submit" | "register" => self.submit(svc),
            _ => Outcome::Unhandled,
        }
    }
}
