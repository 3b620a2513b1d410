use super::form::{Field, FieldKind, Form};
use super::{heading, render_notice, Flash, Outcome, Page, Services};
use crate::api::User;
use crate::router::USER_MANAGEMENT_PATH;

pub struct UpdateUserPage {
    user_id: String,
    form: Form,
    notice: Option<Flash>,
}

impl UpdateUserPage {
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            form: Form::new(vec![
                Field::new("name", "Name", FieldKind::Text),
                Field::new("email", "Email", FieldKind::Email),
                Field::new("role", "Role", FieldKind::Text),
                Field::new("city", "City", FieldKind::Text),
            ]),
            notice: None,
        }
    }

    fn load(&mut self, svc: &Services) {
        let token = svc.token();
        match svc.api.get_user(&self.user_id, token.as_deref()) {
            Ok(user) => {
                for (field, value) in [
                    ("name", &user.name),
                    ("email", &user.email),
                    ("role", &user.role),
                    ("city", &user.city),
                ] {
                    // Every field exists on this form.
                    let _ = self.form.set(field, value);
                }
            }
            Err(e) => svc.report("update-user", "get_user", &e),
        }
    }

    fn user(&self) -> User {
        User {
            id: None,
            name: self.form.value("name").to_string(),
            email: self.form.value("email").to_string(),
            role: self.form.value("role").to_string(),
            city: self.form.value("city").to_string(),
            password: String::new(),
        }
    }

    fn submit(&mut self, svc: &Services) -> Outcome {
        if let Err(msg) = self.form.validate() {
            self.notice = Some(Flash::sticky(&msg));
            return Outcome::Stay;
        }
        self.notice = None;

        if !svc
            .prompter
            .confirm("Are you sure you want to update this user's info?")
        {
            return Outcome::Stay;
        }

        let token = svc.token();
        match svc.api.update_user(&self.user_id, &self.user(), token.as_deref()) {
            Ok(_) => {
                tracing::info!(user_id = %self.user_id, "user updated");
                svc.record(|j| j.user_updated(&self.user_id));
                Outcome::Navigate(USER_MANAGEMENT_PATH.to_string())
            }
            Err(e) => {
                svc.report("update-user", "update_user", &e);
                svc.prompter.alert(&e.to_string());
                Outcome::Stay
            }
        }
    }
}

impl Page for UpdateUserPage {
    fn title(&self) -> &'static str {
        "User-update"
    }

    fn mount(&mut self, svc: &Services) {
        self.load(svc);
    }

    fn render(&self) -> String {
        let mut out = heading("Update User");
        out.push_str(&format!("\n  User ID: {}\n", self.user_id));
        render_notice(&mut out, self.notice.as_ref());
        out.push_str(&self.form.render());
        out
    }

    fn actions(&self) -> Vec<(&'static str, &'static str)> {
        vec![
            ("set <field> <value>", "name, email, role or city"),
            ("fill", "edit every field interactively"),
            ("submit", "save the changes (asks first)"),
        ]
    }

    fn handle(&mut self, action: &str, args: &[String], svc: &Services) -> Outcome {
        if let Some(result) = self.form.handle_action(action, args, svc.prompter) {
            self.notice = result.err().map(|msg| Flash::sticky(&msg));
            return Outcome::Stay;
        }
        match action {
            "submit" | "update" => self.submit(svc),
            _ => Outcome::Unhandled,
        }
    }
}
