use super::{heading, render_notice, Flash, Outcome, Page, Services};
use crate::api::User;
use crate::router::{update_user_path, REGISTER_PATH};

pub struct UserManagementPage {
    users: Vec<User>,
    notice: Option<Flash>,
}

impl UserManagementPage {
    pub fn new() -> Self {
        Self {
            users: Vec::new(),
            notice: None,
        }
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    fn fetch(&mut self, svc: &Services) {
        let token = svc.token();
        match svc.api.list_users(token.as_deref()) {
            Ok(users) => self.users = users,
            Err(e) => svc.report("user-management", "list_users", &e),
        }
    }

    fn delete(&mut self, user_id: &str, svc: &Services) -> Outcome {
        if !self.users.iter().any(|u| u.id_string() == user_id) {
            self.notice = Some(Flash::sticky(&format!(
                "No user with ID {} in the list",
                user_id
            )));
            return Outcome::Stay;
        }
        if !svc
            .prompter
            .confirm("Are you sure you want to delete this user?")
        {
            return Outcome::Stay;
        }

        let token = svc.token();
        match svc.api.delete_user(user_id, token.as_deref()) {
            Ok(_) => {
                tracing::info!(%user_id, "user deleted");
                svc.record(|j| j.user_deleted(user_id));
                self.fetch(svc);
            }
            Err(e) => {
                svc.report("user-management", "delete_user", &e);
                svc.prompter.alert(&format!("Error deleting user: {}", e));
            }
        }
        Outcome::Stay
    }
}

impl Page for UserManagementPage {
    fn title(&self) -> &'static str {
        "Manage-user"
    }

    fn mount(&mut self, svc: &Services) {
        self.fetch(svc);
    }

    fn render(&self) -> String {
        let mut out = heading("Users Management Page");
        out.push('\n');
        render_notice(&mut out, self.notice.as_ref());
        out.push_str(&format!("\n  [Add User]({})\n\n", REGISTER_PATH));

        let id_w = self
            .users
            .iter()
            .map(|u| u.id_string().len())
            .chain(std::iter::once(2))
            .max()
            .unwrap_or(2);
        let name_w = self
            .users
            .iter()
            .map(|u| u.name.chars().count())
            .chain(std::iter::once(4))
            .max()
            .unwrap_or(4);
        let email_w = self
            .users
            .iter()
            .map(|u| u.email.chars().count())
            .chain(std::iter::once(5))
            .max()
            .unwrap_or(5);

        out.push_str(&format!(
            "  {:<id_w$}  {:<name_w$}  {:<email_w$}  Actions\n",
            "ID", "Name", "Email"
        ));
        out.push_str(&format!(
            "  {}  {}  {}  -------\n",
            "-".repeat(id_w),
            "-".repeat(name_w),
            "-".repeat(email_w)
        ));
        for user in &self.users {
            let id = user.id_string();
            out.push_str(&format!(
                "  {:<id_w$}  {:<name_w$}  {:<email_w$}  delete {} | update {}\n",
                id, user.name, user.email, id, id
            ));
        }
        out
    }

    fn actions(&self) -> Vec<(&'static str, &'static str)> {
        vec![
            ("add", "register a new user"),
            ("update <id>", "edit a user"),
            ("delete <id>", "delete a user (asks first)"),
            ("refresh", "reload the list"),
        ]
    }

    fn handle(&mut self, action: &str, args: &[String], svc: &Services) -> Outcome {
        self.notice = None;
        match (action, args.first()) {
            ("add", _) => Outcome::Navigate(REGISTER_PATH.to_string()),
            ("update", Some(id)) => Outcome::Navigate(update_user_path(id)),
            ("delete", Some(id)) => self.delete(id, svc),
            ("update" | "delete", None) => {
                self.notice = Some(Flash::sticky(&format!("Usage: {} <id>", action)));
                Outcome::Stay
            }
            ("refresh", _) => {
                self.fetch(svc);
                Outcome::Stay
            }
            _ => Outcome::Unhandled,
        }
    }
}
