use super::{heading, Outcome, Page, Services};
use crate::api::User;
use crate::router::update_user_path;

pub struct ProfilePage {
    profile: Option<User>,
    /// Whether the loaded profile carries the admin role.
    can_update: bool,
}

impl ProfilePage {
    pub fn new() -> Self {
        Self {
            profile: None,
            can_update: false,
        }
    }

    fn load(&mut self, svc: &Services) {
        let token = svc.token();
        match svc.api.profile(token.as_deref()) {
            Ok(user) => {
                self.can_update = user.role == svc.gate.admin_role();
                self.profile = Some(user);
            }
            Err(e) => svc.report("profile", "get_profile", &e),
        }
    }
}

impl Page for ProfilePage {
    fn title(&self) -> &'static str {
        "Profile-page"
    }

    fn mount(&mut self, svc: &Services) {
        self.load(svc);
    }

    fn render(&self) -> String {
        let empty = User::default();
        let user = self.profile.as_ref().unwrap_or(&empty);
        let mut out = heading("Profile Information");
        out.push_str(&format!("\n  Name: {}", user.name));
        out.push_str(&format!("\n  Email: {}", user.email));
        out.push_str(&format!("\n  City: {}", user.city));
        if self.can_update {
            out.push_str(&format!(
                "\n\n  [Update This Profile]({})",
                update_user_path(&user.id_string())
            ));
        }
        out
    }

    fn actions(&self) -> Vec<(&'static str, &'static str)> {
        let mut actions = vec![("refresh", "reload the profile")];
        if self.can_update {
            actions.push(("update", "edit this profile"));
        }
        actions
    }

    fn handle(&mut self, action: &str, _args: &[String], svc: &Services) -> Outcome {
        match action {
            "refresh" => {
                self.load(svc);
                Outcome::Stay
            }
            "update" if self.can_update => {
                let id = self
                    .profile
                    .as_ref()
                    .map(|u| u.id_string())
                    .unwrap_or_default();
                Outcome::Navigate(update_user_path(&id))
            }
            _ => Outcome::Unhandled,
        }
    }
}
