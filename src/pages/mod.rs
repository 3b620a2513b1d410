//! Page components. Each page owns its view state for as long as it is
//! mounted; navigating away drops it.

pub mod form;
mod login;
mod profile;
mod register;
mod update_user;
mod users;

pub use login::LoginPage;
pub use profile::ProfilePage;
pub use register::RegistrationPage;
pub use update_user::UpdateUserPage;
pub use users::UserManagementPage;

use std::cell::RefCell;
use std::time::{Duration, Instant};

use crate::api::{ApiError, UserApi};
use crate::gate::Gate;
use crate::journal::Journal;
use crate::prompt::Prompter;
use crate::router::Route;
use crate::session::{SessionStore, TOKEN_KEY};

/// Everything a page may touch outside its own state.
pub struct Services<'a> {
    pub api: &'a dyn UserApi,
    pub store: &'a dyn SessionStore,
    pub prompter: &'a dyn Prompter,
    pub journal: &'a RefCell<Journal>,
    pub gate: &'a Gate,
}

impl Services<'_> {
    /// Token as stored right now.
    pub fn token(&self) -> Option<String> {
        self.store.get(TOKEN_KEY).filter(|t| !t.is_empty())
    }

    /// Log a failed call and note it in the journal.
    pub fn report(&self, page: &str, operation: &str, err: &ApiError) {
        tracing::error!(page, operation, error = %err, "api call failed");
        if let Err(e) = self
            .journal
            .borrow_mut()
            .api_error(page, operation, &err.to_string())
        {
            tracing::warn!(error = %e, "failed to write journal");
        }
    }

    pub fn record<F>(&self, write: F)
    where
        F: FnOnce(&mut Journal) -> anyhow::Result<()>,
    {
        if let Err(e) = write(&mut *self.journal.borrow_mut()) {
            tracing::warn!(error = %e, "failed to write journal");
        }
    }
}

/// What the console should do after a page action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Stay,
    Navigate(String),
    /// Navigate, then rebuild routes from the session store.
    Reload(String),
    /// The page does not know this action.
    Unhandled,
}

/// Inline message shown inside a page.
#[derive(Debug, Clone)]
pub struct Flash {
    pub text: String,
    shown_at: Instant,
    ttl: Option<Duration>,
}

impl Flash {
    pub fn sticky(text: &str) -> Self {
        Self {
            text: text.to_string(),
            shown_at: Instant::now(),
            ttl: None,
        }
    }

    pub fn expiring(text: &str, ttl: Duration) -> Self {
        Self {
            text: text.to_string(),
            shown_at: Instant::now(),
            ttl: Some(ttl),
        }
    }

    pub fn is_visible(&self) -> bool {
        match self.ttl {
            Some(ttl) => self.shown_at.elapsed() < ttl,
            None => true,
        }
    }
}

pub trait Page {
    /// Display title, set on mount.
    fn title(&self) -> &'static str;

    /// Load whatever the page shows. Called once per navigation.
    fn mount(&mut self, _svc: &Services) {}

    fn render(&self) -> String;

    /// Action names and one-line descriptions for `/help`.
    fn actions(&self) -> Vec<(&'static str, &'static str)>;

    fn handle(&mut self, action: &str, args: &[String], svc: &Services) -> Outcome;
}

pub fn open(route: &Route) -> Box<dyn Page> {
    match route {
        Route::Login => Box::new(LoginPage::new()),
        Route::Profile => Box::new(ProfilePage::new()),
        Route::Register => Box::new(RegistrationPage::new()),
        Route::UserManagement => Box::new(UserManagementPage::new()),
        Route::UpdateUser { user_id } => Box::new(UpdateUserPage::new(user_id)),
    }
}

fn heading(text: &str) -> String {
    format!("{}\n{}", text, "=".repeat(text.len()))
}

fn render_notice(out: &mut String, notice: Option<&Flash>) {
    if let Some(flash) = notice.filter(|f| f.is_visible()) {
        out.push_str(&format!("\n  ! {}\n", flash.text));
    }
}
