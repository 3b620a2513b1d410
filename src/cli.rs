use anyhow::Result;
use chrono::{Datelike, Utc};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::Path;

use crate::journal::Journal;
use crate::nav;
use crate::pages::{self, Outcome, Page, Services};
use crate::router::{normalize, Resolution, Route, RouteTable, LOGIN_PATH};
use crate::session::{decode_claims, token_fingerprint, Session, SessionState, TOKEN_KEY};

/// What the caller should show after one line of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Redraw the current page.
    Render,
    Text(String),
    Exit,
}

/// The mounted page plus the route table it was resolved against.
pub struct Console<'a> {
    svc: Services<'a>,
    routes: RouteTable,
    path: String,
    page: Box<dyn Page>,
    history: Vec<String>,
}

impl<'a> Console<'a> {
    pub fn new(svc: Services<'a>) -> Self {
        let routes = RouteTable::build(svc.gate.snapshot(svc.store));
        Self {
            svc,
            routes,
            path: LOGIN_PATH.to_string(),
            page: pages::open(&Route::Login),
            history: Vec::new(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn title(&self) -> &'static str {
        self.page.title()
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Resolve `path` against the current table and mount the page.
    pub fn navigate(&mut self, path: &str) {
        self.go(path, true);
    }

    fn go(&mut self, path: &str, remember: bool) {
        let requested = normalize(path);
        let (path, route) = match self.routes.resolve(&requested) {
            Resolution::Page(route) => (requested, route),
            Resolution::Redirect(to) => {
                tracing::debug!(from = %requested, to = %to, "redirect");
                match self.routes.resolve(&to) {
                    Resolution::Page(route) => (to, route),
                    Resolution::Redirect(_) => (LOGIN_PATH.to_string(), Route::Login),
                }
            }
        };

        if remember && path != self.path {
            self.history.push(std::mem::take(&mut self.path));
        }
        let mut page = pages::open(&route);
        page.mount(&self.svc);
        tracing::debug!(%path, title = page.title(), "mounted");
        self.page = page;
        self.path = path;
    }

    /// Rebuild the route table from the store, then navigate.
    pub fn reload(&mut self, path: &str) {
        let access = self.svc.gate.snapshot(self.svc.store);
        self.routes = RouteTable::build(access);
        tracing::debug!(admin_routes = self.routes.has_admin_routes(), "routes rebuilt");
        self.navigate(path);
    }

    /// Navigation bar, page body and footer.
    pub fn screen(&self) -> String {
        let access = self.svc.gate.snapshot(self.svc.store);
        format!(
            "{}\n\n{}\n\n{}",
            nav::render(access),
            self.page.render(),
            nav::footer(Utc::now().year())
        )
    }

    pub fn execute(&mut self, line: &str) -> Reply {
        let line = line.trim();
        if line.is_empty() {
            return Reply::Render;
        }
        if line.starts_with('/') {
            return self.handle_command(line);
        }

        let words = match shell_words::split(line) {
            Ok(words) => words,
            Err(e) => return Reply::Text(format!("Could not parse input: {}", e)),
        };
        let Some((action, args)) = words.split_first() else {
            return Reply::Render;
        };
        let outcome = self.page.handle(action, args, &self.svc);
        self.apply(outcome, action)
    }

    fn apply(&mut self, outcome: Outcome, action: &str) -> Reply {
        match outcome {
            Outcome::Stay => {}
            Outcome::Navigate(path) => self.navigate(&path),
            Outcome::Reload(path) => self.reload(&path),
            Outcome::Unhandled => {
                return Reply::Text(format!(
                    "Unknown action '{}' on {}. Type /help for this page's actions.",
                    action,
                    self.page.title()
                ))
            }
        }
        Reply::Render
    }

    fn handle_command(&mut self, cmd: &str) -> Reply {
        let parts: Vec<&str> = cmd.splitn(2, ' ').collect();
        let arg = parts.get(1).map(|s| s.trim()).unwrap_or("");
        match parts[0] {
            "/exit" | "/quit" => Reply::Exit,
            "/help" => Reply::Text(self.help()),
            "/go" => {
                if arg.is_empty() {
                    return Reply::Text("Usage: /go <path>".to_string());
                }
                self.navigate(arg);
                Reply::Render
            }
            "/back" => match self.history.pop() {
                Some(prev) => {
                    self.go(&prev, false);
                    Reply::Render
                }
                None => Reply::Text("Nowhere to go back to".to_string()),
            },
            "/nav" => Reply::Text(nav::render(self.svc.gate.snapshot(self.svc.store))),
            "/reload" => {
                let path = self.path.clone();
                self.reload(&path);
                Reply::Render
            }
            "/logout" => self.logout(),
            "/session" => Reply::Text(self.session_info()),
            "/refresh-token" => self.refresh_token(),
            _ => Reply::Text(format!("Unknown command: {}", parts[0])),
        }
    }

    fn help(&self) -> String {
        let mut out = String::from("Commands:\n");
        for (cmd, what) in [
            ("/help", "show commands and page actions"),
            ("/go <path>", "navigate to a path"),
            ("/back", "return to the previous page"),
            ("/nav", "show the navigation links"),
            ("/reload", "rebuild routes from the stored session"),
            ("/logout", "end the session (asks first)"),
            ("/session", "show the stored session"),
            ("/refresh-token", "exchange the token for a fresh one"),
            ("/exit", "quit"),
        ] {
            out.push_str(&format!("  {:<16}- {}\n", cmd, what));
        }
        out.push_str(&format!("{} actions:\n", self.page.title()));
        for (action, what) in self.page.actions() {
            out.push_str(&format!("  {:<20}- {}\n", action, what));
        }
        out
    }

    fn logout(&mut self) -> Reply {
        if !self.svc.gate.is_authenticated(self.svc.store) {
            return Reply::Text("Not logged in".to_string());
        }
        if !self
            .svc
            .prompter
            .confirm("Are you sure you want to logout this user?")
        {
            return Reply::Render;
        }

        let token = self.svc.token();
        if let Err(e) = Session::end(self.svc.store) {
            tracing::error!(error = %e, "failed to clear session");
            return Reply::Text(format!("Logout failed: {:#}", e));
        }
        tracing::info!("logged out");
        self.svc.record(|j| j.logout(token.as_deref()));
        self.apply(Outcome::Reload(LOGIN_PATH.to_string()), "logout")
    }

    fn session_info(&self) -> String {
        let session = Session::load(self.svc.store);
        let mut out = String::new();
        let state = match session.state() {
            SessionState::Anonymous => "anonymous",
            SessionState::Authenticated => "authenticated",
        };
        out.push_str(&format!("State: {}\n", state));
        out.push_str(&format!(
            "Role: {}\n",
            session.role.as_deref().unwrap_or("<none>")
        ));
        if let Some(token) = &session.token {
            out.push_str(&format!("Token: {}\n", token_fingerprint(token)));
            if let Some(claims) = decode_claims(token) {
                if let Some(sub) = &claims.sub {
                    out.push_str(&format!("Subject: {}\n", sub));
                }
                if let Some(iat) = claims.issued_at() {
                    out.push_str(&format!("Issued: {}\n", iat.to_rfc3339()));
                }
                if let Some(exp) = claims.expires_at() {
                    let note = if exp <= Utc::now() { " (expired)" } else { "" };
                    out.push_str(&format!("Expires: {}{}\n", exp.to_rfc3339(), note));
                }
            }
        }
        let admin = self.svc.gate.admin_only(self.svc.store);
        out.push_str(&format!("Admin: {}\n", if admin { "yes" } else { "no" }));
        out.push_str(&format!(
            "Admin routes: {}\n",
            if self.routes.has_admin_routes() {
                "loaded"
            } else {
                "not loaded"
            }
        ));
        let journal = self.svc.journal.borrow();
        out.push_str(&format!("Console: {}\n", journal.console_id()));
        out.push_str(&format!("Journal: {}", describe_journal(&journal)));
        out
    }

    fn refresh_token(&mut self) -> Reply {
        let Some(old) = self.svc.token() else {
            return Reply::Text("Not logged in".to_string());
        };
        let resp = match self.svc.api.refresh(&old) {
            Ok(resp) => resp,
            Err(e) => {
                self.svc.report("console", "refresh", &e);
                return Reply::Text(format!("Token refresh failed: {}", e));
            }
        };
        let Some(new) = resp.token.filter(|t| !t.is_empty()) else {
            return Reply::Text("Token refresh failed: no token in response".to_string());
        };
        if let Err(e) = self.svc.store.set(TOKEN_KEY, &new) {
            tracing::error!(error = %e, "failed to store refreshed token");
            return Reply::Text(format!("Token refresh failed: {:#}", e));
        }
        tracing::info!("token refreshed");
        self.svc.record(|j| j.token_refreshed(&old, &new));
        Reply::Text(format!("Token refreshed ({})", token_fingerprint(&new)))
    }
}

fn describe_journal(journal: &Journal) -> String {
    match &journal.path {
        Some(path) => path.display().to_string(),
        None => "disabled".to_string(),
    }
}

fn show(console: &Console, reply: Reply) -> bool {
    match reply {
        Reply::Render => println!("{}", console.screen()),
        Reply::Text(text) => println!("{}", text),
        Reply::Exit => return true,
    }
    false
}

/// Open `start`, run each action in order, print the final page.
pub fn run_once(console: &mut Console, start: &str, actions: &[String]) -> Result<()> {
    console.navigate(start);
    for action in actions {
        let reply = console.execute(action);
        if reply == Reply::Exit {
            return Ok(());
        }
        if let Reply::Text(text) = reply {
            println!("{}", text);
        }
    }
    println!("{}", console.screen());
    Ok(())
}

pub fn run_repl(console: &mut Console, start: &str, history: Option<&Path>) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    if let Some(path) = history {
        let _ = rl.load_history(path);
    }

    println!("userdesk - type /help for commands, /exit to quit");
    console.navigate(start);
    println!("{}", console.screen());

    loop {
        let prompt = format!("{} {}> ", console.title(), console.path());
        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                rl.add_history_entry(line)?;
                let reply = console.execute(line);
                if show(console, reply) {
                    break;
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {}", e);
                break;
            }
        }
    }

    if let Some(path) = history {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Err(e) = rl.save_history(path) {
            tracing::warn!(error = %e, "failed to save input history");
        }
    }
    Ok(())
}
