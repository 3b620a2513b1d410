mod api;
mod cli;
mod config;
mod gate;
mod journal;
mod nav;
mod pages;
mod prompt;
mod router;
mod session;

use anyhow::Result;
use clap::Parser;
use std::cell::RefCell;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "userdesk", about = "Terminal console for a user-management backend")]
pub struct Args {
    #[arg(long, env = "USERDESK_API_URL", help = "Backend base URL (overrides config)")]
    pub api_url: Option<String>,

    #[arg(long, help = "Config file path")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Session store file, or '-' for an in-memory store")]
    pub storage: Option<String>,

    #[arg(long, help = "Do not write the activity journal")]
    pub no_journal: bool,

    #[arg(long, help = "Debug logging")]
    pub debug: bool,

    #[arg(long, value_name = "PATH", help = "Open this path and exit (one-shot mode)")]
    pub goto: Option<String>,

    #[arg(long = "action", value_name = "TEXT", action = clap::ArgAction::Append, help = "Page action to run in one-shot mode (repeatable)")]
    pub actions: Vec<String>,

    #[arg(long, help = "Auto-confirm prompts in one-shot mode")]
    pub yes: bool,

    #[arg(long, help = "Print the effective configuration and exit")]
    pub show_config: bool,
}

fn init_logging(debug: bool) {
    let default = if debug { "userdesk=debug" } else { "userdesk=warn" };
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| default.to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_logging(args.debug);

    let mut cfg = if let Some(config_path) = &args.config {
        config::Config::load_from(config_path)?
    } else {
        config::Config::load().unwrap_or_else(|e| {
            eprintln!("Warning: {:#}; using defaults", e);
            config::Config::default()
        })
    };
    if let Some(url) = &args.api_url {
        cfg.api.base_url = url.clone();
    }
    if args.no_journal {
        cfg.journal.enabled = false;
    }

    if let Err(errors) = cfg.validate() {
        for e in &errors {
            eprintln!("Config error {}", e);
        }
        return Err(anyhow::anyhow!(
            "Invalid configuration ({} error(s))",
            errors.len()
        ));
    }

    if args.show_config {
        print!("{}", toml::to_string_pretty(&cfg)?);
        return Ok(());
    }

    let store: Box<dyn session::SessionStore> = match args.storage.as_deref() {
        Some("-") => Box::new(session::MemoryStore::new()),
        other => {
            let path = other.map(PathBuf::from).unwrap_or_else(|| cfg.storage_path());
            let store = session::FileStore::new(&path);
            tracing::debug!(path = %store.path().display(), "session store");
            Box::new(store)
        }
    };

    let console_id = uuid::Uuid::new_v4().to_string();
    let journal = if cfg.journal.enabled {
        journal::Journal::new(&cfg.journal_path(), &console_id)?
    } else {
        journal::Journal::disabled(&console_id)
    };

    let client = api::Client::new(
        &cfg.api.base_url,
        cfg.api.timeout_ms.map(Duration::from_millis),
    );
    tracing::debug!(base_url = client.base_url(), %console_id, "starting");

    let one_shot = args.goto.is_some() || !args.actions.is_empty();
    let prompter = prompt::TerminalPrompter::new(one_shot, args.yes);
    let gate = gate::Gate::new(&cfg.auth.admin_role);
    let journal = RefCell::new(journal);

    let mut console = cli::Console::new(pages::Services {
        api: &client,
        store: store.as_ref(),
        prompter: &prompter,
        journal: &journal,
        gate: &gate,
    });

    let start = args.goto.as_deref().unwrap_or("/");
    if one_shot {
        cli::run_once(&mut console, start, &args.actions)
    } else {
        let history = config::Config::state_dir().join("history.txt");
        cli::run_repl(&mut console, start, Some(&history))
    }
}
