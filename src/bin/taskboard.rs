//! Command-line host for the session core.
//!
//! Each invocation is a fresh process, so the session only survives between
//! commands through the file store, the same way it survives a page reload
//! in the browser client.
//!
//! ```text
//! taskboard login --email ada@example.com --password secret
//! taskboard status
//! taskboard visit /admin
//! taskboard logout
//! ```

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use taskboard_session::events::EventRegistry;
use taskboard_session::events::listeners::TracingListener;
use taskboard_session::routes::{Navigation, RouteTable};
use taskboard_session::{ApiClient, ClientConfig, FileSessionStore, SessionManager, SessionState};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "taskboard", about = "Sign in to the Todo Manager API", version)]
struct Cli {
    /// API base URL (overrides TASKBOARD_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and remember the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "TASKBOARD_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show who is logged in
    Status,
    /// Check what navigating to a path would do
    Visit { path: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = ClientConfig::from_env().context("invalid configuration")?;
    if let Some(url) = cli.api_url.as_deref() {
        config = config.with_base_url(url).context("invalid --api-url")?;
    }

    let store = FileSessionStore::new(&config.session_file)?;
    let client = ApiClient::new(&config)?;

    let mut events = EventRegistry::new();
    events.listen(TracingListener);

    let manager = SessionManager::new(store, client).with_events(Arc::new(events));
    manager.initialize().await;

    match cli.command {
        Command::Login { email, password } => {
            let session = manager.login(&email, &password).await?;
            println!(
                "Logged in as {} ({}), continue at {}",
                session.name,
                session.role,
                RouteTable::landing_path(session.role)
            );
        }
        Command::Logout => {
            manager.logout().await;
            println!("Logged out");
        }
        Command::Status => match manager.state() {
            SessionState::Authenticated(session) => {
                println!("{} <{}> role={}", session.name, session.email, session.role);
            }
            _ => println!("Not logged in"),
        },
        Command::Visit { path } => {
            let table = RouteTable::new();
            match table.navigate(&manager.state(), &path) {
                Navigation::Render(view) => println!("render {view:?}"),
                Navigation::Redirect { to, from: Some(from) } => {
                    println!("redirect {to} (from {from})");
                }
                Navigation::Redirect { to, from: None } => println!("redirect {to}"),
                Navigation::Pending => println!("loading"),
                Navigation::NotFound => anyhow::bail!("no route for {path}"),
            }
        }
    }

    Ok(())
}
