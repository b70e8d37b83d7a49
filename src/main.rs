use std::net::SocketAddr;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use tracing_subscriber::EnvFilter;

use thinkai::app::App;
use thinkai::client::RelayClient;
use thinkai::config::Config;
use thinkai::relay::{self, RelayKind, RelayState};
use thinkai::{handler, tui, ui};

#[derive(Parser)]
#[command(name = "thinkai")]
#[command(about = "Chat with Google Gemini from the terminal, directly or through hint-only tutoring")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the chat view (default)
    Chat {
        /// Base URL of a running relay; an in-process relay is spawned when omitted
        #[arg(short, long)]
        relay: Option<String>,
        /// Start in hint mode: the model gives clues instead of answers
        #[arg(long)]
        hints: bool,
    },
    /// Run the relay server standalone
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
    /// Ask a single question and print the reply
    Ask {
        /// Your question
        question: String,
        /// Ask for hints instead of the answer
        #[arg(long)]
        hints: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::load().unwrap_or_else(|_| Config::new());

    match cli.command.unwrap_or(Commands::Chat {
        relay: None,
        hints: false,
    }) {
        Commands::Chat { relay, hints } => run_chat(&config, relay, hints).await,
        Commands::Serve { port } => run_serve(&config, port).await,
        Commands::Ask { question, hints } => run_ask(&config, &question, hints).await,
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

/// Resolve where the view should send messages: an explicit URL, the
/// configured relay, or an in-process relay on an ephemeral local port so
/// the view still crosses the HTTP boundary.
async fn resolve_relay_url(config: &Config, relay_url: Option<String>) -> Result<String> {
    match relay_url.or_else(|| config.relay_url.clone()) {
        Some(url) => Ok(url),
        None => relay::spawn_local(RelayState::from_config(config)).await,
    }
}

async fn run_chat(config: &Config, relay_url: Option<String>, hints: bool) -> Result<()> {
    let relay_url = resolve_relay_url(config, relay_url).await?;
    let mode = if hints { RelayKind::Hint } else { RelayKind::Direct };
    let mut app = App::new(RelayClient::new(&relay_url), mode);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;
        if let Some(event) = events.next().await {
            handler::handle_event(&mut app, event).await?;
        }
    }

    tui::restore()?;
    Ok(())
}

async fn run_serve(config: &Config, port: u16) -> Result<()> {
    init_tracing();
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    relay::run(addr, RelayState::from_config(config)).await
}

async fn run_ask(config: &Config, question: &str, hints: bool) -> Result<()> {
    init_tracing();
    let relay_url = resolve_relay_url(config, None).await?;
    let mode = if hints { RelayKind::Hint } else { RelayKind::Direct };
    let client = RelayClient::new(&relay_url);

    println!("{} {}", "You:".bold().cyan(), question);
    match client.send(mode, question).await {
        Ok(reply) => {
            println!("{}", "AI:".bold().yellow());
            println!("{}", reply);
        }
        Err(e) => {
            println!("{}: {}", "Error contacting relay".red(), e);
        }
    }

    Ok(())
}
