//! ap - agent plan and session client
//!
//! CLI entry point for planning, approving and reviewing agent work.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info};

use agentplan::cli::{Cli, Command, CredentialCommand, PromptArgs};
use agentplan::client::{self, AgentApi};
use agentplan::config::Config;
use agentplan::repl::{self, print_actions, print_outcome};
use agentplan::session::SessionManager;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("agentplan")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > INFO
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(log_dir.join("agentplan.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

fn create_api(config: &Config) -> Result<AgentApi> {
    let transport = client::connect(&config.server).context("Failed to create HTTP client")?;
    Ok(AgentApi::new(transport))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(base_url = %config.server.base_url(), "agentplan loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Health => cmd_health(&config).await,
        Command::Plan { args } => cmd_plan(&config, &args).await,
        Command::Session { args, yes } => {
            debug!(yes, "main: matched Session command");
            repl::run_session(&config, args.to_request(&config.agent), yes).await
        }
        Command::Resume { session_id, yes } => {
            debug!(%session_id, yes, "main: matched Resume command");
            repl::run_resume(&config, session_id, yes).await
        }
        Command::Models => cmd_models(&config).await,
        Command::Chats { archived } => cmd_chats(&config, archived).await,
        Command::History { chat_id } => cmd_history(&config, &chat_id).await,
        Command::Archive { chat_id, restore } => cmd_archive(&config, &chat_id, restore).await,
        Command::Credential { command } => cmd_credential(&config, command).await,
    }
}

/// Check service health
async fn cmd_health(config: &Config) -> Result<()> {
    debug!("cmd_health: called");
    let health = create_api(config)?.health().await.context("Health check failed")?;

    if health.ok {
        let provider = health.provider.as_deref().unwrap_or("default provider");
        println!("{} {} ({})", "OK".bright_green(), config.server.base_url(), provider);
    } else {
        println!("{} {}", "NOT OK".red(), config.server.base_url());
    }
    Ok(())
}

/// Request a one-shot plan and print it
async fn cmd_plan(config: &Config, args: &PromptArgs) -> Result<()> {
    debug!(prompt = %args.prompt, "cmd_plan: called");
    let transport = client::connect(&config.server).context("Failed to create HTTP client")?;
    let manager = SessionManager::spawn(transport);

    let outcome = manager.plan(args.to_request(&config.agent)).await.context("Planning failed")?;
    print_outcome(&outcome);

    let snapshot = manager.snapshot().await?;
    print_actions(&snapshot.actions);
    if !snapshot.usage.label().is_empty() {
        println!("{}", snapshot.usage.label().dimmed());
    }

    manager.shutdown().await?;
    Ok(())
}

/// List provider/model pairs
async fn cmd_models(config: &Config) -> Result<()> {
    debug!("cmd_models: called");
    let models = create_api(config)?.list_models().await.context("Failed to list models")?;

    if models.is_empty() {
        println!("No models available.");
        return Ok(());
    }
    for model in &models {
        println!("  {}", model);
    }
    Ok(())
}

/// List chats, hiding archived ones unless asked
async fn cmd_chats(config: &Config, include_archived: bool) -> Result<()> {
    debug!(include_archived, "cmd_chats: called");
    let chats = create_api(config)?.list_chats().await.context("Failed to list chats")?;

    let visible: Vec<_> = chats.iter().filter(|c| include_archived || !c.archived).collect();
    if visible.is_empty() {
        println!("No chats.");
        return Ok(());
    }
    for chat in visible {
        let marker = if chat.archived { " (archived)".dimmed().to_string() } else { String::new() };
        println!("  {}  {}{}", chat.id.bright_cyan(), chat.title, marker);
    }
    Ok(())
}

/// Print one chat's history
async fn cmd_history(config: &Config, chat_id: &str) -> Result<()> {
    debug!(%chat_id, "cmd_history: called");
    let entries = create_api(config)?
        .chat_history(chat_id)
        .await
        .context(format!("Failed to load history for chat {}", chat_id))?;

    for entry in &entries {
        let role = match entry.role.as_str() {
            "user" => entry.role.bright_green(),
            _ => entry.role.bright_blue(),
        };
        let when = entry
            .timestamp_utc()
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| entry.timestamp.clone());
        println!("{} {} {}", when.dimmed(), role, format!("{}/{}", entry.provider, entry.model).dimmed());
        println!("{}", entry.text);
        println!();
    }
    Ok(())
}

async fn cmd_archive(config: &Config, chat_id: &str, restore: bool) -> Result<()> {
    debug!(%chat_id, restore, "cmd_archive: called");
    create_api(config)?
        .archive_chat(chat_id, !restore)
        .await
        .context(format!("Failed to update chat {}", chat_id))?;

    let verb = if restore { "restored" } else { "archived" };
    println!("Chat {} {}", chat_id, verb);
    Ok(())
}

async fn cmd_credential(config: &Config, command: CredentialCommand) -> Result<()> {
    let api = create_api(config)?;
    match command {
        CredentialCommand::Set { provider, key } => {
            debug!(%provider, "cmd_credential: set");
            api.set_credential(&provider, &key).await.context("Failed to store credential")?;
            println!("Credential stored for {}", provider);
        }
        CredentialCommand::Clear { provider } => {
            debug!(%provider, "cmd_credential: clear");
            api.clear_credential(&provider).await.context("Failed to clear credential")?;
            println!("Credential cleared for {}", provider);
        }
    }
    Ok(())
}
