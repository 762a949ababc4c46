//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use crate::client::PlanRequest;
use crate::config::AgentConfig;

/// ap - agent plan and session client
#[derive(Parser)]
#[command(
    name = "ap",
    about = "Plan, review and approve editor automation with a remote agent service",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Prompt plus the request overrides shared by `plan` and `session`
#[derive(Debug, Clone, clap::Args)]
pub struct PromptArgs {
    /// What the agent should do
    pub prompt: String,

    /// Actor to operate on (repeatable); none means the current selection
    #[arg(short = 't', long = "target", value_name = "NAME")]
    pub targets: Vec<String>,

    /// Planning mode (overrides config)
    #[arg(long)]
    pub mode: Option<String>,

    /// Provider (overrides config)
    #[arg(long)]
    pub provider: Option<String>,

    /// Model (overrides config)
    #[arg(long)]
    pub model: Option<String>,
}

impl PromptArgs {
    /// Build a plan request, falling back to the configured agent defaults
    pub fn to_request(&self, agent: &AgentConfig) -> PlanRequest {
        debug!(targets = self.targets.len(), "to_request: called");
        let pick = |flag: &Option<String>, configured: &str| flag.clone().unwrap_or_else(|| configured.to_string());
        PlanRequest::new(self.prompt.clone())
            .with_mode(pick(&self.mode, &agent.mode))
            .with_provider(pick(&self.provider, &agent.provider))
            .with_model(pick(&self.model, &agent.model))
            .with_targets(self.targets.clone())
    }
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check that the agent service is reachable
    Health,

    /// Request a one-shot plan and print it
    Plan {
        #[command(flatten)]
        args: PromptArgs,
    },

    /// Open a session and approve actions one at a time
    Session {
        #[command(flatten)]
        args: PromptArgs,

        /// Approve every proposed action without prompting
        #[arg(short, long)]
        yes: bool,
    },

    /// Resume an existing session
    Resume {
        /// Session ID returned by the server
        session_id: String,

        /// Approve every proposed action without prompting
        #[arg(short, long)]
        yes: bool,
    },

    /// List available provider/model pairs
    Models,

    /// List chats
    Chats {
        /// Include archived chats
        #[arg(short, long)]
        archived: bool,
    },

    /// Show the history of one chat
    History {
        /// Chat ID
        chat_id: String,
    },

    /// Archive a chat
    Archive {
        /// Chat ID
        chat_id: String,

        /// Restore an archived chat instead
        #[arg(long)]
        restore: bool,
    },

    /// Manage provider credentials held by the service
    Credential {
        #[command(subcommand)]
        command: CredentialCommand,
    },
}

/// Credential subcommands
#[derive(Debug, Subcommand)]
pub enum CredentialCommand {
    /// Store an API key for a provider
    Set {
        /// Provider name
        provider: String,

        /// API key
        key: String,
    },

    /// Remove the stored key for a provider
    Clear {
        /// Provider name
        provider: String,
    },
}
