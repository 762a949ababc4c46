//! Interactive approval console
//!
//! Opens or resumes a session against the configured service and asks the
//! user to approve each proposed action in turn.

mod console;

pub use console::{ApprovalConsole, Decision, print_actions, print_outcome, risk_badge};

use eyre::{Context, Result};

use crate::client::{self, PlanRequest};
use crate::config::Config;
use crate::session::SessionManager;

fn spawn_manager(config: &Config) -> Result<SessionManager> {
    let transport = client::connect(&config.server).context("Failed to create HTTP client")?;
    Ok(SessionManager::spawn(transport))
}

/// Open a new session and walk it to completion
///
/// This is the main entry point for `ap session`.
pub async fn run_session(config: &Config, request: PlanRequest, auto_approve: bool) -> Result<()> {
    let manager = spawn_manager(config)?;
    let first = manager.start(request).await?;
    ApprovalConsole::new(manager.clone(), auto_approve).run(first).await?;
    manager.shutdown().await?;
    Ok(())
}

/// Resume `session_id` and continue approving
pub async fn run_resume(config: &Config, session_id: String, auto_approve: bool) -> Result<()> {
    let manager = spawn_manager(config)?;
    let first = manager.resume(Some(session_id)).await?;
    ApprovalConsole::new(manager.clone(), auto_approve).run(first).await?;
    manager.shutdown().await?;
    Ok(())
}
