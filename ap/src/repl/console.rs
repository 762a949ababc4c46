//! Approval console for a live session

use colored::{ColoredString, Colorize};
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::debug;

use crate::domain::{ActionIndex, PlannedAction, RiskLevel};
use crate::session::{SessionManager, SessionState, StepOutcome};

/// A human decision on one proposed action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
    Quit,
}

impl Decision {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "y" | "yes" => Some(Self::Approve),
            "n" | "no" => Some(Self::Reject),
            "q" | "quit" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Walks a session from its first proposal to completion
pub struct ApprovalConsole {
    manager: SessionManager,
    auto_approve: bool,
}

impl ApprovalConsole {
    pub fn new(manager: SessionManager, auto_approve: bool) -> Self {
        Self { manager, auto_approve }
    }

    /// Drive the session; returns the id of a session left open by quitting
    pub async fn run(&mut self, first: StepOutcome) -> Result<Option<String>> {
        debug!(auto_approve = self.auto_approve, "run: called");
        let mut rl = if self.auto_approve {
            None
        } else {
            Some(DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?)
        };

        let mut outcome = first;
        loop {
            print_outcome(&outcome);

            match (outcome.state, outcome.current) {
                (SessionState::AwaitingApproval, Some(index)) => {
                    let action = self.manager.get_action(index).await?;
                    print_proposal(index, &action);

                    let decision = match rl.as_mut() {
                        Some(rl) => ask(rl)?,
                        None => Decision::Approve,
                    };
                    debug!(?decision, %index, "run: decision");
                    match decision {
                        Decision::Quit => {
                            if let Some(id) = &outcome.session_id {
                                println!(
                                    "Session {} left open. Resume with {}",
                                    id.bright_white(),
                                    format!("ap resume {}", id).yellow()
                                );
                            }
                            return Ok(outcome.session_id);
                        }
                        Decision::Approve => outcome = self.manager.approve(true).await?,
                        Decision::Reject => outcome = self.manager.approve(false).await?,
                    }
                }
                _ if outcome.session_id.is_some() => {
                    debug!("run: session open without a pending action, requesting next");
                    outcome = self.manager.next(None).await?;
                }
                _ => {
                    println!("{}", "Session complete.".bright_green());
                    return Ok(None);
                }
            }
        }
    }
}

/// Prompt until the user gives a recognisable answer
fn ask(rl: &mut DefaultEditor) -> Result<Decision> {
    loop {
        match rl.readline(&format!("{} ", "approve? [y/n/q]".bright_green())) {
            Ok(line) => match Decision::parse(&line) {
                Some(decision) => return Ok(decision),
                None => println!("{} Answer y, n or q", "?".yellow()),
            },
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!();
                return Ok(Decision::Quit);
            }
            Err(err) => return Err(eyre::eyre!("Readline error: {}", err)),
        }
    }
}

pub fn risk_badge(risk: RiskLevel) -> ColoredString {
    let text = format!("[{}]", risk);
    match risk {
        RiskLevel::Low => text.green(),
        RiskLevel::Medium => text.yellow(),
        RiskLevel::High => text.red().bold(),
    }
}

pub fn print_outcome(outcome: &StepOutcome) {
    let message = outcome.message.trim_end();
    if !message.is_empty() {
        println!("{}", message);
    }
    if outcome.dropped > 0 {
        println!("{}", format!("({} action(s) skipped as invalid)", outcome.dropped).dimmed());
    }
}

fn print_proposal(index: ActionIndex, action: &PlannedAction) {
    println!(
        "{} {} {} {}",
        format!("#{}", index).bright_cyan(),
        risk_badge(action.risk()),
        action.command().bright_white(),
        action.kind().describe().dimmed()
    );
}

/// Numbered preview of a plan's actions
pub fn print_actions(actions: &[PlannedAction]) {
    if actions.is_empty() {
        println!("{}", "No automated actions.".dimmed());
        return;
    }
    println!("{}", "Actions:".bright_cyan());
    for (i, action) in actions.iter().enumerate() {
        println!("  {}. {} {}", i + 1, risk_badge(action.risk()), action.preview());
    }
}
