//! Administrative commands over a user's memory and a channel's history.

use crate::error::ParleyCoreError;
use crate::orchestrator::Orchestrator;
use std::fmt;

/// Command invoked by a chat participant; replies go to the invoker only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminCommand {
    /// Show the caller's long-term summary.
    Memory,
    /// Erase the caller's long-term summary.
    Forget,
    /// Clear the current channel's history.
    Reset,
}

impl AdminCommand {
    /// Parse `memory`, `/memory`, `/FORGET`, and so on. Arguments are not accepted.
    pub fn parse(input: &str) -> Option<Self> {
        let name = input.trim();
        let name = name.strip_prefix('/').unwrap_or(name);
        match name.to_ascii_lowercase().as_str() {
            "memory" => Some(AdminCommand::Memory),
            "forget" => Some(AdminCommand::Forget),
            "reset" => Some(AdminCommand::Reset),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AdminCommand::Memory => "memory",
            AdminCommand::Forget => "forget",
            AdminCommand::Reset => "reset",
        }
    }

    /// Run the command and return the confirmation text.
    pub async fn execute(
        self,
        orchestrator: &Orchestrator,
        user_id: &str,
        channel_id: &str,
    ) -> Result<String, ParleyCoreError> {
        match self {
            AdminCommand::Memory => {
                let summary = orchestrator.read_memory(user_id).await?;
                let summary = summary.trim();
                if summary.is_empty() {
                    Ok("I don't have any long-term memory about you yet.".to_string())
                } else {
                    Ok(format!("Your long-term memory: {summary}"))
                }
            }
            AdminCommand::Forget => {
                orchestrator.forget_user(user_id).await?;
                Ok("Your long-term memory has been erased.".to_string())
            }
            AdminCommand::Reset => {
                let cleared = orchestrator.reset_channel(channel_id).await?;
                Ok(format!(
                    "Cleared {cleared} messages from this channel's history."
                ))
            }
        }
    }
}

impl fmt::Display for AdminCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
