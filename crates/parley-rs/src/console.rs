//! Console transport: stdin lines in, stdout replies out.

use async_trait::async_trait;
use log::{debug, error, warn};
use parley_rs_core::{AdminCommand, Orchestrator, PipelineOutcome};
use parley_rs_protocol::{InboundMessage, ReplySink, SendError};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use tokio::task::JoinSet;

/// Where console input is attributed.
#[derive(Debug, Clone)]
pub struct ConsoleSession {
    pub guild_id: Option<String>,
    pub channel_id: String,
    pub user_id: String,
}

/// Writes channel messages to stdout, one line per message.
pub struct ConsoleSink {
    stdout: Mutex<tokio::io::Stdout>,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self {
            stdout: Mutex::new(tokio::io::stdout()),
        }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReplySink for ConsoleSink {
    async fn send(&self, channel_id: &str, text: &str) -> Result<(), SendError> {
        let line = format!("[#{channel_id}] {text}\n");
        let mut stdout = self.stdout.lock().await;
        stdout
            .write_all(line.as_bytes())
            .await
            .map_err(|err| SendError::Rejected(err.to_string()))?;
        stdout
            .flush()
            .await
            .map_err(|err| SendError::Rejected(err.to_string()))
    }
}

/// Input line classified for dispatch.
#[derive(Debug, PartialEq, Eq)]
enum ConsoleInput {
    Command(AdminCommand),
    Message(String),
    Blank,
}

fn classify_line(line: &str) -> ConsoleInput {
    if line.trim().is_empty() {
        return ConsoleInput::Blank;
    }
    if line.trim_start().starts_with('/')
        && let Some(command) = AdminCommand::parse(line)
    {
        return ConsoleInput::Command(command);
    }
    ConsoleInput::Message(line.to_string())
}

/// Read stdin until EOF or Ctrl-C, dispatching each line on its own task.
///
/// Returns once every dispatched task has finished.
pub async fn run(orchestrator: Arc<Orchestrator>, sink: Arc<ConsoleSink>, session: ConsoleSession) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tasks = JoinSet::new();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line,
            _ = tokio::signal::ctrl_c() => {
                debug!("interrupt received, stopping console input");
                break;
            }
        };
        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => {
                debug!("console input closed");
                break;
            }
            Err(err) => {
                error!("failed to read console input (error={})", err);
                break;
            }
        };
        while tasks.try_join_next().is_some() {}
        match classify_line(&line) {
            ConsoleInput::Blank => {}
            ConsoleInput::Command(command) => {
                let orchestrator = orchestrator.clone();
                let sink = sink.clone();
                let session = session.clone();
                tasks.spawn(async move {
                    run_command(&orchestrator, sink.as_ref(), &session, command).await;
                });
            }
            ConsoleInput::Message(text) => {
                let orchestrator = orchestrator.clone();
                let message = InboundMessage::new(
                    session.guild_id.clone(),
                    session.channel_id.as_str(),
                    session.user_id.as_str(),
                    text,
                );
                tasks.spawn(async move {
                    handle_line(&orchestrator, message).await;
                });
            }
        }
    }
    while let Some(result) = tasks.join_next().await {
        if let Err(err) = result {
            warn!("console task failed (error={})", err);
        }
    }
}

async fn handle_line(orchestrator: &Orchestrator, message: InboundMessage) {
    let channel_id = message.channel_id.clone();
    match orchestrator.handle_message(message).await {
        Ok(PipelineOutcome::Failed { stage, .. }) => {
            debug!(
                "message finished with failure (channel_id={}, stage={})",
                channel_id, stage
            );
        }
        Ok(outcome) => {
            debug!(
                "message handled (channel_id={}, outcome={})",
                channel_id,
                outcome.label()
            );
        }
        Err(err) => {
            error!(
                "message could not be recorded (channel_id={}, error={})",
                channel_id, err
            );
        }
    }
}

async fn run_command(
    orchestrator: &Orchestrator,
    sink: &ConsoleSink,
    session: &ConsoleSession,
    command: AdminCommand,
) {
    let reply = match command
        .execute(orchestrator, &session.user_id, &session.channel_id)
        .await
    {
        Ok(reply) => reply,
        Err(err) => {
            error!("command failed (command={}, error={})", command, err);
            format!("The {command} command failed.")
        }
    };
    let private_channel = format!("{} (only you)", session.channel_id);
    if let Err(err) = sink.send(&private_channel, &reply).await {
        warn!("failed to print command reply (error={})", err);
    }
}

#[cfg(test)]
mod tests {
    use super::{ConsoleInput, classify_line};
    use parley_rs_core::AdminCommand;
    use pretty_assertions::assert_eq;

    #[test]
    fn slash_commands_are_recognized() {
        assert_eq!(
            classify_line("/memory"),
            ConsoleInput::Command(AdminCommand::Memory)
        );
        assert_eq!(
            classify_line(" /reset"),
            ConsoleInput::Command(AdminCommand::Reset)
        );
    }

    #[test]
    fn other_lines_are_messages() {
        assert_eq!(
            classify_line("forget it, !ask something else"),
            ConsoleInput::Message("forget it, !ask something else".to_string())
        );
        assert_eq!(
            classify_line("/unknown thing"),
            ConsoleInput::Message("/unknown thing".to_string())
        );
        assert_eq!(classify_line("   "), ConsoleInput::Blank);
    }
}
