//! Line console on stdin: the operator's control surface.

use std::io::BufRead;
use std::sync::Arc;

use docarchiver_core::{CancellationToken, SessionHandle};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::store::JsonFileStore;

const HELP: &str = "\
Commands:
  toggle                          enable or disable automation
  status                          show the session status
  set <fileCode> <caseSequence>   change the archive settings
  help                            show this help
  quit                            stop the agent";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Toggle,
    Status,
    Set {
        file_code: String,
        case_sequence: String,
    },
    Help,
    Quit,
}

impl ConsoleCommand {
    /// Parse one input line. `Ok(None)` for blank lines.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            return Ok(None);
        };
        let rest: Vec<&str> = words.collect();

        let parsed = match (command.to_ascii_lowercase().as_str(), rest.as_slice()) {
            ("toggle", []) => ConsoleCommand::Toggle,
            ("status", []) => ConsoleCommand::Status,
            ("set", [file_code, case_sequence]) => ConsoleCommand::Set {
                file_code: file_code.to_string(),
                case_sequence: case_sequence.to_string(),
            },
            ("set", _) => return Err("usage: set <fileCode> <caseSequence>".to_string()),
            ("help" | "?", _) => ConsoleCommand::Help,
            ("quit" | "exit", _) => ConsoleCommand::Quit,
            (other, _) => return Err(format!("unknown command '{}', try 'help'", other)),
        };
        Ok(Some(parsed))
    }
}

/// Read stdin lines on a plain thread. A blocked read must not keep the
/// runtime from shutting down.
pub fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Execute console commands until `quit`, end of input or shutdown.
pub async fn run(
    mut lines: mpsc::UnboundedReceiver<String>,
    handle: SessionHandle,
    store: Arc<JsonFileStore>,
    shutdown: CancellationToken,
) {
    println!("{}", HELP);

    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => break,
            line = lines.recv() => line,
        };
        let Some(line) = line else {
            debug!("Console input closed");
            break;
        };

        let command = match ConsoleCommand::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                println!("{}", message);
                continue;
            }
        };

        match command {
            ConsoleCommand::Toggle => match handle.toggle_enabled().await {
                Ok(true) => println!("Automation enabled"),
                Ok(false) => println!("Automation disabled"),
                Err(e) => println!("Cannot toggle: {}", e),
            },
            ConsoleCommand::Status => match handle.query_status().await {
                Ok(status) => match serde_json::to_string_pretty(&status) {
                    Ok(json) => println!("{}", json),
                    Err(e) => warn!("Failed to render status: {}", e),
                },
                Err(e) => println!("{}", e),
            },
            ConsoleCommand::Set {
                file_code,
                case_sequence,
            } => {
                if let Err(e) = store.save_settings(&file_code, &case_sequence) {
                    warn!("Settings not persisted: {}", e);
                }
                match handle.update_settings(file_code, case_sequence).await {
                    Ok(settings) => println!(
                        "File code {} / case sequence {}",
                        settings.file_code, settings.case_sequence
                    ),
                    Err(e) => println!("{}", e),
                }
            }
            ConsoleCommand::Help => println!("{}", HELP),
            ConsoleCommand::Quit => {
                handle.shutdown();
                break;
            }
        }
    }
}
