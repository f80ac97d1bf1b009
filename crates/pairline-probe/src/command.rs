//! Line commands read from stdin.
//!
//! Each non-empty line is one command. Words are separated by whitespace;
//! commands that target a user take the user id as their only argument.

use std::time::Instant;

use pairline_client::{ClientEvent, SessionState, Tab};
use thiserror::Error;

/// Usage shown for `help` and after a bad command.
pub const HELP: &str = "commands: start | skip | end | hangup | extend <secs> | retry | call \
                        | online | busy | offline | connect <id> | cancel <id> | remove <id> \
                        | tab <matching|other> | logout | quit";

/// Command parse errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// First word is not a command.
    #[error("unknown command: {0}")]
    Unknown(String),

    /// Required argument missing.
    #[error("{command}: missing {argument}")]
    MissingArgument {
        /// Command name.
        command: &'static str,
        /// What was expected.
        argument: &'static str,
    },

    /// Argument present but unusable.
    #[error("{command}: invalid argument {value:?}")]
    InvalidArgument {
        /// Command name.
        command: &'static str,
        /// Offending value.
        value: String,
    },
}

/// A parsed line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Feed this event to the client.
    Event(ClientEvent<Instant>),
    /// Show usage.
    Help,
}

/// Parse one line. Blank lines yield `None`.
pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
    let mut words = line.split_whitespace();
    let Some(name) = words.next() else {
        return Ok(None);
    };
    let arg = words.next();

    let event = match name.to_ascii_lowercase().as_str() {
        "help" | "?" => return Ok(Some(Command::Help)),
        "start" => ClientEvent::StartMatching,
        "skip" | "next" => ClientEvent::Skip,
        "end" => ClientEvent::EndCall { target: SessionState::Idle, notify: true },
        "hangup" => ClientEvent::EndCall { target: SessionState::Disconnecting, notify: true },
        "extend" => {
            let raw = arg.ok_or(CommandError::MissingArgument { command: "extend", argument: "seconds" })?;
            let seconds = raw
                .parse()
                .map_err(|_| CommandError::InvalidArgument { command: "extend", value: raw.to_string() })?;
            ClientEvent::ExtendTimer { seconds }
        },
        "retry" => ClientEvent::RetryMedia,
        "call" => ClientEvent::CallRequested,
        "online" => ClientEvent::ChangeOnlineStatus { online: true, busy: false },
        "busy" => ClientEvent::ChangeOnlineStatus { online: true, busy: true },
        "offline" => ClientEvent::ChangeOnlineStatus { online: false, busy: false },
        "connect" => ClientEvent::ConnectUser { user_id: user(arg, "connect")? },
        "cancel" => ClientEvent::CancelConnectUser { user_id: user(arg, "cancel")? },
        "remove" => ClientEvent::RemoveUser { user_id: user(arg, "remove")? },
        "tab" => match arg {
            Some("matching") => ClientEvent::TabChanged(Tab::Matching),
            Some("other") => ClientEvent::TabChanged(Tab::Other),
            Some(other) => {
                return Err(CommandError::InvalidArgument { command: "tab", value: other.to_string() });
            },
            None => return Err(CommandError::MissingArgument { command: "tab", argument: "tab name" }),
        },
        "logout" => ClientEvent::AuthLost,
        "quit" | "exit" => ClientEvent::Shutdown,
        _ => return Err(CommandError::Unknown(name.to_string())),
    };

    Ok(Some(Command::Event(event)))
}

fn user(arg: Option<&str>, command: &'static str) -> Result<String, CommandError> {
    arg.map(str::to_string).ok_or(CommandError::MissingArgument { command, argument: "user id" })
}
