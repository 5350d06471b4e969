//! Administrative commands (`chunkmonitor` / `cm`).
//!
//! | Input                    | Command  |
//! |--------------------------|----------|
//! | *(empty)*, `help`        | `Help`   |
//! | `reload`                 | `Reload` |
//!
//! The root name or alias may prefix the subcommand: `cm reload`.

use crate::config::ConfigProvider;
use crate::error::CommandError;
use std::str::FromStr;

pub const ROOT: &str = "chunkmonitor";
pub const ALIAS: &str = "cm";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminCommand {
    Help,
    Reload,
}

impl FromStr for AdminCommand {
    type Err = CommandError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut words = input.split_whitespace().peekable();
        if words
            .peek()
            .is_some_and(|w| w.eq_ignore_ascii_case(ROOT) || w.eq_ignore_ascii_case(ALIAS))
        {
            words.next();
        }
        match words.next() {
            None => Ok(AdminCommand::Help),
            Some(w) if w.eq_ignore_ascii_case("help") => Ok(AdminCommand::Help),
            Some(w) if w.eq_ignore_ascii_case("reload") => Ok(AdminCommand::Reload),
            Some(other) => Err(CommandError::UnknownSubcommand(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResponse {
    Help(Vec<String>),
    ReloadSucceeded,
    /// Carries the underlying configuration error text.
    ReloadFailed(String),
}

impl CommandResponse {
    pub fn is_success(&self) -> bool {
        !matches!(self, CommandResponse::ReloadFailed(_))
    }
}

impl std::fmt::Display for CommandResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandResponse::Help(lines) => f.write_str(&lines.join("\n")),
            CommandResponse::ReloadSucceeded => f.write_str("configuration reloaded"),
            CommandResponse::ReloadFailed(_) => f.write_str("reload failed: invalid configuration"),
        }
    }
}

pub fn help_lines() -> Vec<String> {
    vec![
        format!("{} (alias: {}) subcommands:", ROOT, ALIAS),
        "  help    – show this list".to_string(),
        "  reload  – re-read the configuration file".to_string(),
    ]
}

pub fn execute(command: AdminCommand, config: &ConfigProvider) -> CommandResponse {
    match command {
        AdminCommand::Help => CommandResponse::Help(help_lines()),
        AdminCommand::Reload => match config.reload() {
            Ok(_) => CommandResponse::ReloadSucceeded,
            Err(e) => CommandResponse::ReloadFailed(e.to_string()),
        },
    }
}
