//! Command-line argument parsing for the customgpt CLI.
//!
//! This module turns `std::env::args()` into a [`CliCommand`].

use std::path::PathBuf;

use thiserror::Error;

/// Usage text printed by `--help` and on argument errors.
pub const USAGE: &str = "\
Usage: customgpt <command> [args]

Commands:
  agents [page]                          List agents
  agent <agent_id>                       Show one agent with its stats
  conversations <agent_id>               List conversations of an agent
  chat <agent_id> <session_id> <prompt>  Stream an answer (Ctrl-C cancels)
  upload <agent_id> <file>               Upload a file as a new source
  usage                                  Show plan limits and usage

Options:
  -V, --version                          Print version
  -h, --help                             Print this help

Environment:
  CUSTOMGPT_API_KEY (required), CUSTOMGPT_BASE_URL, CUSTOMGPT_TIMEOUT_MS,
  CUSTOMGPT_RETRY_ATTEMPTS, CUSTOMGPT_RETRY_DELAY_MS, RUST_LOG";

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    Version,
    Help,
    Agents {
        page: Option<u32>,
    },
    Agent {
        agent_id: i64,
    },
    Conversations {
        agent_id: i64,
    },
    Chat {
        agent_id: i64,
        session_id: String,
        prompt: String,
    },
    Upload {
        agent_id: i64,
        path: PathBuf,
    },
    Usage,
}

/// Argument errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArgsError {
    #[error("missing command")]
    MissingCommand,
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("missing argument <{0}>")]
    MissingArgument(&'static str),
    #[error("invalid value for <{name}>: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Parse command-line arguments (including the program name).
///
/// # Examples
///
/// ```
/// use customgpt::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["customgpt".to_string(), "--version".to_string()];
/// assert_eq!(parse_args(args.into_iter()), Ok(CliCommand::Version));
/// ```
pub fn parse_args<I>(args: I) -> Result<CliCommand, ArgsError>
where
    I: Iterator<Item = String>,
{
    // Skip the program name
    let mut args = args.skip(1);

    let Some(command) = args.next() else {
        return Err(ArgsError::MissingCommand);
    };

    match command.as_str() {
        "--version" | "-V" => Ok(CliCommand::Version),
        "--help" | "-h" | "help" => Ok(CliCommand::Help),
        "agents" => {
            let page = args.next().map(|p| parse_num("page", p)).transpose()?;
            Ok(CliCommand::Agents { page })
        }
        "agent" => Ok(CliCommand::Agent {
            agent_id: required_num(&mut args, "agent_id")?,
        }),
        "conversations" => Ok(CliCommand::Conversations {
            agent_id: required_num(&mut args, "agent_id")?,
        }),
        "chat" => {
            let agent_id = required_num(&mut args, "agent_id")?;
            let session_id = args.next().ok_or(ArgsError::MissingArgument("session_id"))?;
            let prompt = args.collect::<Vec<_>>().join(" ");
            if prompt.trim().is_empty() {
                return Err(ArgsError::MissingArgument("prompt"));
            }
            Ok(CliCommand::Chat {
                agent_id,
                session_id,
                prompt,
            })
        }
        "upload" => {
            let agent_id = required_num(&mut args, "agent_id")?;
            let path = args.next().ok_or(ArgsError::MissingArgument("file"))?;
            Ok(CliCommand::Upload {
                agent_id,
                path: PathBuf::from(path),
            })
        }
        "usage" => Ok(CliCommand::Usage),
        other => Err(ArgsError::UnknownCommand(other.to_string())),
    }
}

fn required_num<T, I>(args: &mut I, name: &'static str) -> Result<T, ArgsError>
where
    T: std::str::FromStr,
    I: Iterator<Item = String>,
{
    let value = args.next().ok_or(ArgsError::MissingArgument(name))?;
    parse_num(name, value)
}

fn parse_num<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ArgsError> {
    value
        .parse()
        .map_err(|_| ArgsError::InvalidValue { name, value })
}
