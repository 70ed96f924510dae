//! CLI module for the customgpt binary.
//!
//! This module provides:
//! - Argument parsing
//! - Client configuration from environment variables
//! - Command execution
//!
//! # Usage
//!
//! ```ignore
//! use customgpt::cli::{config_from_env, parse_args, run_command};
//!
//! let command = parse_args(std::env::args())?;
//! let client = CustomGptClient::new(config_from_env()?);
//! run_command(command, &client).await?;
//! ```

pub mod args;
pub mod commands;
pub mod env;
pub mod version;

pub use args::{parse_args, ArgsError, CliCommand, USAGE};
pub use commands::run_command;
pub use env::{config_from_env, config_from_lookup, EnvConfigError};
pub use version::{version_line, VERSION};
