// src/cli.rs

//! CLI argument parsing using `clap`, plus turning the free-text command
//! into a [`CommandSpec`].

use std::path::PathBuf;

use clap::{CommandFactory, Parser, ValueEnum};

use crate::config::{CommandSpec, Overrides};

/// Command-line arguments for `eye`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "eye",
    version,
    about = "Re-run a command whenever watched files change.",
    long_about = None,
    after_help = "Examples:\n  \
        $ eye app.js\n  \
        $ eye build.js -w src/\n  \
        $ eye python module.py -i '*.pyc'\n  \
        $ eye 'g++ main.cpp && ./a.out'\n\n\
        Run eye without arguments to execute the npm start script."
)]
pub struct CliArgs {
    /// Files/directories to be watched [default: current directory].
    #[arg(short, long, value_name = "PATH")]
    pub watch: Vec<String>,

    /// Files/directories/globs to be ignored [default: from .gitignore].
    #[arg(short, long, value_name = "PATTERN")]
    pub ignore: Vec<String>,

    /// Don't execute the command on startup.
    #[arg(short, long)]
    pub lazy: bool,

    /// Debounce delay in ms between command executions [default: 10].
    ///
    /// Kept as text so that invalid values are reported as configuration
    /// errors.
    #[arg(short, long, value_name = "MS", allow_hyphen_values = true)]
    pub delay: Option<String>,

    /// Print only command output.
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to a config file (TOML) [default: eye.toml if present].
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `EYE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// The command to run, with its arguments.
    #[arg(trailing_var_arg = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

impl CliArgs {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            watch: self.watch.clone(),
            ignore: self.ignore.clone(),
            lazy: self.lazy,
            delay: self.delay.clone(),
            quiet: self.quiet,
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

/// Exit status after printing usage because there is nothing to run.
pub const USAGE_EXIT_CODE: i32 = 2;

/// Print the usage text to stdout.
pub fn print_help() {
    let _ = CliArgs::command().print_help();
    println!();
}

const SHELL_OPERATORS: &[&str] = &["&&", "||", "|", ";", ">", "<", "$(", "`"];

/// Turn the free-text command words into a [`CommandSpec`].
///
/// - No words (or only blanks): `None`.
/// - A single word containing whitespace or shell syntax, as in
///   `eye 'g++ main.cpp && ./a.out'`: run through the platform shell.
/// - Otherwise: first word is the program, the rest are its arguments.
pub fn parse_command(words: &[String]) -> Option<CommandSpec> {
    let words: Vec<&String> = words.iter().filter(|w| !w.trim().is_empty()).collect();
    let (first, rest) = words.split_first()?;

    if rest.is_empty() && needs_shell(first) {
        return Some(CommandSpec::shell(first.trim()));
    }

    Some(CommandSpec::new(
        first.as_str(),
        rest.iter().map(|s| s.as_str()),
    ))
}

fn needs_shell(line: &str) -> bool {
    let line = line.trim();
    line.contains(char::is_whitespace) || SHELL_OPERATORS.iter().any(|op| line.contains(op))
}
