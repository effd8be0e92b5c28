//! Command-line interface

use clap::{Parser, Subcommand};
use rustyline::DefaultEditor;
use std::path::PathBuf;

/// Volume Raiser - normalize per-application volume to the master volume
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Exit without waiting for Enter
    #[arg(long, global = true)]
    pub no_pause: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Set every windowed application's session to the master volume
    Normalize {
        /// Mute the sessions instead
        #[arg(long)]
        mute: bool,
    },

    /// Set every audio session to a fixed level
    Reset {
        /// Target level between 0.0 and 1.0 (defaults to the configured reset_level)
        #[arg(long)]
        level: Option<f32>,
    },

    /// List audio sessions on the default output device
    List {
        #[arg(long)]
        json: bool,
    },

    /// List all audio endpoints
    Devices {
        #[arg(long)]
        json: bool,
    },

    /// Set the session volume of one process
    Set { pid: u32, level: f32 },

    /// Mute the session of one process
    Mute { pid: u32 },

    /// Unmute the session of one process
    Unmute { pid: u32 },
}

impl Command {
    /// Commands that end by waiting for Enter
    pub fn is_interactive(&self) -> bool {
        matches!(self, Command::Normalize { .. } | Command::Reset { .. })
    }
}

/// Block until the user presses Enter (or closes stdin)
pub fn pause(prompt: &str) -> anyhow::Result<()> {
    let mut rl = DefaultEditor::new()?;
    // EOF and Ctrl+C both end the wait
    let _ = rl.readline(prompt);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_arguments_means_default_run() {
        let args = Args::try_parse_from(["volume-raiser"]).unwrap();
        assert_eq!(args.command, None);
        assert!(!args.no_pause);
    }

    #[test]
    fn test_subcommands_parse() {
        let args = Args::try_parse_from(["volume-raiser", "set", "100", "0.5", "--no-pause"]).unwrap();
        assert_eq!(args.command, Some(Command::Set { pid: 100, level: 0.5 }));
        assert!(args.no_pause);

        let args = Args::try_parse_from(["volume-raiser", "normalize", "--mute"]).unwrap();
        assert_eq!(args.command, Some(Command::Normalize { mute: true }));
        assert!(args.command.unwrap().is_interactive());

        let args = Args::try_parse_from(["volume-raiser", "list", "--json"]).unwrap();
        assert!(!args.command.unwrap().is_interactive());
    }

    #[test]
    fn test_pid_must_be_numeric() {
        assert!(Args::try_parse_from(["volume-raiser", "mute", "spotify"]).is_err());
    }
}
