//! CLI entry and dispatch.

use std::path::PathBuf;

use anyhow::{Context, Result};
use blinkctl_core::config::{self, Config};
use clap::Parser;

mod commands;

#[derive(Parser)]
#[command(name = "blinkctl")]
#[command(version)]
#[command(about = "Control and monitor a blinking-LED device over named pipes")]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Named pipe the device writes status bytes to
    #[arg(value_name = "INPUT_PIPE")]
    input_pipe: Option<PathBuf>,

    /// Named pipe the device reads commands from
    #[arg(value_name = "OUTPUT_PIPE")]
    output_pipe: Option<PathBuf>,

    #[command(flatten)]
    overrides: Overrides,
}

/// Options that override values from the config file.
#[derive(clap::Args, Debug, Clone, Default)]
struct Overrides {
    /// Config file to load (default: ${BLINKCTL_HOME}/config.toml)
    #[arg(long, env = "BLINKCTL_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Upper bound on each blocking read, in milliseconds
    #[arg(long, value_name = "MS")]
    poll_timeout_ms: Option<u64>,

    /// Aggregation window for the blink period, in seconds
    #[arg(long, value_name = "SECS")]
    window_secs: Option<u64>,

    /// Log file (default: ${BLINKCTL_HOME}/blinkctl.log)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let Cli {
        command,
        input_pipe,
        output_pipe,
        overrides,
    } = cli;

    match command {
        Some(Commands::Config { command }) => {
            let path = overrides.config.unwrap_or_else(config::paths::config_path);
            match command {
                ConfigCommands::Path => {
                    commands::config::path(&path);
                    Ok(())
                }
                ConfigCommands::Init => commands::config::init(&path),
            }
        }
        None => {
            let config = resolve_config(&overrides, input_pipe, output_pipe)?;
            commands::run::run(&config)
        }
    }
}

fn resolve_config(
    overrides: &Overrides,
    input_pipe: Option<PathBuf>,
    output_pipe: Option<PathBuf>,
) -> Result<Config> {
    let mut config = match &overrides.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("load config")?;

    if let Some(path) = input_pipe {
        config.input_pipe = path;
    }
    if let Some(path) = output_pipe {
        config.output_pipe = path;
    }
    if let Some(ms) = overrides.poll_timeout_ms {
        config.poll_timeout_ms = ms;
    }
    if let Some(secs) = overrides.window_secs {
        config.window_secs = secs;
    }
    if let Some(path) = &overrides.log_file {
        config.log_file = Some(path.clone());
    }

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_cli_overrides_config_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "window_secs = 9\npoll_timeout_ms = 50\n").unwrap();

        let overrides = Overrides {
            config: Some(config_path),
            poll_timeout_ms: Some(20),
            ..Overrides::default()
        };
        let config =
            resolve_config(&overrides, Some(PathBuf::from("/tmp/dev.out")), None).unwrap();

        assert_eq!(config.window_secs, 9);
        assert_eq!(config.poll_timeout_ms, 20);
        assert_eq!(config.input_pipe, PathBuf::from("/tmp/dev.out"));
        assert_eq!(config.output_pipe, PathBuf::from("/tmp/prga-hw08.in"));
    }

    #[test]
    fn test_invalid_override_rejected() {
        let dir = tempdir().unwrap();
        let overrides = Overrides {
            config: Some(dir.path().join("missing.toml")),
            window_secs: Some(0),
            ..Overrides::default()
        };
        assert!(resolve_config(&overrides, None, None).is_err());
    }

    #[test]
    fn test_positional_pipes_parse() {
        let cli = Cli::try_parse_from(["blinkctl", "/tmp/a", "/tmp/b"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.input_pipe, Some(PathBuf::from("/tmp/a")));
        assert_eq!(cli.output_pipe, Some(PathBuf::from("/tmp/b")));
    }

    #[test]
    fn test_config_subcommand_parses() {
        let cli = Cli::try_parse_from(["blinkctl", "config", "path"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                command: ConfigCommands::Path
            })
        ));
    }
}
