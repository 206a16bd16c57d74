use crate::config::types::{ExitCode, SequencerConfig, SequencerMode};
use crate::core::sequencer::Sequencer;
use crate::signal;
use crate::verdict::classify::exit_code_for;
use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Source file to compile and run (the artifact is its name minus the last extension)
    source: PathBuf,

    /// Run every step unconditionally and exit with the delete step's status
    #[arg(long)]
    compat: bool,

    /// Print the run report as one line of JSON instead of the bare status
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn config(&self) -> SequencerConfig {
        SequencerConfig {
            mode: if self.compat {
                SequencerMode::Compat
            } else {
                SequencerMode::Strict
            },
            json: self.json,
            verbosity: self.verbose,
        }
    }
}

pub fn run() -> Result<()> {
    // clap exits with status 2 on usage errors
    let cli = Cli::parse();
    let config = cli.config();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_filter()),
    )
    .init();

    signal::install().context("failed to install signal handlers")?;

    let sequencer = Sequencer::from_config(&config).with_interrupt_latch();
    let result = if config.json {
        sequencer.run(&cli.source, &mut io::sink())
    } else {
        sequencer.run(&cli.source, &mut io::stdout().lock())
    };

    let mut exit_code = exit_code_for(&result);
    if let Some(sig) = signal::pending() {
        exit_code = ExitCode::Interrupted(sig);
    }

    if let Err(e) = &result {
        eprintln!("asmrun: {}", e);
    }

    if config.json {
        let line = match &result {
            Ok(report) => serde_json::to_string(report)?,
            Err(e) => serde_json::json!({
                "error": e.to_string(),
                "exit_code": exit_code.code(),
            })
            .to_string(),
        };
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", line)?;
        stdout.flush()?;
    }

    log::debug!("Exiting with {:?} ({})", exit_code, exit_code.code());
    std::process::exit(exit_code.code());
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_invocation_is_strict() {
        let cli = Cli::try_parse_from(["asmrun", "ret42.s"]).unwrap();
        let config = cli.config();
        assert_eq!(config.mode, SequencerMode::Strict);
        assert!(!config.json);
        assert_eq!(config.log_filter(), "warn");
    }

    #[test]
    fn test_flags_map_onto_config() {
        let cli = Cli::try_parse_from(["asmrun", "--compat", "--json", "-vv", "ret42.s"]).unwrap();
        let config = cli.config();
        assert_eq!(config.mode, SequencerMode::Compat);
        assert!(config.json);
        assert_eq!(config.log_filter(), "debug");
        assert_eq!(cli.source, PathBuf::from("ret42.s"));
    }

    #[test]
    fn test_exactly_one_source_is_required() {
        assert!(Cli::try_parse_from(["asmrun"]).is_err());
        assert!(Cli::try_parse_from(["asmrun", "a.s", "b.s"]).is_err());
    }
}
