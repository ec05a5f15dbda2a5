//! Command-line surface shared by the `refillstruct` and `errauto` binaries.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::error::Result;
use crate::loader::{load, LoadConfig, Loaded, Overlay};
use crate::output::{write_json, Output};
use crate::printer::Mode;
use crate::synth::{SynthOptions, Synthesized};

/// Environment variable holding the `tracing` filter directive.
pub const LOG_ENV: &str = "REFTOOLS_LOG";

#[derive(Debug, Parser)]
pub struct Args {
    /// Go source file to edit
    #[arg(long)]
    pub file: PathBuf,

    /// Byte offset of the cursor within the file
    #[arg(long)]
    pub offset: usize,

    /// Read an archive of modified files from standard input
    #[arg(long)]
    pub modified: bool,

    /// Comma-separated build tags
    #[arg(long, value_delimiter = ',')]
    pub tags: Vec<String>,
}

/// Installs a stderr subscriber when `REFTOOLS_LOG` holds a valid filter.
pub fn init_tracing() {
    if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .with_writer(io::stderr)
            .init();
        tracing::debug!("tracing initialized");
    }
}

/// Loads the requested file and runs `synth` on it, returning the JSON-ready result.
pub fn execute(
    args: &Args,
    overlay: Overlay,
    synth: fn(&Loaded, &SynthOptions) -> Result<Synthesized>,
) -> Result<Output> {
    let config = LoadConfig::from_env(args.tags.iter().cloned()).with_overlay(overlay);
    let loaded = load(&config, &args.file, args.offset)?;
    let synthesized = synth(&loaded, &SynthOptions::default())?;
    Ok(Output::from_synthesized(&synthesized, Mode::Gofmt))
}

/// Entry point of a binary: `name` prefixes the diagnostic printed on failure.
pub fn run(name: &str, synth: fn(&Loaded, &SynthOptions) -> Result<Synthesized>) -> ExitCode {
    init_tracing();
    let args = Args::parse();
    match try_run(&args, synth) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(origin = %err.origin(), "failed");
            eprintln!("{name}: {}", err.kind());
            ExitCode::FAILURE
        }
    }
}

fn try_run(args: &Args, synth: fn(&Loaded, &SynthOptions) -> Result<Synthesized>) -> Result<()> {
    let overlay = if args.modified {
        Overlay::read_from(io::stdin().lock())?
    } else {
        Overlay::new()
    };
    let output = execute(args, overlay, synth)?;
    write_json(io::stdout().lock(), &[output])
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn args_are_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn tags_split_on_commas() {
        let args = Args::try_parse_from([
            "refillstruct",
            "--file",
            "a.go",
            "--offset",
            "12",
            "--tags",
            "foo,bar",
        ])
        .unwrap();
        assert_eq!(args.file, PathBuf::from("a.go"));
        assert_eq!(args.offset, 12);
        assert!(!args.modified);
        assert_eq!(args.tags, vec!["foo".to_string(), "bar".to_string()]);
    }

    #[test]
    fn file_and_offset_are_required() {
        assert!(Args::try_parse_from(["errauto", "--offset", "1"]).is_err());
        assert!(Args::try_parse_from(["errauto", "--file", "a.go"]).is_err());
    }
}
