//! Prints an error-check guard for the Go function around `--offset` in `--file` as JSON.

use std::process::ExitCode;

fn main() -> ExitCode {
    reftools::cli::run("errauto", reftools::error_check)
}
