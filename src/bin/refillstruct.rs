//! Fills the Go struct literal at `--offset` in `--file` and prints the replacement as JSON.

use std::process::ExitCode;

fn main() -> ExitCode {
    reftools::cli::run("refillstruct", reftools::fill_struct)
}
