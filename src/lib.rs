//! Type-directed code synthesis for Go editor tooling.
//!
//! - `refillstruct`: fills the struct literal under the cursor with a value for every
//!   field, reusing values already written and fields of in-scope variables.
//! - `errauto`: writes an `if err != nil { return ... }` guard for the enclosing function.
//!
//! Source is parsed by [`reftools_syntax`], checked into a [`Program`] by [`check`], and
//! loaded from disk or an in-memory overlay by [`loader`].

pub mod check;
pub mod cli;
pub mod error;
pub mod fragment;
pub mod loader;
pub mod output;
pub mod printer;
pub mod program;
pub mod synth;
pub mod types;
pub mod typestr;

pub use error::{Error, ErrorClass, ErrorKind, Result};
pub use loader::{load, LoadConfig, LoadError, Loaded, Overlay};
pub use output::Output;
pub use printer::Mode;
pub use program::Program;
pub use synth::{error_check, fill_struct, SynthOptions, Synthesized};
