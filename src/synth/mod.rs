//! Type-directed synthesis: struct literal fills and error-check guards.

mod donor;
mod errcheck;
mod fill;
mod zero;

pub use donor::{resolve_donors, Donors};
pub use errcheck::error_check;
pub use fill::fill_struct;
pub use zero::{basic_zero, zero_value, ZeroPolicy};

use crate::fragment::Fragment;

/// Knobs shared by both synthesis modes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthOptions {
    /// Struct fields starting with this prefix are never filled.
    pub reserved_prefix: String,
    pub err_var: String,
    pub errorf: String,
    /// Call name used when no preceding call is found.
    pub fallback_call: String,
    /// Error message; `{func}` and `{call}` are substituted.
    pub message: String,
}

impl Default for SynthOptions {
    fn default() -> Self {
        SynthOptions {
            reserved_prefix: "XXX_".to_string(),
            err_var: "err".to_string(),
            errorf: "fmt.Errorf".to_string(),
            fallback_call: "func".to_string(),
            message: "{func}: {call} failed, %w".to_string(),
        }
    }
}

/// A fragment and the byte range of the edited file it replaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Synthesized {
    pub start: usize,
    pub end: usize,
    pub fragment: Fragment,
}
