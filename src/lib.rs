#![warn(clippy::pedantic)]
// Noisy doc/signature lints: would require annotating every pub function
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
// Style preference: keeping format!("{}", x) over format!("{x}") for readability with complex exprs
#![allow(clippy::uninlined_format_args)]
// Timestamps are i64 millis, sizes and counts usize/u64
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod errors;
pub mod loader;
pub mod message;
pub mod personal;
pub mod selection;
pub mod settings;
pub mod sources;
pub mod state;
pub mod storage;
pub(crate) mod utils;

/// Re-exports for fuzz targets. Not part of the public API.
#[doc(hidden)]
pub mod fuzz_api {
    pub use crate::message::parse_message_document;
    pub use crate::utils::sanitize::sanitize_input;
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
