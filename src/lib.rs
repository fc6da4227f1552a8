/// rule-extract library crate.
///
/// Exposes the extraction core and its I/O glue as a public API so that
/// integration tests in tests/ can import them via `rule_extract::`.
///
/// The binary entry point (src/main.rs) uses these same modules.
pub mod codec;
pub mod conditioner;
pub mod config;
pub mod dataset;
pub mod error;
pub mod extract;
pub mod input;
pub mod learner;
pub mod pipeline;
