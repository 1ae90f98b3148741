//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Command Groups
//!
//! | Group | Purpose | Examples |
//! |-------|---------|----------|
//! | Core | Project setup | `init` |
//! | Deal | Deals and anchor dates | `deal new`, `deal show`, `deal anchor`, `deal import` |
//! | Milestone | Timeline entries | `milestone set`, `milestone remove` |
//! | Resolve | One-off resolution of an extraction file | `resolve dates.yaml` |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! Without the flag, `default_format` from the global config applies.
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) for debug output:
//! ```bash
//! dealdates --verbose deal show "123 Main St"
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod deal;
mod milestone;
mod output;
mod resolve;
mod timeline;

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat};
