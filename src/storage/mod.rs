//! # Storage Layer
//!
//! Persistence for dealdates with git-friendly file formats.
//!
//! ## Storage Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Deals (anchors + milestone records) | JSONL (one deal per line) | `.dealdates/deals.jsonl` |
//! | Config | TOML | `.dealdates/config.toml` |
//! | Extraction batches | JSON or YAML | anywhere, read on import |
//!
//! Resolved dates are never persisted; they are recomputed from the
//! milestone records and anchors on every read.
//!
//! ## Concurrency Safety
//!
//! - [`DealStore`] uses file locking (`fs2`) for concurrent access
//! - Full rewrites are atomic (temp file + rename)
//!
//! ## Project Structure
//!
//! ```text
//! .dealdates/
//! ├── deals.jsonl           # All deals in JSONL format
//! ├── config.toml           # Project configuration
//! └── .gitignore            # Ignores interrupted writes
//! ```
//!
//! ## Key Types
//!
//! - [`Project`] - Entry point for accessing a dealdates project
//! - [`DealStore`] - Read/write deals as JSONL
//! - [`Config`] - Project and global configuration

mod config;
mod import;
mod jsonl;
mod project;

pub use config::{Config, ConfigError, GlobalConfig, OutputFormat, ProjectConfig};
pub use import::{parse_batch, read_batch, BatchFormat, ImportError};
pub use jsonl::DealStore;
pub use project::{Project, ProjectError};
