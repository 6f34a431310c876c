//! Static indexer for Terraform provider source trees.
//!
//! The pipeline scans every service package under a root directory, recognizes
//! the registration shapes each one declares, and writes a summary document
//! plus one JSON document per resource, data source and ephemeral resource.
//!
//! ```no_run
//! use provider_index::{GoSyntaxProvider, IndexWriter, MemoryStore, ProviderScanner};
//! use std::path::Path;
//!
//! let index = ProviderScanner::new(GoSyntaxProvider::new())
//!     .scan(Path::new("./internal/services"), "github.com/org/provider", "v1.0.0")?;
//!
//! let store = MemoryStore::new();
//! IndexWriter::new(&store).write(&index, Path::new("index"))?;
//! # Ok::<(), provider_index::IndexError>(())
//! ```

pub mod analyzers;
pub mod cli;
pub mod cli_types;
pub mod config;
pub mod output;
pub mod parser;
pub mod progress;
pub mod scanner;
pub mod storage;
pub mod types;
pub mod ui;

// Re-export commonly used types
pub use analyzers::{CrudResolver, TypeResolver};
pub use crate::config::IndexConfig;
pub use output::{IndexWriter, OutputLayout};
pub use parser::{GoSyntaxProvider, PackageDir, PackageSource, SourceUnit, SyntaxProvider};
pub use progress::{ProgressCallback, ProgressInfo, ProgressPhase, ProgressTracker};
pub use scanner::{discover_packages, ProviderScanner};
pub use storage::{FsStore, IndexStore, MemoryStore};
pub use types::*;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
