//! Output sinks for the emission pipeline.
//!
//! The writer never touches the filesystem directly; it goes through an
//! injected [`IndexStore`].

pub mod fs;
pub mod memory;

use serde::Serialize;
use std::path::Path;

use crate::types::Result;
pub use fs::FsStore;
pub use memory::MemoryStore;

/// Where index documents are written. Shared across emission workers.
pub trait IndexStore: Send + Sync {
    fn create_dir_all(&self, path: &Path) -> Result<()>;
    fn write_file(&self, path: &Path, contents: &[u8]) -> Result<()>;
}

/// Serialize `value` as pretty JSON and write it through `store`.
pub fn write_json<S, T>(store: &S, path: &Path, value: &T) -> Result<()>
where
    S: IndexStore + ?Sized,
    T: Serialize + ?Sized,
{
    let json = serde_json::to_vec_pretty(value)?;
    store.write_file(path, &json)
}
