pub mod json_backend;

use crate::errors::Result;
use crate::ledger::Workspace;

/// Abstraction over persistence backends capable of storing workspaces.
///
/// A workspace is saved wholesale: services stage their mutations in memory
/// and the aggregate is written as one unit, so a failed save never leaves a
/// partially applied workspace on disk.
pub trait StorageBackend: Send + Sync {
    fn save(&self, workspace: &Workspace, name: &str) -> Result<()>;
    fn load(&self, name: &str) -> Result<Workspace>;
    fn list(&self) -> Result<Vec<String>>;
    fn delete(&self, name: &str) -> Result<()>;
}

pub use json_backend::JsonStorage;
