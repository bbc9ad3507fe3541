use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Categorises ledger activity for reporting. CRUD lives in the surrounding
/// application; the engine validates references and groups charge totals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }
}
