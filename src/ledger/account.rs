use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Settlement account referenced by payments and ledger entries. Account CRUD
/// lives in the surrounding application; the engine only validates references.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
}

impl Account {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }
}
