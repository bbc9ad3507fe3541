use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use crate::errors::{EngineError, Result};
use crate::ledger::Workspace;
use crate::utils::{app_data_dir, ensure_dir};

use super::StorageBackend;

const WORKSPACE_DIR: &str = "workspaces";
const WORKSPACE_EXTENSION: &str = "json";
const TMP_SUFFIX: &str = "tmp";

/// JSON-file persistence rooted at the application data directory.
#[derive(Debug, Clone)]
pub struct JsonStorage {
    workspaces_dir: PathBuf,
}

impl JsonStorage {
    pub fn new(root: Option<PathBuf>) -> Result<Self> {
        let root = root.unwrap_or_else(app_data_dir);
        ensure_dir(&root)?;
        let workspaces_dir = root.join(WORKSPACE_DIR);
        ensure_dir(&workspaces_dir)?;
        Ok(Self { workspaces_dir })
    }

    pub fn new_default() -> Result<Self> {
        Self::new(None)
    }

    pub fn workspace_path(&self, name: &str) -> PathBuf {
        self.workspaces_dir
            .join(format!("{}.{}", canonical_name(name), WORKSPACE_EXTENSION))
    }
}

impl StorageBackend for JsonStorage {
    fn save(&self, workspace: &Workspace, name: &str) -> Result<()> {
        let path = self.workspace_path(name);
        let json = serde_json::to_string_pretty(workspace)?;
        // Write to a sibling temp file and rename so the workspace file is
        // replaced atomically.
        let tmp = tmp_path(&path);
        write_all(&tmp, &json)?;
        fs::rename(&tmp, &path)?;
        tracing::debug!(workspace = %workspace.name, path = %path.display(), "workspace saved");
        Ok(())
    }

    fn load(&self, name: &str) -> Result<Workspace> {
        let path = self.workspace_path(name);
        if !path.exists() {
            return Err(EngineError::Storage(format!(
                "workspace `{}` not found",
                name
            )));
        }
        let data = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&data)?)
    }

    fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.workspaces_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(WORKSPACE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn delete(&self, name: &str) -> Result<()> {
        let path = self.workspace_path(name);
        if !path.exists() {
            return Err(EngineError::Storage(format!(
                "workspace `{}` not found",
                name
            )));
        }
        fs::remove_file(&path)?;
        Ok(())
    }
}

fn canonical_name(name: &str) -> String {
    let mut canonical = String::new();
    let mut last_dash = false;
    for ch in name.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            canonical.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !canonical.is_empty() && !last_dash {
            canonical.push('-');
            last_dash = true;
        }
    }
    canonical.trim_matches('-').to_string()
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_all(path: &Path, data: &str) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_names_are_slugged() {
        assert_eq!(canonical_name("My Family Budget"), "my-family-budget");
        assert_eq!(canonical_name("  Café!! 2026  "), "caf-2026");
    }

    #[test]
    fn tmp_path_keeps_original_extension() {
        let tmp = tmp_path(Path::new("/data/home.json"));
        assert_eq!(tmp, PathBuf::from("/data/home.json.tmp"));
    }
}
