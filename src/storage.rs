//! Tiny persistent key-value store, one JSON object on disk.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const STORAGE_FILE: &str = "storage.json";

#[derive(Debug)]
pub struct KeyValueStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl KeyValueStore {
    /// Open the store at `path`. A missing file is an empty store; a corrupt
    /// one is reported and replaced on the next write.
    pub fn open(path: &Path) -> Self {
        let values = if path.exists() {
            match fs::read_to_string(path) {
                Ok(data) => match serde_json::from_str(&data) {
                    Ok(values) => values,
                    Err(e) => {
                        eprintln!("Warning: corrupt storage file, starting fresh: {}", e);
                        BTreeMap::new()
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read storage file: {}", e);
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };
        KeyValueStore {
            path: path.to_path_buf(),
            values,
        }
    }

    /// Default location inside the user's data directory.
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("day_radio")
            .join(STORAGE_FILE)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Store `value` under `key`. Nothing is written when the value is unchanged.
    pub fn set(&mut self, key: &str, value: String) -> Result<(), String> {
        if self.get(key) == Some(value.as_str()) {
            return Ok(());
        }
        self.values.insert(key.to_string(), value);
        self.flush()
    }

    fn flush(&self) -> Result<(), String> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)
                    .map_err(|e| format!("Cannot create '{}': {}", dir.display(), e))?;
            }
        }
        let json = serde_json::to_string_pretty(&self.values)
            .map_err(|e| format!("Serialize error: {}", e))?;
        fs::write(&self.path, json)
            .map_err(|e| format!("Write error on '{}': {}", self.path.display(), e))
    }
}
