// src/store/mod.rs

pub mod books;
pub mod members;

use std::fs;
use std::path::Path;

use crate::error::AppError;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Loads a JSON array document, creating it with an empty sequence first
/// if it does not exist yet.
pub(crate) fn load_or_init<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, AppError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    if !path.exists() {
        fs::write(path, "[]")?;
    }
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Rewrites the whole document. Pretty-printed so the files stay
/// human-inspectable.
pub(crate) fn persist<T: Serialize>(path: &Path, records: &[T]) -> Result<(), AppError> {
    let json = serde_json::to_vec_pretty(records)?;
    fs::write(path, json)?;
    Ok(())
}
