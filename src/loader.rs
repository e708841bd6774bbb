//! Materializes a submitted action into the canonical on-disk layout.

use std::fs;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};

use base64::Engine;
use serde::Deserialize;

use crate::error::ActivationError;

/// The canonical entry source file every action must provide.
pub const ENTRY_SOURCE_FILENAME: &str = "index.lua";

fn default_entry_point() -> String {
    "main".to_string()
}

/// Decoded `/init` payload (the request body's `value` field).
///
/// Every field is optional on the wire; the defaults match the protocol:
/// empty name, entry point `main`, no code, inline (non-archive) source.
#[derive(Debug, Clone, Deserialize)]
pub struct InitPayload {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "main", default = "default_entry_point")]
    pub entry_point: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub binary: bool,
}

impl Default for InitPayload {
    fn default() -> Self {
        Self {
            name: String::new(),
            entry_point: default_entry_point(),
            code: None,
            binary: false,
        }
    }
}

/// Fixed filesystem layout of the bound action.
#[derive(Debug, Clone)]
pub struct ActionLayout {
    /// Directory the action source lives in (archives extract here).
    pub src_dir: PathBuf,
    /// Canonical entry source file, `src_dir/index.lua`.
    pub entry_file: PathBuf,
    /// Persisted action metadata record.
    pub config_file: PathBuf,
}

impl ActionLayout {
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let src_dir = root.join("src");
        Self {
            entry_file: src_dir.join(ENTRY_SOURCE_FILENAME),
            src_dir,
            config_file: root.join("config.json"),
        }
    }
}

/// Write the submitted source into the layout.
///
/// An absent (or empty) `code` field leaves any previously loaded source
/// untouched; metadata persistence is the caller's job and happens either
/// way.
pub fn materialize(layout: &ActionLayout, payload: &InitPayload) -> Result<(), ActivationError> {
    fs::create_dir_all(&layout.src_dir)?;

    let code = match payload.code.as_deref() {
        Some(code) if !code.is_empty() => code,
        _ => return Ok(()),
    };

    if payload.binary {
        extract_archive(layout, code)?;
        if !layout.entry_file.exists() {
            return Err(ActivationError::Archive(format!(
                "could not find {ENTRY_SOURCE_FILENAME} in archive"
            )));
        }
    } else {
        fs::write(&layout.entry_file, code)?;
    }

    Ok(())
}

/// Decode a base64 zip archive and extract it into the source directory.
fn extract_archive(layout: &ActionLayout, code: &str) -> Result<(), ActivationError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(code)
        .map_err(|e| ActivationError::Archive(format!("invalid base64: {e}")))?;

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ActivationError::Archive(format!("failed to open zip: {e}")))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| ActivationError::Archive(format!("failed to read zip entry: {e}")))?;

        let Some(relative) = entry.enclosed_name() else {
            return Err(ActivationError::Archive(format!(
                "invalid zip entry name: {}",
                entry.name()
            )));
        };
        let dest = layout.src_dir.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&dest)?;
        } else {
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut out = fs::File::create(&dest)?;
            io::copy(&mut entry, &mut out)?;
        }
    }

    Ok(())
}
