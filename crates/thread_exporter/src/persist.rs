use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("failed to serialize export: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure output directory exists; create if missing.
fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
        return Ok(());
    }
    fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))
}

/// Writes JSON documents into one directory, each through a temp file that
/// is renamed into place so readers never see a half-written export.
pub struct JsonExportWriter {
    dir: PathBuf,
    pretty: bool,
}

impl JsonExportWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            pretty: true,
        }
    }

    pub fn compact(mut self) -> Self {
        self.pretty = false;
        self
    }

    /// Writer for an explicit target file; returns it with the file name.
    pub fn for_file(path: &Path) -> (Self, String) {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "export.json".to_string());
        (Self::new(dir), filename)
    }

    pub fn write<T: Serialize>(&self, filename: &str, value: &T) -> Result<PathBuf, PersistError> {
        let mut body = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        body.push('\n');

        ensure_output_dir(&self.dir)?;
        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(body.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        // persist() does not overwrite on every platform.
        if target.exists() {
            fs::remove_file(&target)?;
        }
        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}
