use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use hunter_logging::hunter_debug;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("invalid bundle name: {0:?}")]
    InvalidName(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure the output directory exists and accepts new files.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    }
    NamedTempFile::new_in(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    Ok(())
}

/// Saves downloaded bundle archives as `{dir}/{job_id}.zip`.
///
/// Bytes go to a temp file in the same directory which is then renamed over
/// the target, so a reader never sees a half-written archive.
#[derive(Debug, Clone)]
pub struct BundleWriter {
    dir: PathBuf,
}

impl BundleWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write(&self, job_id: &str, bytes: &[u8]) -> Result<PathBuf, PersistError> {
        let file_name = bundle_file_name(job_id)?;
        ensure_output_dir(&self.dir)?;

        let target = self.dir.join(file_name);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(bytes)?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        if target.exists() {
            fs::remove_file(&target)?;
        }
        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        hunter_debug!("saved {} bytes to {}", bytes.len(), target.display());
        Ok(target)
    }
}

/// Job ids come from the service; refuse anything that could escape `dir`.
fn bundle_file_name(job_id: &str) -> Result<String, PersistError> {
    let usable = !job_id.is_empty()
        && job_id != "."
        && job_id != ".."
        && !job_id.contains(['/', '\\', '\0']);
    if usable {
        Ok(format!("{job_id}.zip"))
    } else {
        Err(PersistError::InvalidName(job_id.to_string()))
    }
}
