use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::FacemaskError;

/// Holds redacted images between preview and confirmation.
///
/// Each staged image is a file `<dir>/<token>.jpg`; the token is handed to
/// the participant with the preview and redeemed once on confirmation.
#[derive(Debug, Clone)]
pub struct Staging {
    dir: PathBuf,
}

fn is_valid_token(token: &str) -> bool {
    token.len() == 32 && token.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

impl Staging {
    /// Use `dir` for staged images, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, FacemaskError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Directory holding staged images.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, token: &str) -> Result<PathBuf, FacemaskError> {
        if !is_valid_token(token) {
            return Err(FacemaskError::InvalidToken(token.to_string()));
        }
        Ok(self.dir.join(format!("{token}.jpg")))
    }

    /// Store `jpeg` and return the token that redeems it.
    pub fn stage(&self, jpeg: &[u8]) -> Result<String, FacemaskError> {
        let token = Uuid::new_v4().simple().to_string();
        let path = self.path_for(&token)?;
        fs::write(&path, jpeg)?;
        debug!(%token, bytes = jpeg.len(), "staged redacted image");
        Ok(token)
    }

    /// Read the image staged under `token` without redeeming it.
    pub fn read(&self, token: &str) -> Result<Vec<u8>, FacemaskError> {
        let path = self.path_for(token)?;
        match fs::read(&path) {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(FacemaskError::StagingExpired(token.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Drop the image staged under `token`. Missing files are not an error.
    pub fn discard(&self, token: &str) -> Result<(), FacemaskError> {
        let path = self.path_for(token)?;
        if let Err(e) = fs::remove_file(&path) {
            if e.kind() != ErrorKind::NotFound {
                warn!(%token, error = %e, "failed to remove staged image");
            }
        }
        Ok(())
    }

    /// Remove and return the image staged under `token`.
    pub fn take(&self, token: &str) -> Result<Vec<u8>, FacemaskError> {
        let data = self.read(token)?;
        self.discard(token)?;
        Ok(data)
    }

    /// Delete staged images last modified at least `max_age` ago and return
    /// how many were removed. Files that are not staged images are left alone.
    pub fn purge_older_than(&self, max_age: Duration) -> Result<usize, FacemaskError> {
        let now = SystemTime::now();
        let mut removed = 0;
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            let is_staged = path.extension().is_some_and(|ext| ext == "jpg")
                && path
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .is_some_and(is_valid_token);
            if !is_staged {
                continue;
            }
            let modified = entry.metadata()?.modified()?;
            // Clock skew makes `duration_since` fail for files from the future
            let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
            if age < max_age {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "failed to purge staged image"),
            }
        }
        debug!(removed, max_age_secs = max_age.as_secs(), "purged stale staged images");
        Ok(removed)
    }
}
