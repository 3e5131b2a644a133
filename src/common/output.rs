//! Per-run output folder
//!
//! One folder per run under `./output/<timestamp>/` collects screenshots and
//! the run log. It is removed at the end of a green run unless `debug` is set.

use std::path::{Path, PathBuf};

use super::logging::LogGuard;
use super::{Error, Result};

/// Timestamp format for folder and screenshot names
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Output folder owned by a single run
#[derive(Debug)]
pub struct OutputDir {
    path: PathBuf,
    debug: bool,
    log: Option<LogGuard>,
}

impl OutputDir {
    /// Create `<root>/<UTC timestamp>`, adding a numeric suffix if a run
    /// started within the same second
    pub fn create(root: &Path, debug: bool) -> Result<Self> {
        let stamp = chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string();
        std::fs::create_dir_all(root)?;

        let mut path = root.join(&stamp);
        let mut attempt = 1;
        loop {
            match std::fs::create_dir(&path) {
                Ok(()) => break,
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && attempt < 100 => {
                    path = root.join(format!("{}_{}", stamp, attempt));
                    attempt += 1;
                }
                Err(e) => {
                    return Err(Error::FileWrite {
                        path: path.clone(),
                        error: e,
                    })
                }
            }
        }

        tracing::debug!(path = %path.display(), "Created output folder");
        Ok(Self {
            path,
            debug,
            log: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Hand over the run log writer so it is flushed before the folder is
    /// closed out
    pub fn attach_log(&mut self, guard: LogGuard) {
        self.log = Some(guard);
    }

    /// Close out the run. The folder is deleted only when the run passed and
    /// debug mode is off; returns the path if it was kept.
    pub fn finish(mut self, passed: bool) -> Result<Option<PathBuf>> {
        drop(self.log.take());

        if passed && !self.debug {
            std::fs::remove_dir_all(&self.path)?;
            tracing::debug!(path = %self.path.display(), "Removed output folder");
            Ok(None)
        } else {
            Ok(Some(self.path))
        }
    }
}
