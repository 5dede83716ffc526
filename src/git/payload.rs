use std::io::{self, Write};
use std::path::Path;
use tempfile::{Builder, TempPath};

const PAYLOAD_PREFIX: &str = "safegit-";
const PAYLOAD_SUFFIX: &str = ".txt";

/// A multi-line payload handed to a subprocess by file reference.
///
/// Commit messages and PR bodies never travel as command-line arguments.
/// The file gets a random name in the host temp directory, is readable only
/// by the current user, and is removed when the handle is dropped, whatever
/// path the owning operation took to get there.
#[derive(Debug)]
pub struct TempPayload {
    path: TempPath,
}

impl TempPayload {
    /// Write `payload` verbatim to a fresh temporary file
    pub fn create(payload: &str) -> io::Result<Self> {
        Self::create_in(&std::env::temp_dir(), payload)
    }

    /// Like [`TempPayload::create`] but inside `dir`
    pub fn create_in(dir: &Path, payload: &str) -> io::Result<Self> {
        let mut file = Builder::new()
            .prefix(PAYLOAD_PREFIX)
            .suffix(PAYLOAD_SUFFIX)
            .tempfile_in(dir)?;

        file.write_all(payload.as_bytes())?;
        file.flush()?;

        // Close our handle so the child can open the file on every platform.
        Ok(Self {
            path: file.into_temp_path(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The path as an argument value
    pub fn arg(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }

    /// Delete the file now. Failure is ignored: the payload is no longer
    /// needed and nothing downstream depends on its removal.
    pub fn close(self) {
        let _ = self.path.close();
    }
}

/// Build a commit message with the configured prefix
pub fn prefixed_message(prefix: &str, message: &str) -> String {
    format!("{}{}", prefix, message)
}
