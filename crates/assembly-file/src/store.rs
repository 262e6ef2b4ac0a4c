//! JSON file storage for session keys.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind as IoErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use assembly_core::error::{Error, StorageError};
use assembly_core::{Result, SessionKey, SessionStore};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// File name used under the platform data directory.
pub const SESSION_FILE_NAME: &str = "session.json";

fn map_io(path: &Path) -> impl Fn(std::io::Error) -> Error + '_ {
    move |err| {
        StorageError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
        .into()
    }
}

/// On-disk layout of the session file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionFile {
    #[serde(default)]
    values: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

/// Advisory lock on the sibling `.lock` file, released on drop.
struct FileLock {
    file: File,
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

/// Session storage in a single JSON file.
///
/// Every write is a read-modify-write under an exclusive lock on
/// `<file>.lock`, so several processes can share one session file. The file
/// is created with mode `0600` on Unix.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Store the session at `path`. Nothing is touched until the first write.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Store the session in the platform data directory.
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(Self::default_path()?))
    }

    /// `session.json` under the platform data directory for `assembly`.
    pub fn default_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "assembly").ok_or_else(|| StorageError::Io {
            path: "<data dir>".to_string(),
            message: "could not determine the user's data directory".to_string(),
        })?;
        Ok(dirs.data_dir().join(SESSION_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    fn lock(&self, exclusive: bool) -> Result<FileLock> {
        let lock_path = self.lock_path();
        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent).map_err(map_io(parent))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(map_io(&lock_path))?;

        if exclusive {
            file.lock_exclusive().map_err(map_io(&lock_path))?;
        } else {
            file.lock_shared().map_err(map_io(&lock_path))?;
        }
        trace!(exclusive, path = %lock_path.display(), "session file locked");

        Ok(FileLock { file })
    }

    fn read(&self) -> Result<SessionFile> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == IoErrorKind::NotFound => return Ok(SessionFile::default()),
            Err(err) => return Err(map_io(&self.path)(err)),
        };

        if content.trim().is_empty() {
            return Ok(SessionFile::default());
        }

        serde_json::from_str(&content).map_err(|e| {
            StorageError::Corrupt {
                path: self.path.display().to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }

    fn write(&self, mut file: SessionFile) -> Result<()> {
        file.updated_at = Some(Utc::now());
        let json = serde_json::to_string_pretty(&file).map_err(|e| StorageError::Serialization {
            key: SESSION_FILE_NAME.to_string(),
            message: e.to_string(),
        })?;

        let tmp_path = self.path.with_extension("json.tmp");
        let mut tmp = File::create(&tmp_path).map_err(map_io(&tmp_path))?;

        #[cfg(unix)]
        {
            let mut perms = tmp.metadata().map_err(map_io(&tmp_path))?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&tmp_path, perms).map_err(map_io(&tmp_path))?;
        }

        tmp.write_all(json.as_bytes()).map_err(map_io(&tmp_path))?;
        tmp.sync_data().map_err(map_io(&tmp_path))?;
        drop(tmp);

        fs::rename(&tmp_path, &self.path).map_err(map_io(&self.path))?;
        debug!(path = %self.path.display(), keys = file.values.len(), "session file written");
        Ok(())
    }

    fn update(&self, apply: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<()> {
        let _lock = self.lock(true)?;
        let mut file = self.read()?;
        apply(&mut file.values);
        self.write(file)
    }

    /// When the file was last written, if it exists.
    pub fn updated_at(&self) -> Result<Option<DateTime<Utc>>> {
        let _lock = self.lock(false)?;
        Ok(self.read()?.updated_at)
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: SessionKey) -> Result<Option<String>> {
        let _lock = self.lock(false)?;
        Ok(self.read()?.values.remove(key.as_str()))
    }

    #[instrument(skip(self, value), fields(path = %self.path.display()))]
    fn set(&self, key: SessionKey, value: &str) -> Result<()> {
        self.update(|values| {
            values.insert(key.as_str().to_string(), value.to_string());
        })
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn remove(&self, key: SessionKey) -> Result<()> {
        self.update(|values| {
            values.remove(key.as_str());
        })
    }

    /// Delete the session file.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn clear(&self) -> Result<()> {
        let _lock = self.lock(true)?;
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("session file removed");
                Ok(())
            }
            Err(err) if err.kind() == IoErrorKind::NotFound => Ok(()),
            Err(err) => Err(map_io(&self.path)(err)),
        }
    }
}
