//! Atomic TOML file operations.
//!
//! Writers go through a temp file, fsync and rename, so a crash never leaves a
//! half-written file behind. Writes and removals take an exclusive lock, so
//! concurrent processes never share the temp file.

use serde::{Serialize, de::DeserializeOwned};
use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use vitae_core::error::VitaeError;

/// Errors that can occur during atomic TOML operations.
#[derive(Debug)]
pub enum AtomicTomlError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Serialize(toml::ser::Error),
    Lock(String),
}

impl std::fmt::Display for AtomicTomlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AtomicTomlError::Io(e) => write!(f, "I/O error: {}", e),
            AtomicTomlError::Parse(e) => write!(f, "TOML parse error: {}", e),
            AtomicTomlError::Serialize(e) => write!(f, "TOML serialization error: {}", e),
            AtomicTomlError::Lock(e) => write!(f, "Lock error: {}", e),
        }
    }
}

impl std::error::Error for AtomicTomlError {}

impl From<std::io::Error> for AtomicTomlError {
    fn from(e: std::io::Error) -> Self {
        AtomicTomlError::Io(e)
    }
}

impl From<toml::de::Error> for AtomicTomlError {
    fn from(e: toml::de::Error) -> Self {
        AtomicTomlError::Parse(e)
    }
}

impl From<toml::ser::Error> for AtomicTomlError {
    fn from(e: toml::ser::Error) -> Self {
        AtomicTomlError::Serialize(e)
    }
}

impl From<AtomicTomlError> for VitaeError {
    fn from(err: AtomicTomlError) -> Self {
        match err {
            AtomicTomlError::Io(e) => e.into(),
            AtomicTomlError::Parse(e) => e.into(),
            AtomicTomlError::Serialize(e) => e.into(),
            AtomicTomlError::Lock(message) => VitaeError::io(message),
        }
    }
}

/// A handle to a TOML file that is only ever replaced atomically.
#[derive(Debug, Clone)]
pub struct AtomicTomlFile<T> {
    path: PathBuf,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> AtomicTomlFile<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _phantom: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the file. A missing or blank file yields `Ok(None)`.
    pub fn load(&self) -> Result<Option<T>, AtomicTomlError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(toml::from_str(&content)?))
    }

    /// Writes `data` through a temp file and an atomic rename, under the
    /// file's exclusive lock.
    pub fn save(&self, data: &T) -> Result<(), AtomicTomlError> {
        let _lock = FileLock::acquire(&self.path)?;
        let toml_string = toml::to_string_pretty(data)?;

        let tmp_path = self.temp_path()?;
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(toml_string.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        restrict_permissions(&tmp_path)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Deletes the file. Removing a missing file is not an error.
    pub fn remove(&self) -> Result<(), AtomicTomlError> {
        let _lock = FileLock::acquire(&self.path)?;
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn temp_path(&self) -> Result<PathBuf, AtomicTomlError> {
        let invalid = |msg: &str| {
            AtomicTomlError::Io(std::io::Error::new(std::io::ErrorKind::InvalidInput, msg.to_string()))
        };
        let parent = self.path.parent().ok_or_else(|| invalid("path has no parent directory"))?;
        let file_name = self.path.file_name().ok_or_else(|| invalid("path has no file name"))?;
        Ok(parent.join(format!(".{}.tmp", file_name.to_string_lossy())))
    }
}

/// Session files hold bearer tokens; keep them user-readable only.
#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

/// Exclusive lock guard; released and removed on drop.
struct FileLock {
    _file: File,
    lock_path: PathBuf,
}

impl FileLock {
    fn acquire(path: &Path) -> Result<Self, AtomicTomlError> {
        let lock_path = path.with_extension("lock");
        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        use fs2::FileExt;
        file.lock_exclusive()
            .map_err(|e| AtomicTomlError::Lock(format!("Failed to acquire lock: {}", e)))?;

        Ok(FileLock {
            _file: file,
            lock_path,
        })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}
