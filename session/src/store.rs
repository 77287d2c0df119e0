//! Persisted token storage

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, RwLock};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::warn;

/// Entry holding the bearer token
pub const TOKEN_KEY: &str = "token";

/// Entry holding the email of a signup waiting for OTP verification
pub const PENDING_EMAIL_KEY: &str = "user-email";

#[derive(Debug, Error)]
pub enum Error {
    #[error("Cannot access token store at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Token store at {path} is corrupted")]
    Corrupted {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Cannot serialize token store")]
    Serialize(#[from] toml::ser::Error),
}

/// Key-value store of named string entries
///
/// This is the single source of truth for the session. Reads are infallible by contract: an entry
/// which cannot be read is reported as missing.
pub trait TokenStore: Send + Sync {
    /// Reads an entry
    fn get(&self, key: &str) -> Option<String>;

    /// Creates or replaces an entry
    fn set(&self, key: &str, value: &str) -> Result<(), Error>;

    /// Removes an entry, removing a missing entry is not an error
    fn remove(&self, key: &str) -> Result<(), Error>;
}

/// Process local store, gone with the process
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        self.entries
            .write()
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Error> {
        self.entries.write().remove(key);
        Ok(())
    }
}

/// Store kept in a TOML file
///
/// The file is read on every access, so a token replaced by another process (eg. second CLI
/// instance logging in) is picked up immediately. Missing file is an empty store. The file is
/// replaced atomically on every write; a corrupted file is overwritten by the next write.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within the process
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn load(&self) -> Result<BTreeMap<String, String>, Error> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(Error::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        toml::from_str(&content).map_err(|source| Error::Corrupted {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), Error> {
        let io_err = |source| Error::Io {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent).map_err(io_err)?;
                parent
            }
            None => Path::new("."),
        };

        let content = toml::to_string(entries)?;

        // Temp file in the target directory, so the rename never crosses filesystems
        let mut file = NamedTempFile::new_in(dir).map_err(io_err)?;
        file.write_all(content.as_bytes()).map_err(io_err)?;
        file.persist(&self.path).map_err(|err| io_err(err.error))?;
        Ok(())
    }

    fn update(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<(), Error> {
        let _guard = self.write_lock.lock();
        let mut entries = match self.load() {
            Ok(entries) => entries,
            Err(err @ Error::Corrupted { .. }) => {
                warn!(error = %err, "Overwriting corrupted token store");
                BTreeMap::new()
            }
            Err(err) => return Err(err),
        };
        f(&mut entries);
        self.save(&entries)
    }
}

impl TokenStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        match self.load() {
            Ok(mut entries) => entries.remove(key),
            Err(err) => {
                warn!(error = %err, key, "Cannot read token store entry");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        self.update(|entries| {
            entries.insert(key.to_owned(), value.to_owned());
        })
    }

    fn remove(&self, key: &str) -> Result<(), Error> {
        self.update(|entries| {
            entries.remove(key);
        })
    }
}
