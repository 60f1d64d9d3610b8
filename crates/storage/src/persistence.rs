//! File-backed cookie jar
//!
//! Cookies are stored as a versioned JSON document with an md5 checksum of the
//! payload. Every mutation rewrites the file, atomically by default (temp file
//! + rename). A missing file is an empty jar; a corrupt or foreign-version
//! file is discarded with a warning rather than failing the caller.

use chrono::Utc;
use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::cookie::{Cookie, CookieError, CookieJar, Result};

/// Versioned state container
#[derive(Debug, Clone, Serialize, Deserialize)]
struct VersionedState<T> {
    /// Version number
    version: u32,
    /// Checksum for corruption detection
    checksum: String,
    /// The actual state data
    data: T,
}

impl<T: Serialize + DeserializeOwned> VersionedState<T> {
    fn new(version: u32, data: T) -> Result<Self> {
        let checksum = checksum_of(&data)?;
        Ok(Self { version, checksum, data })
    }

    fn verify_checksum(&self) -> Result<()> {
        let computed = checksum_of(&self.data)?;

        if computed != self.checksum {
            return Err(CookieError::Corruption(format!(
                "Checksum mismatch: expected {}, got {}",
                self.checksum, computed
            )));
        }

        Ok(())
    }
}

fn checksum_of<T: Serialize>(data: &T) -> Result<String> {
    let data_json = serde_json::to_string(data)?;
    Ok(format!("{:x}", md5::compute(&data_json)))
}

/// Persistence configuration
#[derive(Debug, Clone)]
pub struct PersistenceConfig {
    /// Path to the cookie file
    pub path: PathBuf,
    /// Current schema version
    pub version: u32,
    /// Enable atomic writes with temp files
    pub atomic_writes: bool,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("cookies.json"),
            version: 1,
            atomic_writes: true,
        }
    }
}

impl PersistenceConfig {
    /// Create a new configuration
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), ..Default::default() }
    }

    /// Set schema version
    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Enable or disable atomic writes
    pub fn atomic_writes(mut self, enabled: bool) -> Self {
        self.atomic_writes = enabled;
        self
    }
}

type CookieMap = BTreeMap<String, Cookie>;

/// Cookie jar persisted to a JSON file
///
/// # Example
///
/// ```rust,no_run
/// use storage::{Cookie, CookieJar, FileCookieJar, PersistenceConfig};
///
/// let jar = FileCookieJar::open(PersistenceConfig::new("cookies.json")).unwrap();
/// jar.set(Cookie::expires_in_days("jwt", "abc", 7)).unwrap();
/// assert_eq!(jar.value("jwt"), Some("abc".to_string()));
/// ```
#[derive(Debug)]
pub struct FileCookieJar {
    config: PersistenceConfig,
    cookies: RwLock<CookieMap>,
}

impl FileCookieJar {
    /// Open the jar at the configured path, loading any live cookies
    pub fn open(config: PersistenceConfig) -> Result<Self> {
        let cookies = match load_from_disk(&config) {
            Ok(cookies) => cookies,
            Err(CookieError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => CookieMap::new(),
            Err(e @ (CookieError::Corruption(_)
            | CookieError::VersionMismatch { .. }
            | CookieError::Serialization(_))) => {
                tracing::warn!(path = %config.path.display(), error = %e, "discarding unreadable cookie file");
                CookieMap::new()
            }
            Err(e) => return Err(e),
        };

        let now = Utc::now();
        let live = cookies
            .into_iter()
            .filter(|(_, cookie)| !cookie.is_expired_at(now))
            .collect();

        Ok(Self {
            config,
            cookies: RwLock::new(live),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Remove every cookie and delete the backing file
    pub fn clear(&self) -> Result<()> {
        let mut cookies = self.cookies.write();

        if self.config.path.exists() {
            fs::remove_file(&self.config.path)?;
        }

        cookies.clear();
        Ok(())
    }

    /// Write the given cookies to disk
    fn write_to_disk(&self, cookies: &CookieMap) -> Result<()> {
        let versioned = VersionedState::new(self.config.version, cookies.clone())?;
        let json = serde_json::to_string_pretty(&versioned)?;

        if self.config.atomic_writes {
            self.write_atomic(&json)
        } else {
            fs::write(&self.config.path, json)?;
            Ok(())
        }
    }

    /// Write atomically using temp file + rename
    fn write_atomic(&self, contents: &str) -> Result<()> {
        let temp_path = self.config.path.with_extension("tmp");

        let mut file = fs::File::create(&temp_path)?;
        file.write_all(contents.as_bytes())?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp_path, &self.config.path)?;

        Ok(())
    }
}

fn load_from_disk(config: &PersistenceConfig) -> Result<CookieMap> {
    let contents = fs::read_to_string(&config.path)?;

    let versioned: VersionedState<CookieMap> = serde_json::from_str(&contents)?;

    versioned.verify_checksum()?;

    if versioned.version != config.version {
        return Err(CookieError::VersionMismatch {
            expected: config.version,
            found: versioned.version,
        });
    }

    Ok(versioned.data)
}

impl CookieJar for FileCookieJar {
    fn set(&self, cookie: Cookie) -> Result<()> {
        let mut cookies = self.cookies.write();
        let now = Utc::now();
        let mut next: CookieMap = cookies
            .iter()
            .filter(|(_, existing)| !existing.is_expired_at(now))
            .map(|(name, existing)| (name.clone(), existing.clone()))
            .collect();
        next.insert(cookie.name.clone(), cookie);

        self.write_to_disk(&next)?;
        *cookies = next;
        Ok(())
    }

    fn get(&self, name: &str) -> Option<Cookie> {
        self.cookies
            .read()
            .get(name)
            .filter(|cookie| !cookie.is_expired())
            .cloned()
    }

    fn remove(&self, name: &str) -> Result<()> {
        let mut cookies = self.cookies.write();
        if !cookies.contains_key(name) {
            return Ok(());
        }

        let mut next = cookies.clone();
        next.remove(name);
        self.write_to_disk(&next)?;
        *cookies = next;
        Ok(())
    }
}
