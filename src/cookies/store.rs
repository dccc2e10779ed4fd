//! JSON-backed cookie files.
//!
//! `JsonCookieStore` keeps **one file per host key** in a folder:
//! `<folder>/<host-key>.json`, each holding a JSON array of [`Cookie`] records.
//! A host key is either an exact hostname (`sub.example.com`, `localhost`) or
//! a registrable domain (`example.com`).
//!
//! ### Concurrency
//! - A single mutex per store serializes every `load` and `save`, whatever
//!   the host key.
//! - Processes sharing a folder are not coordinated; the last writer wins.
//!
//! ### I/O characteristics
//! - `save` overwrites the whole file for a key. It writes a sibling
//!   `.json.tmp` file and renames it into place, so a reader never observes a
//!   half-written array.
//! - Nothing is ever deleted.
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::config::JarConfig;
use crate::cookies::Cookie;
use crate::errors::{CookieError, Result};

/// File-per-host-key JSON cookie store.
#[derive(Debug)]
pub struct JsonCookieStore {
    /// Folder where the cookie files live.
    folder: PathBuf,
    file_mode: u32,
    dir_mode: u32,
    /// Guards all file I/O done by this store.
    lock: Mutex<()>,
}

impl JsonCookieStore {
    /// Creates a store for `config.folder`. Nothing is touched on disk yet.
    pub fn new(config: &JarConfig) -> Self {
        Self {
            folder: config.folder.clone(),
            file_mode: config.file_mode,
            dir_mode: config.dir_mode,
            lock: Mutex::new(()),
        }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Path of the file for `host_key`.
    ///
    /// Keys that could address something outside the folder are rejected.
    pub fn path_for(&self, host_key: &str) -> Result<PathBuf> {
        if host_key.is_empty()
            || host_key == "."
            || host_key == ".."
            || host_key.contains(['/', '\\', '\0'])
        {
            return Err(CookieError::InvalidHostKey(host_key.to_string()));
        }
        Ok(self.folder.join(format!("{host_key}.json")))
    }

    /// Creates the folder (recursively) if it does not exist yet.
    pub fn ensure_folder(&self) -> Result<()> {
        if self.folder.is_dir() {
            return Ok(());
        }

        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(self.dir_mode);
        }

        builder.create(&self.folder).map_err(|source| CookieError::CreateFolder {
            path: self.folder.clone(),
            source,
        })
    }

    /// Reads the cookies stored for `host_key`.
    ///
    /// Returns `Ok(None)` if no file exists for the key.
    pub fn try_load(&self, host_key: &str) -> Result<Option<Vec<Cookie>>> {
        let path = self.path_for(host_key)?;
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let contents = match fs::read(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(CookieError::Read { path, source }),
        };

        // an empty file means "no cookies"
        if contents.iter().all(u8::is_ascii_whitespace) {
            return Ok(Some(Vec::new()));
        }

        // `null` is what an empty record list was encoded as by earlier deployments
        let cookies: Option<Vec<Cookie>> =
            serde_json::from_slice(&contents).map_err(|source| CookieError::Decode {
                path: path.clone(),
                source,
            })?;

        Ok(Some(cookies.unwrap_or_default()))
    }

    /// Reads the cookies stored for `host_key`, treating any failure as "no cookies".
    ///
    /// A corrupt or unreadable file is logged and otherwise ignored, so a broken
    /// cache degrades to a fresh cookie state instead of blocking lookups.
    pub fn load(&self, host_key: &str) -> Vec<Cookie> {
        match self.try_load(host_key) {
            Ok(cookies) => cookies.unwrap_or_default(),
            Err(e) => {
                log::warn!("Ignoring cookie file for {host_key}: {e}");
                Vec::new()
            }
        }
    }

    /// Replaces the file for `host_key` with `cookies`.
    ///
    /// The folder must exist; see [`ensure_folder`](Self::ensure_folder).
    pub fn save(&self, host_key: &str, cookies: &[Cookie]) -> Result<()> {
        let path = self.path_for(host_key)?;
        let contents = serde_json::to_vec(cookies).map_err(CookieError::Encode)?;

        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let tmp = path.with_extension("json.tmp");
        let write_err = |source: std::io::Error| CookieError::Write {
            path: path.clone(),
            source,
        };

        let mut file = self.create_file(&tmp).map_err(write_err)?;
        file.write_all(&contents).map_err(write_err)?;
        file.sync_all().map_err(write_err)?;
        drop(file);

        if let Err(source) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(write_err(source));
        }

        log::debug!("Saved {} cookie(s) to {}", cookies.len(), path.display());
        Ok(())
    }

    fn create_file(&self, path: &Path) -> std::io::Result<File> {
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(self.file_mode);
        }

        let file = options.open(path)?;

        // the mode passed to open() is filtered by the umask
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(self.file_mode))?;
        }

        Ok(file)
    }
}
