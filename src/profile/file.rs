//! # File Profile Store
//!
//! Profiles kept in one JSON document. Every write replaces the document
//! atomically:
//! 1. Write to a temp file
//! 2. fsync the temp file
//! 3. Rename over the final path

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::errors::{ProfileError, ProfileResult};
use super::store::{Profile, ProfileStore};
use crate::auth::UserId;

#[derive(Debug, Default, Serialize, Deserialize)]
struct ProfileDocument {
    #[serde(default)]
    profiles: BTreeMap<UserId, Profile>,
}

/// JSON-file backed profile store
#[derive(Debug)]
pub struct FileProfileStore {
    path: PathBuf,
    temp_path: PathBuf,
}

impl FileProfileStore {
    /// Open the store at `path`. The file must exist.
    pub fn open(path: &Path) -> ProfileResult<Self> {
        if !path.exists() {
            return Err(ProfileError::Unavailable(format!(
                "profile store not found: {}",
                path.display()
            )));
        }
        Ok(Self::at(path))
    }

    /// Create an empty store at `path`. Fails if it already exists.
    pub fn create(path: &Path) -> ProfileResult<Self> {
        if path.exists() {
            return Err(ProfileError::Unavailable(format!(
                "profile store already exists: {}",
                path.display()
            )));
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    ProfileError::Unavailable(format!("failed to create directory: {}", e))
                })?;
            }
        }

        let store = Self::at(path);
        store.save(&ProfileDocument::default())?;
        Ok(store)
    }

    fn at(path: &Path) -> Self {
        let mut temp = path.as_os_str().to_owned();
        temp.push(".tmp");
        Self {
            path: path.to_path_buf(),
            temp_path: PathBuf::from(temp),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Profile for `user_id`, if present
    pub fn profile(&self, user_id: UserId) -> ProfileResult<Option<Profile>> {
        Ok(self.load()?.profiles.remove(&user_id))
    }

    /// Insert `profile` unless one with the same ID exists.
    ///
    /// Returns true if it was inserted.
    pub fn ensure_profile(&mut self, profile: Profile) -> ProfileResult<bool> {
        let mut document = self.load()?;
        if document.profiles.contains_key(&profile.id) {
            return Ok(false);
        }
        document.profiles.insert(profile.id, profile);
        self.save(&document)?;
        Ok(true)
    }

    fn load(&self) -> ProfileResult<ProfileDocument> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            ProfileError::Unavailable(format!("failed to read {}: {}", self.path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| ProfileError::Corrupt(e.to_string()))
    }

    fn save(&self, document: &ProfileDocument) -> ProfileResult<()> {
        let content = serde_json::to_string_pretty(document)
            .map_err(|e| ProfileError::Corrupt(format!("failed to serialize: {}", e)))?;

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.temp_path)
            .map_err(|e| ProfileError::Unavailable(format!("failed to create temp file: {}", e)))?;

        file.write_all(content.as_bytes())
            .map_err(|e| ProfileError::Unavailable(format!("failed to write: {}", e)))?;
        file.sync_all()
            .map_err(|e| ProfileError::Unavailable(format!("failed to fsync: {}", e)))?;

        fs::rename(&self.temp_path, &self.path)
            .map_err(|e| ProfileError::Unavailable(format!("failed to commit: {}", e)))?;

        if let Some(parent) = self.path.parent() {
            if let Ok(dir) = File::open(parent) {
                let _ = dir.sync_all();
            }
        }

        Ok(())
    }
}

impl ProfileStore for FileProfileStore {
    fn read_profile_xp(&self, user_id: UserId) -> ProfileResult<u64> {
        self.load()?
            .profiles
            .get(&user_id)
            .map(|p| p.xp)
            .ok_or(ProfileError::NotFound(user_id))
    }

    fn write_profile_xp(&mut self, user_id: UserId, xp: u64) -> ProfileResult<()> {
        let mut document = self.load()?;
        let profile = document
            .profiles
            .get_mut(&user_id)
            .ok_or(ProfileError::NotFound(user_id))?;
        profile.xp = xp;
        self.save(&document)
    }
}
