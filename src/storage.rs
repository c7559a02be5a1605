//! Browser-local-storage analog: one JSON document per key under a data
//! directory. Reads happen once at manager construction, writes on every
//! guest-mode mutation.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::AppResult;

pub const CART_KEY: &str = "cart";
pub const WISHLIST_KEY: &str = "wishlist";
pub const COUPON_KEY: &str = "coupon";

#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub fn open(dir: impl Into<PathBuf>) -> AppResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Loads a value for `key`. Missing files yield `None`; corrupt payloads
    /// are logged and treated as absent rather than failing startup.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        let bytes = match fs::read(self.path(key)) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                tracing::warn!(key, error = %err, "discarding corrupt persisted value");
                Ok(None)
            }
        }
    }

    pub fn load_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        self.load(key).ok().flatten().unwrap_or_default()
    }

    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> AppResult<()> {
        let bytes = serde_json::to_vec(value)?;
        fs::write(self.path(key), bytes)?;
        Ok(())
    }

    /// Removes the persisted value; a missing file is not an error.
    pub fn remove(&self, key: &str) -> AppResult<()> {
        match fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
