// src/store/mod.rs

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::{
    constants::{PARAM_FALSE, PARAM_TRUE},
    errors::StoreError,
};

/// Key/value storage for parameters.
///
/// The durable parameter directory and the volatile signalling area are both
/// instances of this trait; they differ only in whether values survive a restart.
/// Methods take `&self` because a store is shared with other components that may
/// read or write the same keys at any time.
pub trait ParamStore {
    /// Reads the raw value for `key`.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(value))` if the key exists.
    /// - `Ok(None)` if the key doesn't exist.
    /// - `Err(StoreError)` if the underlying read fails.
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Writes `value` under `key`. The value is visible to every other reader
    /// once this returns `Ok`.
    fn write(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removes `key`. Removing a key that doesn't exist succeeds.
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    fn read_bool(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self
            .read(key)?
            .and_then(|raw| decode_bool(&raw))
            .unwrap_or(false))
    }

    fn write_bool(&self, key: &str, value: bool) -> Result<(), StoreError> {
        self.write(key, encode_bool(value))
    }
}

impl<S: ParamStore + ?Sized> ParamStore for &S {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).write(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

pub fn encode_bool(value: bool) -> &'static str {
    if value {
        PARAM_TRUE
    } else {
        PARAM_FALSE
    }
}

/// Decodes the boolean spellings found in parameter stores.
pub fn decode_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

/// Keys name files on disk, so they must be plain file names.
pub(crate) fn validate_key(key: &str) -> Result<(), StoreError> {
    if key.is_empty()
        || key.starts_with('.')
        || key.contains(['/', '\\'])
        || key.contains('\0')
    {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}
