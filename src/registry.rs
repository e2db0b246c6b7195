// src/registry.rs

use indexmap::IndexMap;
use tracing::{debug, error, info, warn};

use crate::{
    errors::{CatalogError, ToggleError},
    groups::ValueMap,
    store::ParamStore,
    toggles::{OptionSpec, OptionValue},
};

/// Outcome of reading every registered option from the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Keys that were absent and had their factory value written back.
    pub defaulted: Vec<String>,
    /// At least one defaulted option only takes effect after a restart.
    pub reboot_required: bool,
}

/// In-memory cache of option values over a [`ParamStore`].
///
/// The store stays the source of truth: every `set` is written through before
/// the cache changes, and `load` re-reads everything.
#[derive(Debug)]
pub struct ToggleRegistry<S: ParamStore> {
    store: S,
    specs: IndexMap<String, OptionSpec>,
    values: Option<ValueMap>,
}

impl<S: ParamStore> ToggleRegistry<S> {
    pub fn new(store: S, options: Vec<OptionSpec>) -> Result<Self, CatalogError> {
        let mut specs = IndexMap::with_capacity(options.len());
        for spec in options {
            if spec.unit.is_some() {
                let numeric = match &spec.default {
                    OptionValue::Text(raw) => raw.trim().parse::<f64>().is_ok(),
                    OptionValue::Bool(_) => false,
                };
                if !numeric {
                    return Err(CatalogError::NonNumericDefault {
                        key: spec.key.clone(),
                        value: spec.default.encode(),
                    });
                }
            }
            if specs.contains_key(&spec.key) {
                return Err(CatalogError::DuplicateKey(spec.key));
            }
            specs.insert(spec.key.clone(), spec);
        }
        Ok(Self {
            store,
            specs,
            values: None,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_loaded(&self) -> bool {
        self.values.is_some()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.specs.contains_key(key)
    }

    pub fn specs(&self) -> impl Iterator<Item = &OptionSpec> {
        self.specs.values()
    }

    pub fn spec(&self, key: &str) -> Result<&OptionSpec, ToggleError> {
        self.specs
            .get(key)
            .ok_or_else(|| ToggleError::UnknownKey(key.to_string()))
    }

    /// Reads every registered key from the store. Absent keys get their
    /// factory value, which is also written back. An empty value is kept.
    ///
    /// The cache is replaced only once every key has been read.
    pub fn load(&mut self) -> Result<LoadReport, ToggleError> {
        let mut values = ValueMap::with_capacity(self.specs.len());
        let mut report = LoadReport::default();

        for spec in self.specs.values() {
            let stored = self
                .store
                .read(&spec.key)
                .map_err(|source| ToggleError::StoreRead {
                    key: spec.key.clone(),
                    source,
                })?;

            let value = match stored {
                Some(raw) => OptionValue::decode(spec.kind(), &raw).unwrap_or_else(|| {
                    warn!(
                        "{} -> Stored value '{}' is not a boolean, treating it as off.",
                        spec.key, raw
                    );
                    OptionValue::Bool(false)
                }),
                None => {
                    self.store
                        .write(&spec.key, &spec.default.encode())
                        .map_err(|source| ToggleError::StoreWrite {
                            key: spec.key.clone(),
                            source,
                        })?;
                    debug!(
                        "{} -> Not set, wrote default '{}'.",
                        spec.key, spec.default
                    );
                    report.defaulted.push(spec.key.clone());
                    report.reboot_required |= spec.requires_reboot;
                    spec.default.clone()
                }
            };
            values.insert(spec.key.clone(), value);
        }

        info!(
            "Loaded {} toggles, {} set to defaults.",
            values.len(),
            report.defaulted.len()
        );
        self.values = Some(values);
        Ok(report)
    }

    pub fn values(&self) -> Result<&ValueMap, ToggleError> {
        self.values.as_ref().ok_or(ToggleError::NotLoaded)
    }

    pub fn get(&self, key: &str) -> Result<&OptionValue, ToggleError> {
        self.values()?
            .get(key)
            .ok_or_else(|| ToggleError::UnknownKey(key.to_string()))
    }

    /// Writes `value` through to the store, then updates the cache.
    ///
    /// # Returns
    ///
    /// - `Ok(previous)` with the value that was replaced.
    /// - `Err(ToggleError)` if the key is unknown, the value doesn't fit the
    ///   option, or the store rejected the write. The cache is untouched on error.
    pub fn set(
        &mut self,
        key: &str,
        value: impl Into<OptionValue>,
    ) -> Result<OptionValue, ToggleError> {
        if self.values.is_none() {
            return Err(ToggleError::NotLoaded);
        }
        let spec = self.spec(key)?;
        let value = value.into();
        let encoded = value.encode();
        let value = value
            .coerce(spec.kind())
            .ok_or_else(|| ToggleError::InvalidValue {
                key: key.to_string(),
                value: encoded,
            })?;

        self.store
            .write(key, &value.encode())
            .map_err(|source| {
                error!("{} -> Failed to persist '{}': {}", key, value, source);
                ToggleError::StoreWrite {
                    key: key.to_string(),
                    source,
                }
            })?;
        debug!("{} -> Set to '{}'.", key, value);

        let values = self.values.as_mut().ok_or(ToggleError::NotLoaded)?;
        let previous = values
            .insert(key.to_string(), value)
            .ok_or_else(|| ToggleError::UnknownKey(key.to_string()))?;
        Ok(previous)
    }

    /// Applies several writes in order. If one fails, the writes already made
    /// are restored in reverse order and the original error is returned.
    ///
    /// # Returns
    ///
    /// - `Ok(previous)` pairing each written key with the value it replaced.
    pub fn set_many(
        &mut self,
        writes: Vec<(String, OptionValue)>,
    ) -> Result<Vec<(String, OptionValue)>, ToggleError> {
        let mut applied = Vec::with_capacity(writes.len());
        for (key, value) in writes {
            match self.set(&key, value) {
                Ok(previous) => applied.push((key, previous)),
                Err(e) => {
                    error!(
                        "{} -> Batch write failed: {}. Rolling back {} writes.",
                        key,
                        e,
                        applied.len()
                    );
                    self.rollback(&applied);
                    return Err(e);
                }
            }
        }
        Ok(applied)
    }

    fn rollback(&mut self, applied: &[(String, OptionValue)]) {
        for (key, previous) in applied.iter().rev() {
            match self.set(key, previous.clone()) {
                Ok(_) => debug!("{} -> Restored '{}'.", key, previous),
                Err(e) => error!("{} -> Failed to restore '{}': {}", key, previous, e),
            }
        }
    }
}
