// src/errors.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Invalid parameter key: '{0}'")]
    InvalidKey(String),

    #[error("Failed to read parameter '{key}': {source}")]
    Read {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write parameter '{key}': {source}")]
    Write {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove parameter '{key}': {source}")]
    Remove {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Parameter store rejected write to '{0}'")]
    Rejected(String),

    #[error("Parameter store lock poisoned")]
    Poisoned,
}

#[derive(Error, Debug)]
pub enum ToggleError {
    #[error("Unknown toggle key: '{0}'")]
    UnknownKey(String),

    #[error("Unknown dependency group: '{0}'")]
    UnknownGroup(String),

    #[error("Toggle registry has not been loaded")]
    NotLoaded,

    #[error("Stored value '{value}' for '{key}' is not numeric")]
    Conversion { key: String, value: String },

    #[error("Value '{value}' is not valid for boolean toggle '{key}'")]
    InvalidValue { key: String, value: String },

    #[error("Failed to persist '{key}': {source}")]
    StoreWrite {
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("Failed to read '{key}': {source}")]
    StoreRead {
        key: String,
        #[source]
        source: StoreError,
    },
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Option '{0}' is declared more than once")]
    DuplicateKey(String),

    #[error("Dependency group '{0}' is declared more than once")]
    DuplicateGroup(String),

    #[error("Dependency group '{group}' references unknown key '{key}'")]
    UnknownKey { group: String, key: String },

    #[error("Dependency group '{group}' lists its own parent '{key}' as a member")]
    SelfMembership { group: String, key: String },

    #[error("Dependency groups form a cycle: {0}")]
    Cycle(String),

    #[error("Unit-dependent option '{key}' has non-numeric default '{value}'")]
    NonNumericDefault { key: String, value: String },

    #[error("Measurement key '{0}' is not a registered boolean option")]
    UnknownMeasurementKey(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}
