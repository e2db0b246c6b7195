// src/constants.rs

pub const DEFAULT_PARAMS_DIR: &str = "/data/params/d";
pub const DEFAULT_MEMORY_PARAMS_DIR: &str = "/dev/shm/params/d"; // tmpfs, cleared on boot
pub const DEFAULT_CONFIG_FILE: &str = "frogpilot_toggles.toml";
pub const DEFAULT_LOG_LEVEL: &str = "info";

// Linear factors between metric and imperial units.
pub const KM_PER_MILE: f64 = 1.609_344;
pub const METERS_PER_FOOT: f64 = 0.3048;

pub const PARAM_TRUE: &str = "1";
pub const PARAM_FALSE: &str = "0";
