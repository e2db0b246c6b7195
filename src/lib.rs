// src/lib.rs

pub mod config;
pub mod constants;
pub mod errors;
pub mod groups;
pub mod panel;
pub mod registry;
pub mod signals;
pub mod store;
pub mod toggles;
pub mod units;
