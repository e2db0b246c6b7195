// src/signals.rs

use strum_macros::{EnumIter, IntoStaticStr};
use tracing::debug;

use crate::{errors::StoreError, store::ParamStore};

/// Flags raised in the volatile store for background processes to pick up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr, EnumIter)]
pub enum Signal {
    /// Some toggle changed; consumers should re-read their parameters.
    #[strum(serialize = "FrogPilotTogglesUpdated")]
    TogglesUpdated,
    /// Unit-dependent values were rewritten for a new measurement system.
    #[strum(serialize = "FrogPilotMeasurementChanged")]
    MeasurementChanged,
    /// The driving model selection changed; the model switcher should run.
    #[strum(serialize = "ModelChanged")]
    ModelChanged,
}

impl Signal {
    /// Key the flag is stored under.
    pub fn key(self) -> &'static str {
        self.into()
    }
}

/// Raises and consumes [`Signal`]s in a volatile store.
#[derive(Debug, Clone)]
pub struct Signals<M: ParamStore> {
    store: M,
}

impl<M: ParamStore> Signals<M> {
    pub fn new(store: M) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &M {
        &self.store
    }

    pub fn raise(&self, signal: Signal) -> Result<(), StoreError> {
        self.store.write_bool(signal.key(), true)?;
        debug!("{} -> Raised.", signal.key());
        Ok(())
    }

    pub fn is_raised(&self, signal: Signal) -> Result<bool, StoreError> {
        self.store.read_bool(signal.key())
    }

    /// Reads and clears `signal`. Returns whether it was raised.
    pub fn take(&self, signal: Signal) -> Result<bool, StoreError> {
        let raised = self.is_raised(signal)?;
        if raised {
            self.store.remove(signal.key())?;
        }
        Ok(raised)
    }
}
