// src/panel.rs

use tracing::{debug, error, info};

use crate::{
    errors::{CatalogError, ToggleError},
    groups::{DependencyGroups, VisibilityMap},
    registry::ToggleRegistry,
    signals::{Signal, Signals},
    store::ParamStore,
    toggles::{Catalog, OptionKind, OptionValue},
    units::{convert_stored, MeasurementSystem},
};

/// Which options a defaults reset covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetScope {
    All,
    /// A dependency group by name, including groups nested below it.
    Group(String),
}

/// What the UI layer has to apply after an event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelUpdate {
    pub visibility: VisibilityMap,
    /// A changed option only takes effect after a restart.
    pub reboot_required: bool,
    /// Unit-dependent options rewritten for a new measurement system.
    pub converted: Vec<String>,
    /// Signals that could not be raised. The option writes themselves
    /// succeeded and are already persisted.
    pub failed_signals: Vec<Signal>,
}

/// The driving-controls settings core.
///
/// Owns the toggle cache over the parameter store, the dependency groups that
/// decide which sub-options are shown, and the volatile store used to notify
/// other processes. Every operation except [`ControlsPanel::load`] requires a
/// prior successful load.
pub struct ControlsPanel<P: ParamStore, M: ParamStore> {
    registry: ToggleRegistry<P>,
    groups: DependencyGroups,
    measurement_key: String,
    default_system: MeasurementSystem,
    /// System the unit-dependent values are expressed in; `None` until loaded.
    units_in: Option<MeasurementSystem>,
    signals: Signals<M>,
}

impl<P: ParamStore, M: ParamStore> ControlsPanel<P, M> {
    pub fn new(catalog: &Catalog, params: P, memory: M) -> Result<Self, CatalogError> {
        let registry = ToggleRegistry::new(params, catalog.options.clone())?;

        let measurement_is_bool = registry
            .spec(&catalog.measurement_key)
            .is_ok_and(|spec| spec.kind() == OptionKind::Bool);
        let default_system = catalog
            .default_measurement_system()
            .filter(|_| measurement_is_bool)
            .ok_or_else(|| CatalogError::UnknownMeasurementKey(catalog.measurement_key.clone()))?;

        let groups = DependencyGroups::new(catalog.groups.clone(), |key| registry.contains(key))?;
        debug!(
            "Constructed panel with {} options and {} groups.",
            catalog.options.len(),
            groups.len()
        );

        Ok(Self {
            registry,
            groups,
            measurement_key: catalog.measurement_key.clone(),
            default_system,
            units_in: None,
            signals: Signals::new(memory),
        })
    }

    pub fn registry(&self) -> &ToggleRegistry<P> {
        &self.registry
    }

    pub fn groups(&self) -> &DependencyGroups {
        &self.groups
    }

    pub fn signals(&self) -> &Signals<M> {
        &self.signals
    }

    pub fn is_loaded(&self) -> bool {
        self.units_in.is_some()
    }

    pub fn get(&self, key: &str) -> Result<&OptionValue, ToggleError> {
        self.registry.get(key)
    }

    /// Measurement system currently selected in the store.
    pub fn measurement_system(&self) -> Result<MeasurementSystem, ToggleError> {
        let is_metric = self.registry.get(&self.measurement_key)?.is_truthy();
        Ok(MeasurementSystem::from_is_metric(is_metric))
    }

    /// Reads every option from the parameter store and resolves visibility.
    pub fn load(&mut self) -> Result<PanelUpdate, ToggleError> {
        let report = self.registry.load()?;
        let system = self.measurement_system()?;
        self.units_in = Some(system);
        info!("Controls panel loaded, units are {}.", system);

        Ok(PanelUpdate {
            visibility: self.resolve_all()?,
            reboot_required: report.reboot_required,
            ..PanelUpdate::default()
        })
    }

    /// Visibility of the members of one group.
    pub fn resolve(&self, group: &str) -> Result<VisibilityMap, ToggleError> {
        let values = self.registry.values()?;
        self.groups
            .resolve(group, values)
            .ok_or_else(|| ToggleError::UnknownGroup(group.to_string()))
    }

    /// Visibility of every gated option.
    pub fn resolve_all(&self) -> Result<VisibilityMap, ToggleError> {
        Ok(self.groups.resolve_all(self.registry.values()?))
    }

    /// Visibility of the members of the groups `key` is parent of.
    pub fn resolve_parent(&self, key: &str) -> Result<VisibilityMap, ToggleError> {
        let values = self.registry.values()?;
        self.registry.spec(key)?;
        let mut visibility = VisibilityMap::new();
        for group in self.groups.with_parent(key) {
            if let Some(resolved) = self.groups.resolve(&group.name, values) {
                visibility.extend(resolved);
            }
        }
        Ok(visibility)
    }

    /// The panel became visible again: drop the cache, re-read the store, and
    /// catch up with a measurement system changed by another component.
    pub fn on_panel_shown(&mut self) -> Result<PanelUpdate, ToggleError> {
        let previous = self.units_in.ok_or(ToggleError::NotLoaded)?;
        let report = self.registry.load()?;
        let current = self.measurement_system()?;

        let mut converted = Vec::new();
        let mut failed_signals = Vec::new();
        if current != previous {
            info!(
                "Measurement system changed from {} to {} outside the panel.",
                previous, current
            );
            let writes = self.unit_conversions(previous, current)?;
            converted = writes.iter().map(|(key, _)| key.clone()).collect();
            self.registry.set_many(writes)?;
            failed_signals = self.raise(&[Signal::MeasurementChanged, Signal::TogglesUpdated]);
        }
        self.units_in = Some(current);

        Ok(PanelUpdate {
            visibility: self.resolve_all()?,
            reboot_required: report.reboot_required,
            converted,
            failed_signals,
        })
    }

    pub fn on_toggle_edited(
        &mut self,
        key: &str,
        value: impl Into<OptionValue>,
    ) -> Result<PanelUpdate, ToggleError> {
        self.set(key, value)
    }

    pub fn on_reset_requested(&mut self, scope: &ResetScope) -> Result<PanelUpdate, ToggleError> {
        self.apply_defaults(scope)
    }

    pub fn on_unit_system_changed(
        &mut self,
        system: MeasurementSystem,
    ) -> Result<Option<PanelUpdate>, ToggleError> {
        self.set_measurement_system(system)
    }

    /// Writes one option through to the store and re-resolves visibility.
    ///
    /// Writing the measurement option goes through
    /// [`ControlsPanel::set_measurement_system`] so dependent values follow.
    pub fn set(
        &mut self,
        key: &str,
        value: impl Into<OptionValue>,
    ) -> Result<PanelUpdate, ToggleError> {
        if !self.is_loaded() {
            return Err(ToggleError::NotLoaded);
        }
        let value = value.into();

        if key == self.measurement_key {
            let encoded = value.encode();
            let is_metric = match value.coerce(OptionKind::Bool) {
                Some(OptionValue::Bool(is_metric)) => is_metric,
                _ => {
                    return Err(ToggleError::InvalidValue {
                        key: key.to_string(),
                        value: encoded,
                    })
                }
            };
            let system = MeasurementSystem::from_is_metric(is_metric);
            return match self.set_measurement_system(system)? {
                Some(update) => Ok(update),
                None => Ok(PanelUpdate {
                    visibility: self.resolve_all()?,
                    ..PanelUpdate::default()
                }),
            };
        }

        let spec = self.registry.spec(key)?;
        let requires_reboot = spec.requires_reboot;
        let extra_signal = spec.signal;
        let previous = self.registry.set(key, value)?;
        let changed = *self.registry.get(key)? != previous;

        let mut failed_signals = Vec::new();
        if changed {
            let mut signals = vec![Signal::TogglesUpdated];
            signals.extend(extra_signal);
            failed_signals = self.raise(&signals);
        }
        let reboot_required = changed && requires_reboot;
        if reboot_required {
            info!("{} -> Change takes effect after a reboot.", key);
        }

        Ok(PanelUpdate {
            visibility: self.resolve_all()?,
            reboot_required,
            failed_signals,
            ..PanelUpdate::default()
        })
    }

    /// Restores factory values for every option in `scope`, then resolves
    /// visibility once.
    ///
    /// Factory values of unit-dependent options are expressed in the default
    /// measurement system. Unless the reset also restores the measurement
    /// option, they are converted into the system currently in use.
    pub fn apply_defaults(&mut self, scope: &ResetScope) -> Result<PanelUpdate, ToggleError> {
        let current = self.units_in.ok_or(ToggleError::NotLoaded)?;

        let keys: Vec<String> = match scope {
            ResetScope::All => self.registry.specs().map(|spec| spec.key.clone()).collect(),
            ResetScope::Group(name) => self
                .groups
                .closure(name)
                .ok_or_else(|| ToggleError::UnknownGroup(name.clone()))?
                .into_iter()
                .collect(),
        };
        let target = if keys.contains(&self.measurement_key) {
            self.default_system
        } else {
            current
        };

        let mut writes = Vec::with_capacity(keys.len());
        for key in keys {
            let spec = self.registry.spec(&key)?;
            let value = match spec.unit {
                Some(quantity) if target != self.default_system => {
                    let raw = spec.default.encode();
                    let converted = convert_stored(&raw, quantity, self.default_system, target)
                        .ok_or_else(|| ToggleError::Conversion {
                            key: key.clone(),
                            value: raw,
                        })?;
                    OptionValue::Text(converted)
                }
                _ => spec.default.clone(),
            };
            writes.push((key, value));
        }

        let previous = self.registry.set_many(writes)?;
        self.units_in = Some(target);

        let mut changed = 0;
        let mut reboot_required = false;
        let mut signals = vec![Signal::TogglesUpdated];
        for (key, old) in &previous {
            if self.registry.get(key)? != old {
                changed += 1;
                let spec = self.registry.spec(key)?;
                reboot_required |= spec.requires_reboot;
                if let Some(signal) = spec.signal.filter(|s| !signals.contains(s)) {
                    signals.push(signal);
                }
            }
        }
        info!(
            "Reset {} options to defaults, {} changed.",
            previous.len(),
            changed
        );
        let failed_signals = if changed > 0 {
            self.raise(&signals)
        } else {
            Vec::new()
        };

        Ok(PanelUpdate {
            visibility: self.resolve_all()?,
            reboot_required,
            failed_signals,
            ..PanelUpdate::default()
        })
    }

    /// Switches the measurement system and rewrites every unit-dependent
    /// option in the new units.
    ///
    /// # Returns
    ///
    /// - `Ok(None)` if `system` is already in use; nothing is written.
    /// - `Ok(Some(update))` after the switch.
    /// - `Err(ToggleError::Conversion)` if a stored value isn't numeric. Nothing
    ///   is written in that case.
    pub fn set_measurement_system(
        &mut self,
        system: MeasurementSystem,
    ) -> Result<Option<PanelUpdate>, ToggleError> {
        let units_in = self.units_in.ok_or(ToggleError::NotLoaded)?;
        if self.measurement_system()? == system && units_in == system {
            debug!("Measurement system is already {}.", system);
            return Ok(None);
        }

        let conversions = self.unit_conversions(units_in, system)?;
        let converted: Vec<String> = conversions.iter().map(|(key, _)| key.clone()).collect();

        let mut writes = Vec::with_capacity(conversions.len() + 1);
        writes.push((
            self.measurement_key.clone(),
            OptionValue::Bool(system.is_metric()),
        ));
        writes.extend(conversions);
        self.registry.set_many(writes)?;
        self.units_in = Some(system);

        info!(
            "Measurement system set to {}, converted {} options.",
            system,
            converted.len()
        );
        let failed_signals = self.raise(&[Signal::MeasurementChanged, Signal::TogglesUpdated]);

        let reboot_required = self.registry.spec(&self.measurement_key)?.requires_reboot;
        Ok(Some(PanelUpdate {
            visibility: self.resolve_all()?,
            reboot_required,
            converted,
            failed_signals,
        }))
    }

    /// Converted values for every unit-dependent option, computed before
    /// anything is written.
    fn unit_conversions(
        &self,
        from: MeasurementSystem,
        to: MeasurementSystem,
    ) -> Result<Vec<(String, OptionValue)>, ToggleError> {
        if from == to {
            return Ok(Vec::new());
        }
        let mut writes = Vec::new();
        for spec in self.registry.specs() {
            let Some(quantity) = spec.unit else {
                continue;
            };
            let raw = self.registry.get(&spec.key)?.encode();
            let converted = convert_stored(&raw, quantity, from, to).ok_or_else(|| {
                error!(
                    "{} -> Stored value '{}' is not numeric, aborting unit conversion.",
                    spec.key, raw
                );
                ToggleError::Conversion {
                    key: spec.key.clone(),
                    value: raw.clone(),
                }
            })?;
            debug!(
                "{} -> {} {} is {} {}.",
                spec.key,
                raw,
                quantity.label(from),
                converted,
                quantity.label(to)
            );
            writes.push((spec.key.clone(), OptionValue::Text(converted)));
        }
        Ok(writes)
    }

    /// Raises each signal after the option writes are committed. Failures are
    /// logged and returned instead of failing the already persisted edit.
    fn raise(&self, signals: &[Signal]) -> Vec<Signal> {
        signals
            .iter()
            .copied()
            .filter(|&signal| match self.signals.raise(signal) {
                Ok(()) => false,
                Err(e) => {
                    error!("{} -> Failed to raise signal: {}", signal.key(), e);
                    true
                }
            })
            .collect()
    }
}
