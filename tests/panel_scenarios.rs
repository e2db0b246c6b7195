use std::{fs, path::Path};

use frogpilot_toggles::{
    errors::ToggleError,
    panel::{ControlsPanel, ResetScope},
    signals::Signal,
    store::{FileStore, ParamStore},
    toggles::{definitions::CONTROLS_CATALOG, OptionValue},
    units::MeasurementSystem,
};
use tempfile::TempDir;

struct Device {
    _dir: TempDir,
    params: FileStore,
    memory: FileStore,
}

impl Device {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let params = FileStore::new(dir.path().join("params").join("d"));
        let memory = FileStore::new(dir.path().join("shm").join("d"));
        Self {
            _dir: dir,
            params,
            memory,
        }
    }

    fn panel(&self) -> ControlsPanel<FileStore, FileStore> {
        let mut panel =
            ControlsPanel::new(&CONTROLS_CATALOG, self.params.clone(), self.memory.clone())
                .unwrap();
        panel.load().unwrap();
        panel
    }

    fn param(&self, key: &str) -> Option<String> {
        read_file(&self.params.root().join(key))
    }
}

fn read_file(path: &Path) -> Option<String> {
    fs::read_to_string(path).ok()
}

#[test]
fn first_boot_writes_every_default() {
    let device = Device::new();
    let mut panel =
        ControlsPanel::new(&CONTROLS_CATALOG, device.params.clone(), device.memory.clone())
            .unwrap();
    let update = panel.load().unwrap();

    assert!(update.reboot_required);
    for spec in &CONTROLS_CATALOG.options {
        assert_eq!(
            device.param(&spec.key),
            Some(spec.default.encode()),
            "{}",
            spec.key
        );
    }
    assert_eq!(device.param("IsMetric").as_deref(), Some("0"));
    assert_eq!(device.param("Offset4").as_deref(), Some("10"));
}

#[test]
fn nested_lead_options_follow_both_parents() {
    let device = Device::new();
    let mut panel = device.panel();

    let visibility = panel.resolve_all().unwrap();
    assert!(visibility["CECurvesLead"]);
    assert!(visibility["CEStopLightsLead"]);

    let update = panel.on_toggle_edited("CECurves", false).unwrap();
    assert!(!update.visibility["CECurvesLead"]);
    assert!(update.visibility["CEStopLightsLead"]);

    let update = panel
        .on_toggle_edited("ConditionalExperimental", "0")
        .unwrap();
    assert!(!update.visibility["CEStopLights"]);
    assert!(!update.visibility["CEStopLightsLead"]);
    assert_eq!(device.param("ConditionalExperimental").as_deref(), Some("0"));
    assert_eq!(
        read_file(&device.memory.root().join("FrogPilotTogglesUpdated")).as_deref(),
        Some("1")
    );
}

#[test]
fn metric_switch_survives_restart() {
    let device = Device::new();
    let mut panel = device.panel();

    let update = panel
        .on_unit_system_changed(MeasurementSystem::Metric)
        .unwrap()
        .unwrap();
    assert_eq!(update.converted.len(), 8);
    assert_eq!(device.param("IsMetric").as_deref(), Some("1"));
    assert_eq!(device.param("Offset1").as_deref(), Some("8"));
    assert_eq!(device.param("Offset4").as_deref(), Some("16"));
    assert_eq!(device.param("StoppingDistance").as_deref(), Some("0"));
    assert!(panel
        .signals()
        .is_raised(Signal::MeasurementChanged)
        .unwrap());

    drop(panel);
    let mut panel = device.panel();
    assert_eq!(
        panel.measurement_system().unwrap(),
        MeasurementSystem::Metric
    );
    assert_eq!(panel.get("Offset1").unwrap(), &OptionValue::from("8"));
    assert!(panel
        .set_measurement_system(MeasurementSystem::Metric)
        .unwrap()
        .is_none());
}

#[test]
fn group_reset_in_metric_restores_converted_defaults() {
    let device = Device::new();
    let mut panel = device.panel();
    panel
        .set_measurement_system(MeasurementSystem::Metric)
        .unwrap();
    panel.set("Offset1", "20").unwrap();
    panel.set("SLCFallback", "0").unwrap();

    panel
        .on_reset_requested(&ResetScope::Group("SpeedLimitController".to_string()))
        .unwrap();
    assert_eq!(device.param("Offset1").as_deref(), Some("8"));
    assert_eq!(device.param("SLCFallback").as_deref(), Some("2"));
    assert_eq!(device.param("IsMetric").as_deref(), Some("1"));
}

#[test]
fn external_unit_change_is_picked_up_when_shown() {
    let device = Device::new();
    let mut panel = device.panel();

    // Another component flips the unit system while the panel is hidden.
    device.params.write("IsMetric", "1").unwrap();
    let update = panel.on_panel_shown().unwrap();

    assert_eq!(update.converted.len(), 8);
    assert_eq!(device.param("CESpeed").as_deref(), Some("0"));
    assert_eq!(device.param("Offset2").as_deref(), Some("8"));
    assert_eq!(device.param("IsMetric").as_deref(), Some("1"));
}

#[test]
fn reboot_only_options_are_reported() {
    let device = Device::new();
    let mut panel = device.panel();

    assert!(panel.set("FireTheBabysitter", true).unwrap().reboot_required);
    assert!(!panel.set("FireTheBabysitter", true).unwrap().reboot_required);
    assert!(!panel.set("MuteDoor", true).unwrap().reboot_required);
}

#[test]
fn unknown_key_creates_no_file() {
    let device = Device::new();
    let mut panel = device.panel();

    let err = panel.set("LaneSpeedMode", true).unwrap_err();
    assert!(matches!(err, ToggleError::UnknownKey(_)));
    assert_eq!(device.param("LaneSpeedMode"), None);
}

#[test]
fn model_selection_signals_the_switcher() {
    let device = Device::new();
    let mut panel = device.panel();
    let flag = device.memory.root().join("ModelChanged");

    let update = panel.on_toggle_edited("Model", "3").unwrap();
    assert!(update.reboot_required);
    assert!(update.failed_signals.is_empty());
    assert_eq!(device.param("Model").as_deref(), Some("3"));
    assert_eq!(read_file(&flag).as_deref(), Some("1"));

    assert!(panel.signals().take(Signal::ModelChanged).unwrap());
    panel.on_toggle_edited("Model", "3").unwrap();
    assert_eq!(read_file(&flag), None);
}
