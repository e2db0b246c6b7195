// src/toggles/definitions.rs

use once_cell::sync::Lazy;

use super::{Catalog, OptionSpec};
use crate::{groups::DependencyGroup, signals::Signal, units::UnitQuantity};

pub const IS_METRIC: &str = "IsMetric";
pub const MODEL: &str = "Model";

pub const CONDITIONAL_EXPERIMENTAL: &str = "ConditionalExperimental";
pub const CUSTOM_PERSONALITIES: &str = "CustomPersonalities";
pub const FIRE_THE_BABYSITTER: &str = "FireTheBabysitter";
pub const LANE_CHANGE_CUSTOMIZATIONS: &str = "LaneChangeCustomizations";
pub const LATERAL_TUNE: &str = "LateralTune";
pub const LONGITUDINAL_TUNE: &str = "LongitudinalTune";
pub const SPEED_LIMIT_CONTROLLER: &str = "SpeedLimitController";
pub const VISION_TURN_CONTROL: &str = "VisionTurnControl";

/// Driving-controls options and their dependency groups.
pub static CONTROLS_CATALOG: Lazy<Catalog> = Lazy::new(controls_catalog);

pub fn controls_catalog() -> Catalog {
    let mut options = vec![
        OptionSpec::toggle(IS_METRIC, false),
        OptionSpec::toggle("AlwaysOnLateral", true).requires_reboot(),
        OptionSpec::value("DeviceShutdown", "9"),
        OptionSpec::value("PauseLateralOnSignal", "0").unit(UnitQuantity::Speed),
        // Index into the installed driving models; applied by the model switcher on boot.
        OptionSpec::value(MODEL, "0")
            .requires_reboot()
            .raises(Signal::ModelChanged),
    ];
    let mut groups = Vec::new();

    for (mut area_options, mut area_groups) in [
        conditional_experimental(),
        custom_personalities(),
        fire_the_babysitter(),
        lane_change_customizations(),
        lateral_tune(),
        longitudinal_tune(),
        speed_limit_controller(),
        vision_turn_control(),
    ] {
        options.append(&mut area_options);
        groups.append(&mut area_groups);
    }

    Catalog {
        options,
        groups,
        measurement_key: IS_METRIC.to_string(),
    }
}

type Area = (Vec<OptionSpec>, Vec<DependencyGroup>);

fn conditional_experimental() -> Area {
    (
        vec![
            OptionSpec::toggle(CONDITIONAL_EXPERIMENTAL, true),
            OptionSpec::value("CESpeed", "0").unit(UnitQuantity::Speed),
            OptionSpec::value("CESpeedLead", "0").unit(UnitQuantity::Speed),
            OptionSpec::toggle("CECurves", true),
            OptionSpec::toggle("CECurvesLead", false),
            OptionSpec::toggle("CENavigation", true),
            OptionSpec::toggle("CESignal", true),
            OptionSpec::toggle("CESlowerLead", false),
            OptionSpec::toggle("CEStopLights", true),
            OptionSpec::toggle("CEStopLightsLead", true),
        ],
        vec![
            DependencyGroup::new(
                CONDITIONAL_EXPERIMENTAL,
                [
                    "CESpeed",
                    "CESpeedLead",
                    "CECurves",
                    "CECurvesLead",
                    "CENavigation",
                    "CESignal",
                    "CESlowerLead",
                    "CEStopLights",
                    "CEStopLightsLead",
                ],
            ),
            // "with lead" variants only apply while the base condition is on
            DependencyGroup::new("CECurves", ["CECurvesLead"]),
            DependencyGroup::new("CEStopLights", ["CEStopLightsLead"]),
        ],
    )
}

fn custom_personalities() -> Area {
    // Follow distances in tenths of a second, jerk factors in percent.
    (
        vec![
            OptionSpec::toggle(CUSTOM_PERSONALITIES, true),
            OptionSpec::value("AggressiveFollow", "12"),
            OptionSpec::value("AggressiveJerk", "5"),
            OptionSpec::value("StandardFollow", "15"),
            OptionSpec::value("StandardJerk", "10"),
            OptionSpec::value("RelaxedFollow", "30"),
            OptionSpec::value("RelaxedJerk", "50"),
        ],
        vec![DependencyGroup::new(
            CUSTOM_PERSONALITIES,
            [
                "AggressiveFollow",
                "AggressiveJerk",
                "StandardFollow",
                "StandardJerk",
                "RelaxedFollow",
                "RelaxedJerk",
            ],
        )],
    )
}

fn fire_the_babysitter() -> Area {
    (
        vec![
            OptionSpec::toggle(FIRE_THE_BABYSITTER, false).requires_reboot(),
            OptionSpec::toggle("NoLogging", false).requires_reboot(),
            OptionSpec::toggle("MuteDM", false).requires_reboot(),
            OptionSpec::toggle("MuteDoor", false),
            OptionSpec::toggle("MuteOverheated", false),
            OptionSpec::toggle("MuteSeatbelt", false),
            OptionSpec::toggle("OfflineMode", false),
        ],
        vec![DependencyGroup::new(
            FIRE_THE_BABYSITTER,
            [
                "NoLogging",
                "MuteDM",
                "MuteDoor",
                "MuteOverheated",
                "MuteSeatbelt",
                "OfflineMode",
            ],
        )],
    )
}

fn lane_change_customizations() -> Area {
    (
        vec![
            OptionSpec::toggle(LANE_CHANGE_CUSTOMIZATIONS, true),
            OptionSpec::value("LaneChangeTime", "0"),
            OptionSpec::toggle("LaneDetection", true),
            OptionSpec::value("LaneDetectionWidth", "60"),
            OptionSpec::toggle("OneLaneChange", true),
        ],
        vec![
            DependencyGroup::new(
                LANE_CHANGE_CUSTOMIZATIONS,
                ["LaneChangeTime", "LaneDetection", "OneLaneChange"],
            ),
            DependencyGroup::new("LaneDetection", ["LaneDetectionWidth"]),
        ],
    )
}

fn lateral_tune() -> Area {
    (
        vec![
            OptionSpec::toggle(LATERAL_TUNE, true),
            OptionSpec::toggle("AverageCurvature", false),
            OptionSpec::toggle("NNFF", false).requires_reboot(),
        ],
        vec![DependencyGroup::new(
            LATERAL_TUNE,
            ["AverageCurvature", "NNFF"],
        )],
    )
}

fn longitudinal_tune() -> Area {
    (
        vec![
            OptionSpec::toggle(LONGITUDINAL_TUNE, true),
            // 1 = eco, 2 = normal, 3 = sport
            OptionSpec::value("AccelerationProfile", "2"),
            OptionSpec::toggle("AggressiveAcceleration", true),
            OptionSpec::toggle("SmoothBraking", true),
            OptionSpec::value("StoppingDistance", "0").unit(UnitQuantity::Distance),
        ],
        vec![DependencyGroup::new(
            LONGITUDINAL_TUNE,
            [
                "AccelerationProfile",
                "AggressiveAcceleration",
                "SmoothBraking",
                "StoppingDistance",
            ],
        )],
    )
}

fn speed_limit_controller() -> Area {
    (
        vec![
            OptionSpec::toggle(SPEED_LIMIT_CONTROLLER, true),
            OptionSpec::value("Offset1", "5").unit(UnitQuantity::Speed),
            OptionSpec::value("Offset2", "5").unit(UnitQuantity::Speed),
            OptionSpec::value("Offset3", "5").unit(UnitQuantity::Speed),
            OptionSpec::value("Offset4", "10").unit(UnitQuantity::Speed),
            // 0 = set speed, 1 = experimental mode, 2 = previous limit
            OptionSpec::value("SLCFallback", "2"),
            // 0 = none, 1 = manual, 2 = set speed
            OptionSpec::value("SLCOverride", "1"),
            OptionSpec::value("SLCPriority", "1"),
        ],
        vec![DependencyGroup::new(
            SPEED_LIMIT_CONTROLLER,
            [
                "Offset1",
                "Offset2",
                "Offset3",
                "Offset4",
                "SLCFallback",
                "SLCOverride",
                "SLCPriority",
            ],
        )],
    )
}

fn vision_turn_control() -> Area {
    (
        vec![
            OptionSpec::toggle(VISION_TURN_CONTROL, true),
            OptionSpec::value("CurveSensitivity", "100"),
            OptionSpec::toggle("DisableVTSCSmoothing", false),
            OptionSpec::value("TurnAggressiveness", "100"),
        ],
        vec![DependencyGroup::new(
            VISION_TURN_CONTROL,
            ["CurveSensitivity", "DisableVTSCSmoothing", "TurnAggressiveness"],
        )],
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::{groups::DependencyGroups, toggles::OptionValue, units::MeasurementSystem};

    #[test]
    fn test_catalog_keys_are_unique() {
        let catalog = controls_catalog();
        let keys: HashSet<&str> = catalog.options.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys.len(), catalog.options.len());
    }

    #[test]
    fn test_catalog_groups_validate() {
        let catalog = controls_catalog();
        let keys: HashSet<String> = catalog.options.iter().map(|o| o.key.clone()).collect();
        let groups = DependencyGroups::new(catalog.groups.clone(), |k| keys.contains(k)).unwrap();
        assert_eq!(groups.len(), 11);
    }

    #[test]
    fn test_unit_dependent_options() {
        let mut speed: Vec<&str> = CONTROLS_CATALOG
            .options
            .iter()
            .filter(|o| o.unit == Some(UnitQuantity::Speed))
            .map(|o| o.key.as_str())
            .collect();
        speed.sort_unstable();
        assert_eq!(
            speed,
            vec![
                "CESpeed",
                "CESpeedLead",
                "Offset1",
                "Offset2",
                "Offset3",
                "Offset4",
                "PauseLateralOnSignal"
            ]
        );

        let distance: Vec<&str> = CONTROLS_CATALOG
            .options
            .iter()
            .filter(|o| o.unit == Some(UnitQuantity::Distance))
            .map(|o| o.key.as_str())
            .collect();
        assert_eq!(distance, vec!["StoppingDistance"]);
    }

    #[test]
    fn test_model_option_raises_model_changed() {
        let model = CONTROLS_CATALOG
            .options
            .iter()
            .find(|o| o.key == MODEL)
            .unwrap();
        assert_eq!(model.signal, Some(Signal::ModelChanged));
        assert!(model.requires_reboot);
        assert!(CONTROLS_CATALOG
            .options
            .iter()
            .filter(|o| o.key != MODEL)
            .all(|o| o.signal.is_none()));
    }

    #[test]
    fn test_defaults_are_imperial() {
        assert_eq!(
            CONTROLS_CATALOG.default_measurement_system(),
            Some(MeasurementSystem::Imperial)
        );
        let is_metric = CONTROLS_CATALOG
            .options
            .iter()
            .find(|o| o.key == IS_METRIC)
            .unwrap();
        assert_eq!(is_metric.default, OptionValue::Bool(false));
    }
}
