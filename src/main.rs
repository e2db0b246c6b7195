// src/main.rs

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use frogpilot_toggles::{
    config::{self, PanelConfig},
    constants::DEFAULT_CONFIG_FILE,
    groups::VisibilityMap,
    panel::{ControlsPanel, PanelUpdate, ResetScope},
    store::FileStore,
    toggles::definitions::CONTROLS_CATALOG,
    units::MeasurementSystem,
};
use tracing::{info, warn, Level};

#[derive(Parser, Debug)]
#[command(
    name = "frogpilot-toggles",
    version,
    about = "Inspect and edit FrogPilot driving-controls toggles"
)]
struct Cli {
    /// Config file, created with defaults if missing.
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Overrides the persistent parameter directory.
    #[arg(long)]
    params_dir: Option<PathBuf>,

    /// Overrides the volatile parameter directory.
    #[arg(long)]
    memory_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every option with its value and visibility.
    Show,
    /// Print one option.
    Get { key: String },
    /// Edit one option.
    Set { key: String, value: String },
    /// Restore factory values, for everything or one group.
    Reset {
        #[arg(long)]
        group: Option<String>,
    },
    /// Switch between metric and imperial units.
    Units { system: MeasurementSystem },
    /// List the dependency groups.
    Groups,
}

type Panel = ControlsPanel<FileStore, FileStore>;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // The log level lives in the config, so report how it was loaded once
    // the subscriber is up.
    let existed = cli.config.exists();
    let mut config = config::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;
    init_tracing(&config);
    if existed {
        info!("Loaded config from {}.", cli.config.display());
    } else {
        info!("No config at {}, wrote defaults.", cli.config.display());
    }

    if let Some(dir) = cli.params_dir {
        config.params_dir = dir;
    }
    if let Some(dir) = cli.memory_dir {
        config.memory_params_dir = dir;
    }

    let mut panel = open_panel(&config)?;
    let report = panel.load().context("Failed to load toggles")?;
    if report.reboot_required {
        println!("Defaults were written for options that need a reboot.");
    }

    match cli.command {
        Command::Show => {
            let update = panel.on_panel_shown().context("Failed to refresh toggles")?;
            if !update.converted.is_empty() {
                println!(
                    "Converted {} options to the current units.",
                    update.converted.len()
                );
            }
            report_signals(&update);
            show(&panel)?
        }
        Command::Get { key } => {
            let value = panel.get(&key)?;
            let spec = panel.registry().spec(&key)?;
            match spec.unit {
                Some(quantity) => println!(
                    "{} = {} {}",
                    key,
                    value,
                    quantity.label(panel.measurement_system()?)
                ),
                None => println!("{} = {}", key, value),
            }
        }
        Command::Set { key, value } => {
            let before = panel.resolve_all()?;
            let update = panel
                .on_toggle_edited(&key, value)
                .with_context(|| format!("Failed to set {}", key))?;
            report_update(&before, &update);
        }
        Command::Reset { group } => {
            let scope = group.map_or(ResetScope::All, ResetScope::Group);
            let before = panel.resolve_all()?;
            let update = panel
                .on_reset_requested(&scope)
                .with_context(|| format!("Failed to reset {:?}", scope))?;
            report_update(&before, &update);
        }
        Command::Units { system } => {
            let before = panel.resolve_all()?;
            match panel
                .on_unit_system_changed(system)
                .with_context(|| format!("Failed to switch to {} units", system))?
            {
                Some(update) => {
                    println!("Converted {} options to {}.", update.converted.len(), system);
                    report_update(&before, &update);
                }
                None => println!("Already using {} units.", system),
            }
        }
        Command::Groups => {
            for group in panel.groups().iter() {
                let members: Vec<&str> = group.members.iter().map(String::as_str).collect();
                println!("{} (parent {}): {}", group.name, group.parent, members.join(", "));
            }
        }
    }

    Ok(())
}

fn init_tracing(config: &PanelConfig) {
    let level = config.log_level.parse::<Level>();
    tracing_subscriber::fmt()
        .with_max_level(*level.as_ref().unwrap_or(&Level::INFO))
        .with_target(false)
        .init();
    if level.is_err() {
        warn!("Unknown log level '{}', using info.", config.log_level);
    }
}

fn open_panel(config: &PanelConfig) -> anyhow::Result<Panel> {
    let params = FileStore::new(&config.params_dir);
    let memory = FileStore::new(&config.memory_params_dir);
    info!(
        "Using params at {} and {}.",
        config.params_dir.display(),
        config.memory_params_dir.display()
    );
    ControlsPanel::new(&CONTROLS_CATALOG, params, memory).context("Invalid toggle catalog")
}

fn show(panel: &Panel) -> anyhow::Result<()> {
    let visibility = panel.resolve_all()?;
    let system = panel.measurement_system()?;
    println!("Units: {}", system);
    for spec in panel.registry().specs() {
        let value = panel.get(&spec.key)?;
        let unit = spec.unit.map(|q| q.label(system)).unwrap_or_default();
        let hidden = if visibility.get(&spec.key) == Some(&false) {
            " (hidden)"
        } else {
            ""
        };
        let reboot = if spec.requires_reboot { " [reboot]" } else { "" };
        println!("{:<28} {} {}{}{}", spec.key, value, unit, hidden, reboot);
    }
    Ok(())
}

fn report_update(before: &VisibilityMap, update: &PanelUpdate) {
    for (key, visible) in &update.visibility {
        if before.get(key) != Some(visible) {
            println!("{} is now {}", key, if *visible { "shown" } else { "hidden" });
        }
    }
    if update.reboot_required {
        println!("Reboot required for the change to take effect.");
    }
    report_signals(update);
}

fn report_signals(update: &PanelUpdate) {
    for signal in &update.failed_signals {
        warn!("{} -> Could not notify other processes.", signal.key());
    }
}
