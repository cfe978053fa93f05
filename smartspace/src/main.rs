//! SmartSpace - Entry Point
//!
//! Profile-scoped device and routine registries for the SmartSpace
//! dashboard, served over a local HTTP API.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::{error, info, warn};

use smartspace::app::dashboard::Dashboard;
use smartspace::app::options::AppOptions;
use smartspace::app::run::run;
use smartspace::app::state::open_store;
use smartspace::logs::{init_logging, LogLevel, LogOptions};
use smartspace::models::{DeviceStatus, ProfileId};
use smartspace::notify::LogNotifier;
use smartspace::storage::layout::StorageLayout;
use smartspace::storage::settings::Settings;
use smartspace::utils::version_info;

#[derive(Parser)]
#[command(name = "smartspace", about = "SmartSpace dashboard core")]
struct Cli {
    /// Storage base directory (default: $SMARTSPACE_HOME or ~/.smartspace)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the local API server (default).
    Serve,

    /// Print version information.
    Version,

    /// Show or change the active profile.
    Profile {
        #[command(subcommand)]
        action: Option<ProfileAction>,
    },

    /// List the devices of the active profile.
    Devices,

    /// List the routines of the active profile.
    Routines,
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Make a profile the active one.
    Set { profile: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Serve);

    // Print version and exit
    if let Command::Version = command {
        println!("{}", serde_json::to_string_pretty(&version_info())?);
        return Ok(());
    }

    let layout = cli.dir.map(StorageLayout::new).unwrap_or_default();
    layout
        .setup()
        .with_context(|| format!("Unable to set up {}", layout.base_dir.display()))?;

    let settings = Settings::load(&layout.settings_file()).context("Unable to read settings file")?;

    // Listing commands keep stdout for their own output
    let serving = matches!(command, Command::Serve);
    let log_options = LogOptions {
        log_level: if serving {
            settings.log_level
        } else {
            LogLevel::Warn
        },
        json_format: settings.log_json,
        log_dir: (serving && settings.log_to_file).then(|| layout.logs_dir().path().to_path_buf()),
        ..Default::default()
    };
    let _log_guard = match init_logging(log_options) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            None
        }
    };

    let options = AppOptions::new(layout, settings);
    match command {
        Command::Serve => {
            info!("Running SmartSpace with options: {:?}", options);
            if let Err(e) = run(options, await_shutdown_signal()).await {
                error!("Failed to run: {e}");
                return Err(e).context("SmartSpace stopped with an error");
            }
        }
        Command::Version => {}
        Command::Profile { action } => {
            let store = open_store(&options).context("Unable to open the store")?;
            if let Some(ProfileAction::Set { profile }) = action {
                let profile = profile.trim();
                anyhow::ensure!(!profile.is_empty(), "Profile must not be empty");
                store
                    .set_active_profile(&ProfileId::new(profile))
                    .context("Unable to record the active profile")?;
            }
            print_profiles(&store.active_profile());
        }
        Command::Devices => {
            let store = open_store(&options).context("Unable to open the store")?;
            print_devices(&Dashboard::open(store, Arc::new(LogNotifier)));
        }
        Command::Routines => {
            let store = open_store(&options).context("Unable to open the store")?;
            print_routines(&Dashboard::open(store, Arc::new(LogNotifier)));
        }
    }

    Ok(())
}

fn print_profiles(active: &ProfileId) {
    let mut profiles = ProfileId::builtin();
    if !profiles.contains(active) {
        profiles.push(active.clone());
    }
    for profile in profiles {
        if &profile == active {
            println!("{} {}", "*".green(), profile.display_name().bold());
        } else {
            println!("  {}", profile.display_name());
        }
    }
}

fn print_devices(dashboard: &Dashboard) {
    println!("{}", dashboard.profile().display_name().bold());
    let devices = dashboard.devices().devices();
    if devices.is_empty() {
        println!("  {}", "No devices".dimmed());
    }
    for device in devices {
        let status = match device.status {
            DeviceStatus::Online => device.status.as_str().green(),
            DeviceStatus::Offline => device.status.as_str().red(),
        };
        println!(
            "  {:>14}  {:<28} {:<14} {:<8} {}",
            device.id,
            device.name,
            device.kind.as_str(),
            status,
            device.location.dimmed()
        );
    }
}

fn print_routines(dashboard: &Dashboard) {
    println!("{}", dashboard.profile().display_name().bold());
    let routines = dashboard.routines().routines();
    if routines.is_empty() {
        println!("  {}", "No routines".dimmed());
    }
    for routine in routines {
        let active = if routine.active {
            "active".green()
        } else {
            "inactive".yellow()
        };
        println!(
            "  {:>14}  {:<24} {:<8} {:<6} {}",
            routine.id,
            routine.name,
            routine.schedule.to_string(),
            routine.priority.as_str(),
            active
        );
    }
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
                _ => {
                    warn!("Unable to install signal handlers, waiting for Ctrl+C only");
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
        }
        info!("Ctrl+C received, shutting down...");
    }
}
