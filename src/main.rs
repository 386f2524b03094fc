//! TwixyOS installer - Main entry point
//!
//! Parses the command line, sets up logging and the Ctrl+C handler, and hands
//! off to the installer with a live or dry-run executor.

use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use twixy::cli::{Cli, Commands};
use twixy::config::SystemPaths;
use twixy::config_file::InstallationConfig;
use twixy::engine::storage;
use twixy::error::InstallerError;
use twixy::executor::{DryRunExecutor, Executor, LiveExecutor};
use twixy::input::TerminalPrompter;
use twixy::installer::{Confirmation, InputSource, Installer};
use twixy::params::DiskValidator;
use twixy::{process_guard, sanity, ui};

/// Initialize the logger with appropriate settings
fn init_logger(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    // RUST_LOG overrides the flag
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Main application entry point
fn main() {
    let cli = Cli::parse_args();
    init_logger(cli.verbose);
    info!("TwixyOS installer starting up");

    if let Err(e) = process_guard::init_interrupt_handler() {
        warn!("Failed to initialize interrupt handler: {}", e);
    }
    debug!("Interrupt handler initialized");

    let dry_run = cli.is_dry_run();
    let outcome = match cli.command {
        Some(Commands::Validate { config }) => validate_config(&config),
        Some(Commands::Plan {
            disk,
            mapping_name,
            mount_root,
        }) => print_plan(&disk, mapping_name.as_deref(), mount_root.as_deref()),
        Some(Commands::Install {
            config,
            mount_root,
            grub_defaults,
            mkinitcpio_conf,
        }) => {
            let overrides = PathOverrides {
                mount_root,
                grub_defaults,
                mkinitcpio_conf,
            };
            run_install(config.as_deref(), &overrides, dry_run, cli.yes)
        }
        None => {
            info!("No command specified, running interactive install");
            run_install(None, &PathOverrides::default(), dry_run, cli.yes)
        }
    };

    if let Err(e) = outcome {
        // A prompt or child that failed because of Ctrl+C is still a voluntary exit
        if e.is_interrupt() || process_guard::interrupted() {
            process_guard::exit_interrupted();
        }
        error!("{}", e);
        ui::print_error(&e.to_string());
        std::process::exit(e.exit_code());
    }
}

#[derive(Debug, Default)]
struct PathOverrides {
    mount_root: Option<PathBuf>,
    grub_defaults: Option<PathBuf>,
    mkinitcpio_conf: Option<PathBuf>,
}

impl PathOverrides {
    fn apply(&self, paths: SystemPaths) -> SystemPaths {
        paths.with_overrides(
            self.mount_root.as_deref(),
            self.grub_defaults.as_deref(),
            self.mkinitcpio_conf.as_deref(),
        )
    }
}

fn validate_config(path: &Path) -> Result<(), InstallerError> {
    info!("Validating configuration file: {:?}", path);
    let config = InstallationConfig::load_from_file(path)?;
    let disks = DiskValidator {
        sys_block: config.paths.sys_block.clone(),
        ..DiskValidator::default()
    };
    match config.validate(&disks) {
        Ok(()) => {
            info!("Configuration validation successful");
            println!("✓ Configuration file is valid: {}", path.display());
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed: {:#}", e);
            Err(e.into())
        }
    }
}

fn print_plan(
    disk: &str,
    mapping_name: Option<&str>,
    mount_root: Option<&Path>,
) -> Result<(), InstallerError> {
    let defaults = SystemPaths::default();
    let plan = storage::plan_from_input(
        &DiskValidator::default(),
        disk,
        mapping_name,
        mount_root.unwrap_or(defaults.mount_root.as_path()),
    )?;
    println!("{}", plan.summary());
    Ok(())
}

fn run_install(
    config_path: Option<&Path>,
    overrides: &PathOverrides,
    dry_run: bool,
    assume_yes: bool,
) -> Result<(), InstallerError> {
    let (source, paths) = match config_path {
        Some(path) => {
            info!("Running headless installation with config: {:?}", path);
            let config = InstallationConfig::load_from_file(path)?;
            let paths = overrides.apply(config.paths.clone());
            (InputSource::ConfigFile(config), paths)
        }
        None => (InputSource::Interactive, overrides.apply(SystemPaths::default())),
    };

    ui::print_banner();

    if dry_run {
        ui::print_warning("Dry-run mode: nothing will be partitioned or written. Pass --apply to install.");
        let mut installer = Installer::new(DryRunExecutor::new(), paths, Confirmation::Granted);
        let result = drive(&mut installer, source);
        println!("\n{}", installer.executor().summary());
        return result;
    }

    sanity::run_preflight_checks()?;
    let confirmation = if assume_yes {
        Confirmation::Granted
    } else {
        Confirmation::Ask
    };
    let mut installer = Installer::new(LiveExecutor, paths, confirmation);
    drive(&mut installer, source)
}

fn drive<E: Executor>(installer: &mut Installer<E>, source: InputSource) -> Result<(), InstallerError> {
    let mut prompter = TerminalPrompter;
    match installer.run(source, &mut prompter) {
        Ok(params) => {
            info!(
                "Installed {} for {}@{} on {}",
                twixy::config::DISTRO_NAME,
                params.username,
                params.hostname,
                params.target_disk.display()
            );
            Ok(())
        }
        Err(e) => {
            if e.is_interrupt() || process_guard::interrupted() {
                return Err(e);
            }
            if let Some(stage) = installer.context().failed_at() {
                ui::print_error(&format!("Installation failed during: {}", stage.description()));
            }
            Err(e)
        }
    }
}
