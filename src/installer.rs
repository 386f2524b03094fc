//! Installer module
//!
//! Drives the stages in order through the install state machine. The first
//! error from any stage marks the run as failed at that stage and is returned
//! to the caller unchanged; nothing after it runs.

use tracing::{info, warn};

use crate::config::SystemPaths;
use crate::config_file::InstallationConfig;
use crate::engine::{bootloader, initramfs, storage};
use crate::error::{InstallerError, Result};
use crate::executor::Executor;
use crate::input::{self, Prompter};
use crate::install_state::{InstallStage, InstallerContext};
use crate::params::{DiskValidator, InstallationParameters};
use crate::ui;

/// Where the installation parameters come from.
#[derive(Debug, Clone)]
pub enum InputSource {
    /// Ask the operator
    Interactive,
    /// Headless config file (passwords may still be asked for)
    ConfigFile(InstallationConfig),
}

/// How the destructive disk stage gets authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// Authorized up front (`--yes`, or a dry run that cannot destroy anything)
    Granted,
    /// Ask the operator once the target disk is known
    Ask,
}

/// Installer instance
pub struct Installer<E: Executor> {
    executor: E,
    paths: SystemPaths,
    disks: DiskValidator,
    confirmation: Confirmation,
    context: InstallerContext,
}

impl<E: Executor> Installer<E> {
    pub fn new(executor: E, paths: SystemPaths, confirmation: Confirmation) -> Self {
        let disks = DiskValidator {
            sys_block: paths.sys_block.clone(),
            ..DiskValidator::default()
        };
        Self {
            executor,
            paths,
            disks,
            confirmation,
            context: InstallerContext::new(),
        }
    }

    /// Validate disks against a different device tree.
    pub fn with_disk_validator(mut self, disks: DiskValidator) -> Self {
        self.disks = disks;
        self
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn context(&self) -> &InstallerContext {
        &self.context
    }

    pub fn paths(&self) -> &SystemPaths {
        &self.paths
    }

    /// Run every stage. Returns the parameters that were installed with.
    pub fn run(
        &mut self,
        source: InputSource,
        prompter: &mut dyn Prompter,
    ) -> Result<InstallationParameters> {
        let params = self.collect_input(source, prompter)?;
        self.authorize(&params, prompter)?;
        self.provision(&params)?;
        Ok(params)
    }

    /// Stage 1: build the parameters.
    pub fn collect_input(
        &mut self,
        source: InputSource,
        prompter: &mut dyn Prompter,
    ) -> Result<InstallationParameters> {
        self.enter(InstallStage::CollectingInput)?;
        let result = match source {
            InputSource::Interactive => {
                input::collect_parameters(prompter, &mut self.executor, &self.disks)
            }
            InputSource::ConfigFile(config) => config.to_parameters(&self.disks, prompter),
        };
        self.guard(result)
    }

    /// Record the destructive confirmation according to the policy.
    pub fn authorize(
        &mut self,
        params: &InstallationParameters,
        prompter: &mut dyn Prompter,
    ) -> Result<()> {
        if self.confirmation == Confirmation::Ask {
            let question = format!(
                "All of the data on {} will be lost. Do you want to continue?",
                params.target_disk.display()
            );
            let confirmed = self.guard(prompter.confirm(&question))?;
            if !confirmed {
                return self.guard(Err(InstallerError::Cancelled {
                    disk: params.target_disk.clone(),
                }));
            }
        }
        self.context.confirm_destructive_operations();
        Ok(())
    }

    /// Stages 2-4: disk, GRUB, mkinitcpio.
    pub fn provision(&mut self, params: &InstallationParameters) -> Result<()> {
        ui::print_info("Starting disk preparation...");
        self.run_stage(InstallStage::ProvisioningDisk, |executor, paths| {
            let plan = storage::calculate_storage_plan(
                &params.target_disk,
                &params.mapping_name,
                &paths.mount_root,
            )?;
            info!("{}", plan.summary());
            storage::execute_plan(&plan, executor)
        })?;
        ui::print_success("Disk preparation completed.");

        ui::print_info("Configuring GRUB bootloader...");
        self.run_stage(InstallStage::ConfiguringBootloader, |executor, paths| {
            bootloader::configure_grub(params, paths, executor)
        })?;
        ui::print_success("GRUB configuration completed.");

        ui::print_info("Configuring mkinitcpio...");
        self.run_stage(InstallStage::ConfiguringInitramfs, |executor, paths| {
            initramfs::configure_mkinitcpio(paths, executor)
        })?;
        ui::print_success("mkinitcpio configuration completed.");

        self.enter(InstallStage::Completed)?;
        ui::print_success("\nInstallation completed successfully!");
        Ok(())
    }

    fn run_stage<F>(&mut self, stage: InstallStage, work: F) -> Result<()>
    where
        F: FnOnce(&mut dyn Executor, &SystemPaths) -> Result<()>,
    {
        self.enter(stage)?;
        if let Some(heading) = stage.heading() {
            ui::print_heading(heading);
        }
        let result = work(&mut self.executor, &self.paths);
        self.guard(result)
    }

    /// Transition, marking the run failed if the transition is refused.
    fn enter(&mut self, stage: InstallStage) -> Result<()> {
        let result = self
            .context
            .transition_to(stage)
            .map(|_| ())
            .map_err(InstallerError::from);
        self.guard(result)
    }

    fn guard<T>(&mut self, result: Result<T>) -> Result<T> {
        if result.is_err() && !self.context.current_stage().is_terminal() {
            if let Err(e) = self.context.fail() {
                warn!("Could not record failure: {}", e);
            }
        }
        result
    }
}
