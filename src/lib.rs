//! TwixyOS installer library
//!
//! Disk provisioning (GPT, LUKS2, Btrfs subvolumes), GRUB configuration and
//! mkinitcpio configuration for an encrypted Arch Linux install.

pub mod cli;
pub mod config;
pub mod config_edit;
pub mod config_file;
pub mod engine;
pub mod error;
pub mod executor;
pub mod input;
pub mod install_state;
pub mod installer;
pub mod params;
pub mod partition;
pub mod process_guard;
pub mod sanity;
pub mod tool_traits;
pub mod tools;
pub mod ui;

// Re-export main types for convenience
pub use config::SystemPaths;
pub use config_file::InstallationConfig;
pub use error::{InstallerError, Result};
pub use executor::{DryRunExecutor, Executor, Invocation, LiveExecutor, RecordingExecutor};
pub use input::{Prompter, ScriptedPrompter, TerminalPrompter};
pub use install_state::{InstallStage, InstallTransitionError, InstallerContext};
pub use installer::{Confirmation, InputSource, Installer};
pub use params::{DiskValidator, InstallationParameters, Secret};
pub use partition::{PartitionLayout, PartitionNaming};
pub use process_guard::CommandDeathPact;
pub use tool_traits::ToolArgs;

// Stage engines
pub use engine::bootloader::{configure_grub, rewrite_grub_defaults};
pub use engine::initramfs::{configure_mkinitcpio, rewrite_mkinitcpio_conf};
pub use engine::storage::{StorageOp, StoragePlan, calculate_storage_plan, execute_plan};
