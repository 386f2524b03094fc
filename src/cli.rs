use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// TwixyOS installer - encrypted Btrfs on LUKS2 for Arch Linux
#[derive(Parser)]
#[command(name = "twixy-installer")]
#[command(about = "Secure Arch Linux installer: LUKS2, Btrfs subvolumes, GRUB and mkinitcpio")]
#[command(version)]
pub struct Cli {
    /// Dry-run mode: show what would be executed without making changes.
    ///
    /// This is the default. Read-only probes (lsblk, blkid) still run so the
    /// preview is realistic; configuration files are read but never written.
    #[arg(long, global = true, conflicts_with = "apply")]
    pub dry_run: bool,

    /// Actually partition, encrypt and configure the target system.
    #[arg(long, global = true)]
    pub apply: bool,

    /// Skip the "all data will be lost" confirmation in apply mode.
    #[arg(short, long, global = true)]
    pub yes: bool,

    /// Debug-level logging on stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the installer (interactive unless --config is given)
    Install {
        /// Path to configuration file to use (skips the questionnaire)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Mount point of the target system
        #[arg(long)]
        mount_root: Option<PathBuf>,

        /// GRUB defaults file to rewrite
        #[arg(long)]
        grub_defaults: Option<PathBuf>,

        /// mkinitcpio configuration file to rewrite
        #[arg(long)]
        mkinitcpio_conf: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        /// Path to configuration file to validate
        config: PathBuf,
    },
    /// Print the disk operations for a disk without running them
    Plan {
        /// Target disk, e.g. /dev/nvme0n1 or nvme0n1
        disk: String,

        /// LUKS mapping name (default: cryptroot)
        #[arg(short, long)]
        mapping_name: Option<String>,

        /// Mount point of the target system
        #[arg(long)]
        mount_root: Option<PathBuf>,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }

    /// True unless `--apply` was given.
    pub fn is_dry_run(&self) -> bool {
        !self.apply
    }
}
