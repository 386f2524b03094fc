//! Configuration management module
//!
//! Fixed installer identity plus the system paths every stage works against.
//! Paths default to a standard Arch live environment and can be overridden by
//! the config file or by CLI flags (flags win).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Filesystem label, bootloader id and banner name.
pub const DISTRO_NAME: &str = "TwixyOS";

/// Version shown under the banner.
pub const INSTALLER_VERSION: &str = "v3.0";

/// `grub-install --target` for UEFI machines.
pub const GRUB_TARGET: &str = "x86_64-efi";

/// Where the stages read, write and mount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemPaths {
    /// Root of the new system's mount tree
    pub mount_root: PathBuf,
    /// GRUB defaults file rewritten by the bootloader stage
    pub grub_defaults: PathBuf,
    /// mkinitcpio configuration rewritten by the initramfs stage
    pub mkinitcpio_conf: PathBuf,
    /// Kernel block-device directory used by disk validation
    pub sys_block: PathBuf,
    /// `grub-install --efi-directory`
    pub efi_directory: PathBuf,
    /// `grub-mkconfig -o`
    pub grub_cfg: PathBuf,
}

impl Default for SystemPaths {
    fn default() -> Self {
        Self {
            mount_root: PathBuf::from("/mnt"),
            grub_defaults: PathBuf::from("/etc/default/grub"),
            mkinitcpio_conf: PathBuf::from("/etc/mkinitcpio.conf"),
            sys_block: PathBuf::from("/sys/block"),
            efi_directory: PathBuf::from("/boot/efi"),
            grub_cfg: PathBuf::from("/boot/grub/grub.cfg"),
        }
    }
}

impl SystemPaths {
    /// Apply CLI overrides on top of these paths.
    pub fn with_overrides(
        mut self,
        mount_root: Option<&Path>,
        grub_defaults: Option<&Path>,
        mkinitcpio_conf: Option<&Path>,
    ) -> Self {
        if let Some(path) = mount_root {
            self.mount_root = path.to_path_buf();
        }
        if let Some(path) = grub_defaults {
            self.grub_defaults = path.to_path_buf();
        }
        if let Some(path) = mkinitcpio_conf {
            self.mkinitcpio_conf = path.to_path_buf();
        }
        self
    }
}
