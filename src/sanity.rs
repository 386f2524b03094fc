//! Pre-flight sanity checks for runtime environment
//!
//! Before an `--apply` run this module verifies:
//! - Every system tool the stages call is present
//! - Running with root privileges (EUID 0)
//!
//! A failed check is returned as `InstallerError::Preflight` with a report
//! naming the Arch package for each missing tool.

use std::process::{Command, Stdio};

use tracing::{debug, info, warn};

use crate::error::{InstallerError, Result};
use crate::process_guard::CommandDeathPact;

/// Result of environment verification
#[derive(Debug)]
pub struct SanityCheckResult {
    pub missing_binaries: Vec<String>,
    pub is_root: bool,
}

impl SanityCheckResult {
    /// Returns true if all checks passed
    pub fn is_ok(&self) -> bool {
        self.missing_binaries.is_empty() && self.is_root
    }

    /// Human-readable explanation of every failed check.
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        if !self.is_root {
            lines.push("Root privileges required.".to_string());
            lines.push(
                "   The installer partitions disks and rewrites /etc; run it as root.".to_string(),
            );
        }

        if !self.missing_binaries.is_empty() {
            lines.push("Missing required binaries:".to_string());
            for binary in &self.missing_binaries {
                lines.push(format!(
                    "   • {} (install: pacman -S {})",
                    binary,
                    get_package_for_binary(binary)
                ));
            }
            let mut packages: Vec<&str> = self
                .missing_binaries
                .iter()
                .map(|b| get_package_for_binary(b))
                .collect();
            packages.sort_unstable();
            packages.dedup();
            lines.push(format!("   Solution: pacman -S {}", packages.join(" ")));
        }

        lines.join("\n")
    }
}

/// Every program the stages invoke.
pub const REQUIRED_BINARIES: &[&str] = &[
    "lsblk",         // Disk listing (util-linux)
    "parted",        // GPT partitioning
    "mkfs.fat",      // ESP filesystem (dosfstools)
    "cryptsetup",    // LUKS2
    "mkfs.btrfs",    // Root filesystem (btrfs-progs)
    "btrfs",         // Subvolumes (btrfs-progs)
    "mount",         // util-linux
    "umount",        // util-linux
    "blkid",         // LUKS UUID lookup (util-linux)
    "grub-install",  // grub
    "grub-mkconfig", // grub
    "mkinitcpio",    // Initramfs generation
];

/// Check if a binary is available in PATH
fn binary_exists(name: &str) -> bool {
    Command::new("which")
        .arg(name)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .with_parent_death_signal()
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

fn is_running_as_root() -> bool {
    nix::unistd::geteuid().is_root()
}

/// Check `binaries` and root privileges.
pub fn verify_environment(binaries: &[&str]) -> SanityCheckResult {
    let missing_binaries = binaries
        .iter()
        .filter(|binary| !binary_exists(binary))
        .map(|binary| (*binary).to_string())
        .collect();

    SanityCheckResult {
        missing_binaries,
        is_root: is_running_as_root(),
    }
}

/// Map binary names to their Arch Linux package names
fn get_package_for_binary(binary: &str) -> &'static str {
    match binary {
        "lsblk" | "mount" | "umount" | "blkid" => "util-linux",
        "parted" => "parted",
        "mkfs.fat" => "dosfstools",
        "cryptsetup" => "cryptsetup",
        "mkfs.btrfs" | "btrfs" => "btrfs-progs",
        "grub-install" | "grub-mkconfig" => "grub",
        "mkinitcpio" => "mkinitcpio",
        _ => "unknown",
    }
}

/// Skip root check (for development/testing)
/// Set TWIXY_SKIP_ROOT_CHECK=1 to skip
pub fn should_skip_root_check() -> bool {
    std::env::var("TWIXY_SKIP_ROOT_CHECK")
        .map(|v| v == "1" || v.to_lowercase() == "true")
        .unwrap_or(false)
}

/// Run every pre-flight check.
pub fn run_preflight_checks() -> Result<()> {
    debug!("Running pre-flight sanity checks...");

    let mut result = verify_environment(REQUIRED_BINARIES);

    if should_skip_root_check() {
        warn!("Root check skipped (TWIXY_SKIP_ROOT_CHECK=1)");
        result.is_root = true;
    }

    if !result.is_ok() {
        return Err(InstallerError::preflight(result.report()));
    }

    info!("Pre-flight checks passed");
    Ok(())
}
