//! Installation parameters and their validators
//!
//! `InstallationParameters` is built once (interactively or from a config
//! file) and then only borrowed by the stages.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{InstallerError, Result};
use crate::partition::PartitionLayout;

/// Mapping name used when the operator leaves the field empty.
pub const DEFAULT_MAPPING_NAME: &str = "cryptroot";

/// A password that never shows up in logs or `Debug` output.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

/// Everything the stages need, validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallationParameters {
    pub target_disk: PathBuf,
    pub hostname: String,
    pub username: String,
    pub mapping_name: String,
    // Collected for the post-install steps; the provisioning stages never
    // read them.
    pub root_password: Secret,
    pub user_password: Secret,
}

impl InstallationParameters {
    pub fn layout(&self) -> PartitionLayout {
        PartitionLayout::new(&self.target_disk)
    }
}

/// Checks that a disk path names a whole block device.
///
/// Both roots are configurable so tests can point them at a temp tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskValidator {
    pub dev_dir: PathBuf,
    pub sys_block: PathBuf,
}

impl Default for DiskValidator {
    fn default() -> Self {
        Self {
            dev_dir: PathBuf::from("/dev"),
            sys_block: PathBuf::from("/sys/block"),
        }
    }
}

impl DiskValidator {
    pub fn new(dev_dir: impl Into<PathBuf>, sys_block: impl Into<PathBuf>) -> Self {
        Self {
            dev_dir: dev_dir.into(),
            sys_block: sys_block.into(),
        }
    }

    /// `nvme0n1` -> `/dev/nvme0n1`; paths already under the device directory
    /// are kept.
    pub fn normalize(&self, input: &str) -> PathBuf {
        let input = input.trim();
        let path = Path::new(input);
        if path.starts_with(&self.dev_dir) && path != self.dev_dir {
            path.to_path_buf()
        } else {
            self.dev_dir.join(input.trim_start_matches('/'))
        }
    }

    /// Normalize, then require the node to exist and to have a
    /// `<sys_block>/<basename>` entry (partitions and missing disks fail).
    pub fn validate(&self, input: &str) -> Result<PathBuf> {
        if input.trim().is_empty() {
            return Err(InstallerError::validation("disk path is empty"));
        }
        let disk = self.normalize(input);
        if !disk.exists() {
            return Err(InstallerError::validation(format!(
                "{} does not exist",
                disk.display()
            )));
        }
        let name = disk
            .file_name()
            .ok_or_else(|| InstallerError::validation(format!("{} has no device name", disk.display())))?;
        if !self.sys_block.join(name).exists() {
            return Err(InstallerError::validation(format!(
                "{} is not a whole block device",
                disk.display()
            )));
        }
        Ok(disk)
    }
}

/// Hostname: anything non-empty after trimming.
pub fn validate_hostname(input: &str) -> Result<String> {
    let hostname = input.trim();
    if hostname.is_empty() {
        return Err(InstallerError::validation("hostname is empty"));
    }
    Ok(hostname.to_string())
}

/// Username: `[a-z_][a-z0-9_-]*`.
pub fn validate_username(input: &str) -> Result<String> {
    let username = input.trim();
    let mut chars = username.chars();
    let first_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_');
    let rest_ok = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
    if first_ok && rest_ok {
        Ok(username.to_string())
    } else {
        Err(InstallerError::validation(format!(
            "'{username}' is not a valid username (lowercase letters, digits, '_' and '-', not starting with a digit or '-')"
        )))
    }
}

/// Mapping name: empty selects the default, anything else is kept.
pub fn normalize_mapping_name(input: &str) -> String {
    let name = input.trim();
    if name.is_empty() {
        DEFAULT_MAPPING_NAME.to_string()
    } else {
        name.to_string()
    }
}
