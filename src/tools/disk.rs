//! Type-safe arguments for partitioning, filesystem and mount tools.
//!
//! - `PartedArgs` for `parted -s`
//! - `MkfsFatArgs` / `MkfsBtrfsArgs` for filesystem creation
//! - `SubvolumeCreateArgs` for `btrfs subvolume create`
//! - `MountArgs` / `UmountArgs` for the mount topology
//! - `LsblkDisksArgs` / `BlkidUuidArgs` for read-only probes

use std::path::PathBuf;

use crate::tool_traits::ToolArgs;

/// What a single `parted -s` call does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartedAction {
    /// `mklabel gpt`
    MkLabelGpt,
    /// `mkpart <name> [fs-type] <start> <end>`
    MkPart {
        name: String,
        fs_type: Option<String>,
        start: String,
        end: String,
    },
    /// `set <number> <flag> on|off`
    SetFlag { partition: u32, flag: String, on: bool },
}

/// Type-safe arguments for `parted`.
///
/// Always script mode (`-s`): parted must never stop and ask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartedArgs {
    pub disk: PathBuf,
    pub action: PartedAction,
}

impl ToolArgs for PartedArgs {
    fn program(&self) -> &'static str {
        "parted"
    }

    fn to_cli_args(&self) -> Vec<String> {
        let mut args = vec!["-s".to_string(), self.disk.display().to_string()];
        match &self.action {
            PartedAction::MkLabelGpt => {
                args.push("mklabel".to_string());
                args.push("gpt".to_string());
            }
            PartedAction::MkPart {
                name,
                fs_type,
                start,
                end,
            } => {
                args.push("mkpart".to_string());
                args.push(name.clone());
                if let Some(fs_type) = fs_type {
                    args.push(fs_type.clone());
                }
                args.push(start.clone());
                args.push(end.clone());
            }
            PartedAction::SetFlag { partition, flag, on } => {
                args.push("set".to_string());
                args.push(partition.to_string());
                args.push(flag.clone());
                args.push(if *on { "on" } else { "off" }.to_string());
            }
        }
        args
    }
}

/// `mkfs.fat -F32 <device>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MkfsFatArgs {
    pub device: PathBuf,
}

impl ToolArgs for MkfsFatArgs {
    fn program(&self) -> &'static str {
        "mkfs.fat"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec!["-F32".to_string(), self.device.display().to_string()]
    }
}

/// `mkfs.btrfs -L <label> <device>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MkfsBtrfsArgs {
    pub device: PathBuf,
    pub label: String,
}

impl ToolArgs for MkfsBtrfsArgs {
    fn program(&self) -> &'static str {
        "mkfs.btrfs"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![
            "-L".to_string(),
            self.label.clone(),
            self.device.display().to_string(),
        ]
    }
}

/// `btrfs subvolume create <path>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubvolumeCreateArgs {
    pub path: PathBuf,
}

impl ToolArgs for SubvolumeCreateArgs {
    fn program(&self) -> &'static str {
        "btrfs"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![
            "subvolume".to_string(),
            "create".to_string(),
            self.path.display().to_string(),
        ]
    }
}

/// `mount [-o <options>] <device> <target>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountArgs {
    pub device: PathBuf,
    pub target: PathBuf,
    pub options: Option<String>,
}

impl ToolArgs for MountArgs {
    fn program(&self) -> &'static str {
        "mount"
    }

    fn to_cli_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(4);
        if let Some(ref options) = self.options {
            args.push("-o".to_string());
            args.push(options.clone());
        }
        args.push(self.device.display().to_string());
        args.push(self.target.display().to_string());
        args
    }
}

/// `umount <target>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UmountArgs {
    pub target: PathBuf,
}

impl ToolArgs for UmountArgs {
    fn program(&self) -> &'static str {
        "umount"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![self.target.display().to_string()]
    }
}

/// `lsblk -d -o NAME,SIZE`: the disk listing shown before the disk prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LsblkDisksArgs;

impl ToolArgs for LsblkDisksArgs {
    fn program(&self) -> &'static str {
        "lsblk"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec!["-d".to_string(), "-o".to_string(), "NAME,SIZE".to_string()]
    }

    fn is_destructive(&self) -> bool {
        false
    }
}

/// `blkid -s UUID -o value <device>`: prints just the UUID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlkidUuidArgs {
    pub device: PathBuf,
}

impl ToolArgs for BlkidUuidArgs {
    fn program(&self) -> &'static str {
        "blkid"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![
            "-s".to_string(),
            "UUID".to_string(),
            "-o".to_string(),
            "value".to_string(),
            self.device.display().to_string(),
        ]
    }

    fn is_destructive(&self) -> bool {
        false
    }
}
