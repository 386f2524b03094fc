//! Storage Stack Engine
//!
//! Translates the target disk and LUKS mapping name into an ordered sequence
//! of atomic `StorageOp` operations, then executes them one by one.
//!
//! # Resulting Layout
//!
//! ```text
//! <disk>1  ESP, FAT32                      -> <root>/boot/efi
//! <disk>2  LUKS2 -> /dev/mapper/<mapping>
//!            btrfs "TwixyOS"
//!              @           -> <root>
//!              @boot       -> <root>/boot
//!              @home       -> <root>/home
//!              @snapshots  -> <root>/.snapshots
//!              @var_log    -> <root>/var/log
//! ```
//!
//! # Design
//!
//! - **Pure plan**: `calculate_storage_plan` does no I/O
//! - **Typed output**: each `StorageOp` carries a `ToolArgs` struct
//! - **Fail-fast execution**: the first failing operation ends the stage and
//!   nothing after it runs; nothing already done is undone

use std::fmt;
use std::path::{Path, PathBuf};

use strum::{EnumIter, IntoEnumIterator};
use tracing::{debug, info};

use crate::config::DISTRO_NAME;
use crate::error::{InstallerError, Result};
use crate::executor::{Executor, Invocation};
use crate::params::{normalize_mapping_name, DiskValidator};
use crate::partition::{PartitionLayout, PartitionNaming};
use crate::tool_traits::ToolArgs;
use crate::tools::disk::{
    LsblkDisksArgs, MkfsBtrfsArgs, MkfsFatArgs, MountArgs, PartedAction, PartedArgs,
    SubvolumeCreateArgs, UmountArgs,
};
use crate::tools::encryption::{mapper_path, LuksFormatArgs, LuksOpenArgs, LuksParams};
use crate::ui;

// ============================================================================
// Subvolumes
// ============================================================================

/// The fixed Btrfs subvolume set. Declaration order is creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Subvolume {
    Root,
    Home,
    Snapshots,
    Boot,
    VarLog,
}

impl Subvolume {
    /// Order in which the subvolumes are mounted: `@` first, then every
    /// mount point before anything below it.
    pub const MOUNT_ORDER: [Subvolume; 5] = [
        Subvolume::Root,
        Subvolume::Boot,
        Subvolume::Home,
        Subvolume::Snapshots,
        Subvolume::VarLog,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Root => "@",
            Self::Home => "@home",
            Self::Snapshots => "@snapshots",
            Self::Boot => "@boot",
            Self::VarLog => "@var_log",
        }
    }

    /// Mount point relative to the mount root (empty for `@`).
    pub fn mount_point(self) -> &'static str {
        match self {
            Self::Root => "",
            Self::Home => "home",
            Self::Snapshots => ".snapshots",
            Self::Boot => "boot",
            Self::VarLog => "var/log",
        }
    }

    /// `noatime,compress=zstd:3,subvol=<name>`
    pub fn mount_options(self) -> String {
        format!("noatime,compress=zstd:3,subvol={}", self.name())
    }

    /// Creation order.
    pub fn creation_order() -> impl Iterator<Item = Subvolume> {
        Self::iter()
    }
}

// ============================================================================
// Storage Operation Types
// ============================================================================

/// A single atomic storage operation in the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageOp {
    /// Show `lsblk` so the operator sees what is about to be wiped
    ListDisks,
    /// `mkdir -p`
    EnsureDir { path: PathBuf },
    /// `parted -s` (label, partitions, flags)
    Partition(PartedArgs),
    /// FAT32 on the ESP
    FormatEsp(MkfsFatArgs),
    /// LUKS2 container on partition 2
    LuksFormat(LuksFormatArgs),
    /// Unlock the container as `/dev/mapper/<mapping>`
    LuksOpen(LuksOpenArgs),
    /// Btrfs on the mapper device
    FormatBtrfs(MkfsBtrfsArgs),
    CreateSubvolume(SubvolumeCreateArgs),
    Mount(MountArgs),
    Unmount(UmountArgs),
}

impl StorageOp {
    /// The external command for this operation, if it is one.
    pub fn invocation(&self) -> Option<Invocation> {
        match self {
            Self::ListDisks => Some(LsblkDisksArgs.invocation()),
            Self::EnsureDir { .. } => None,
            Self::Partition(args) => Some(args.invocation()),
            Self::FormatEsp(args) => Some(args.invocation()),
            Self::LuksFormat(args) => Some(args.invocation()),
            Self::LuksOpen(args) => Some(args.invocation()),
            Self::FormatBtrfs(args) => Some(args.invocation()),
            Self::CreateSubvolume(args) => Some(args.invocation()),
            Self::Mount(args) => Some(args.invocation()),
            Self::Unmount(args) => Some(args.invocation()),
        }
    }

    /// Perform this operation through `executor`.
    pub fn execute(&self, executor: &mut dyn Executor) -> Result<()> {
        match self {
            Self::EnsureDir { path } => executor.create_dir_all(path),
            Self::ListDisks => {
                ui::print_warning("\nAvailable disks:");
                executor.run(&LsblkDisksArgs.invocation())
            }
            Self::LuksFormat(args) => {
                ui::print_warning(&format!("Setting up LUKS2 on {}", args.device.display()));
                executor.run(&args.invocation())
            }
            other => match other.invocation() {
                Some(invocation) => executor.run(&invocation),
                None => Ok(()),
            },
        }
    }

    /// Whether this operation destroys existing data.
    pub fn is_destructive(&self) -> bool {
        matches!(
            self,
            Self::Partition(_) | Self::FormatEsp(_) | Self::LuksFormat(_) | Self::FormatBtrfs(_)
        )
    }
}

impl fmt::Display for StorageOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EnsureDir { path } => write!(f, "mkdir -p {}", path.display()),
            other => match other.invocation() {
                Some(invocation) => write!(f, "{}", invocation),
                None => f.write_str("(no-op)"),
            },
        }
    }
}

/// A complete storage plan: an ordered list of operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePlan {
    /// Ordered sequence of storage operations
    pub ops: Vec<StorageOp>,
    /// Target disk
    pub disk: PathBuf,
    /// Partition naming detected from the disk path
    pub naming: PartitionNaming,
    /// LUKS mapping name
    pub mapping_name: String,
    /// Where the new system is mounted
    pub mount_root: PathBuf,
}

impl StoragePlan {
    /// Returns true if this plan includes destructive operations.
    pub fn is_destructive(&self) -> bool {
        self.ops.iter().any(StorageOp::is_destructive)
    }

    /// Returns a summary of the plan for logging/display.
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Storage Plan: GPT + ESP + LUKS2 + Btrfs subvolumes".to_string(),
            format!("  Target: {}", self.disk.display()),
            format!("  Partition naming: {}", self.naming),
            format!("  Encrypted device: {}", mapper_path(&self.mapping_name).display()),
            format!("  Mount root: {}", self.mount_root.display()),
            format!("  Operations ({}):", self.ops.len()),
        ];
        for (i, op) in self.ops.iter().enumerate() {
            lines.push(format!("    {}. {}", i + 1, op));
        }
        lines.join("\n")
    }
}

// ============================================================================
// Plan Calculation
// ============================================================================

/// Calculate the disk provisioning plan.
///
/// # Errors
///
/// Returns a validation error if the disk path is empty or relative, or if
/// the mapping name is empty. No I/O happens here; whether the disk exists is
/// checked when the parameters are collected.
pub fn calculate_storage_plan(
    disk: &Path,
    mapping_name: &str,
    mount_root: &Path,
) -> Result<StoragePlan> {
    if disk.as_os_str().is_empty() {
        return Err(InstallerError::validation(
            "No install disk specified, cannot generate storage plan",
        ));
    }
    if !disk.is_absolute() {
        return Err(InstallerError::validation(format!(
            "Invalid disk path '{}', must be absolute",
            disk.display()
        )));
    }
    if mapping_name.trim().is_empty() {
        return Err(InstallerError::validation("LUKS mapping name is empty"));
    }

    let layout = PartitionLayout::new(disk);
    let esp = layout.esp();
    let luks = layout.luks();
    let mapper = mapper_path(mapping_name);
    let efi_mount = mount_root.join("boot/efi");
    let parted = |action: PartedAction| {
        StorageOp::Partition(PartedArgs {
            disk: disk.to_path_buf(),
            action,
        })
    };

    let mut ops = vec![
        StorageOp::ListDisks,
        StorageOp::EnsureDir {
            path: efi_mount.clone(),
        },
        // Step 1: GPT with ESP + LUKS partition
        parted(PartedAction::MkLabelGpt),
        parted(PartedAction::MkPart {
            name: PartitionLayout::ESP_NAME.to_string(),
            fs_type: Some(PartitionLayout::ESP_FS_TYPE.to_string()),
            start: PartitionLayout::ESP_START.to_string(),
            end: PartitionLayout::ESP_END.to_string(),
        }),
        parted(PartedAction::SetFlag {
            partition: PartitionLayout::ESP_NUMBER,
            flag: "esp".to_string(),
            on: true,
        }),
        parted(PartedAction::MkPart {
            name: PartitionLayout::LUKS_NAME.to_string(),
            fs_type: None,
            start: PartitionLayout::ESP_END.to_string(),
            end: PartitionLayout::LUKS_END.to_string(),
        }),
        // Step 2: ESP filesystem
        StorageOp::FormatEsp(MkfsFatArgs {
            device: esp.clone(),
        }),
        // Step 3: LUKS2 container, unlocked
        StorageOp::LuksFormat(LuksFormatArgs {
            device: luks.clone(),
            params: LuksParams::default(),
        }),
        StorageOp::LuksOpen(LuksOpenArgs {
            device: luks,
            mapping_name: mapping_name.to_string(),
        }),
        // Step 4: Btrfs and its subvolumes, created from the top level
        StorageOp::FormatBtrfs(MkfsBtrfsArgs {
            device: mapper.clone(),
            label: DISTRO_NAME.to_string(),
        }),
        StorageOp::Mount(MountArgs {
            device: mapper.clone(),
            target: mount_root.to_path_buf(),
            options: None,
        }),
    ];

    ops.extend(Subvolume::creation_order().map(|sv| {
        StorageOp::CreateSubvolume(SubvolumeCreateArgs {
            path: mount_root.join(sv.name()),
        })
    }));
    ops.push(StorageOp::Unmount(UmountArgs {
        target: mount_root.to_path_buf(),
    }));

    // Step 5: final topology, @ first so the other mount points live in it
    let (root, nested) = Subvolume::MOUNT_ORDER.split_at(1);
    ops.push(subvolume_mount(root[0], &mapper, mount_root));
    ops.extend(nested.iter().map(|sv| StorageOp::EnsureDir {
        path: mount_root.join(sv.mount_point()),
    }));
    ops.extend(nested.iter().map(|sv| subvolume_mount(*sv, &mapper, mount_root)));

    // Step 6: ESP inside @boot
    ops.push(StorageOp::EnsureDir {
        path: efi_mount.clone(),
    });
    ops.push(StorageOp::Mount(MountArgs {
        device: esp,
        target: efi_mount,
        options: None,
    }));

    let plan = StoragePlan {
        ops,
        disk: disk.to_path_buf(),
        naming: layout.naming,
        mapping_name: mapping_name.to_string(),
        mount_root: mount_root.to_path_buf(),
    };
    debug!("Calculated storage plan with {} operations", plan.ops.len());
    Ok(plan)
}

fn subvolume_mount(sv: Subvolume, mapper: &Path, mount_root: &Path) -> StorageOp {
    let target = if sv.mount_point().is_empty() {
        mount_root.to_path_buf()
    } else {
        mount_root.join(sv.mount_point())
    };
    StorageOp::Mount(MountArgs {
        device: mapper.to_path_buf(),
        target,
        options: Some(sv.mount_options()),
    })
}

/// Plan from operator-style input, as typed at the disk and mapping prompts.
///
/// `nvme0n1` resolves under the device directory and a blank mapping name
/// selects the default. The disk does not have to exist.
pub fn plan_from_input(
    disks: &DiskValidator,
    disk: &str,
    mapping_name: Option<&str>,
    mount_root: &Path,
) -> Result<StoragePlan> {
    if disk.trim().is_empty() {
        return Err(InstallerError::validation(
            "No install disk specified, cannot generate storage plan",
        ));
    }
    let disk = disks.normalize(disk);
    let mapping_name = normalize_mapping_name(mapping_name.unwrap_or_default());
    calculate_storage_plan(&disk, &mapping_name, mount_root)
}

// ============================================================================
// Execution
// ============================================================================

/// Execute every operation in order, stopping at the first failure.
pub fn execute_plan(plan: &StoragePlan, executor: &mut dyn Executor) -> Result<()> {
    info!("Executing storage plan on {}", plan.disk.display());
    for (i, op) in plan.ops.iter().enumerate() {
        debug!("Storage op {}/{}: {}", i + 1, plan.ops.len(), op);
        op.execute(executor)?;
    }
    info!("Storage plan complete");
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
