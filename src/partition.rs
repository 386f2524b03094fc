//! Partition layout and device naming
//!
//! The installer always creates the same two-partition GPT layout:
//!
//! ```text
//! <disk>1 / <disk>p1 - EFI System Partition (FAT32, 1MiB-513MiB, esp flag)
//! <disk>2 / <disk>p2 - LUKS2 container (513MiB to end of disk)
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

/// How the kernel names partitions of a given disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionNaming {
    /// `/dev/nvme0n1` -> `/dev/nvme0n1p1` (also loop and mmcblk devices)
    NvmeStyle,
    /// `/dev/sda` -> `/dev/sda1` (SATA, SCSI, virtio)
    Traditional,
}

impl PartitionNaming {
    /// Pick the naming scheme from the disk path.
    ///
    /// A disk whose name ends in a digit needs a `p` separator, otherwise the
    /// partition number would run into the disk number.
    pub fn for_disk(disk: &Path) -> Self {
        let ends_in_digit = disk
            .to_str()
            .is_some_and(|s| s.ends_with(|c: char| c.is_ascii_digit()));
        if ends_in_digit {
            Self::NvmeStyle
        } else {
            Self::Traditional
        }
    }

    /// Device path of partition `number` on `disk`.
    pub fn partition_path(self, disk: &Path, number: u32) -> PathBuf {
        let disk = disk.display();
        match self {
            Self::NvmeStyle => PathBuf::from(format!("{disk}p{number}")),
            Self::Traditional => PathBuf::from(format!("{disk}{number}")),
        }
    }
}

impl fmt::Display for PartitionNaming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NvmeStyle => f.write_str("nvme-style (pN)"),
            Self::Traditional => f.write_str("traditional (N)"),
        }
    }
}

/// The fixed ESP + LUKS layout on one disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionLayout {
    pub disk: PathBuf,
    pub naming: PartitionNaming,
}

impl PartitionLayout {
    pub const ESP_NUMBER: u32 = 1;
    pub const LUKS_NUMBER: u32 = 2;
    pub const ESP_NAME: &'static str = "ESP";
    pub const ESP_FS_TYPE: &'static str = "fat32";
    pub const ESP_START: &'static str = "1MiB";
    pub const ESP_END: &'static str = "513MiB";
    pub const LUKS_NAME: &'static str = "primary";
    pub const LUKS_END: &'static str = "100%";

    pub fn new(disk: impl Into<PathBuf>) -> Self {
        let disk = disk.into();
        let naming = PartitionNaming::for_disk(&disk);
        Self { disk, naming }
    }

    /// Partition 1, the EFI System Partition.
    pub fn esp(&self) -> PathBuf {
        self.naming.partition_path(&self.disk, Self::ESP_NUMBER)
    }

    /// Partition 2, the LUKS2 physical volume.
    pub fn luks(&self) -> PathBuf {
        self.naming.partition_path(&self.disk, Self::LUKS_NUMBER)
    }
}
