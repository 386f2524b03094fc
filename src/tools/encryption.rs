//! Type-safe arguments for LUKS encryption (`cryptsetup`).
//!
//! - `LuksFormatArgs` for `cryptsetup luksFormat`
//! - `LuksOpenArgs` for `cryptsetup open`
//!
//! # Security Model
//!
//! **CRITICAL**: The passphrase is NEVER passed as an argument (visible in
//! `ps aux`) and never written to a keyfile. `cryptsetup` inherits the
//! terminal and prompts the operator itself; `--verify-passphrase` makes it
//! ask twice.
//!
//! # LUKS2 Parameters
//!
//! The installer formats with fixed parameters:
//! - Hash: sha512
//! - Key size: 512 bits
//! - Iteration time: 5000 ms
//! - Key derivation: pbkdf2 (GRUB can unlock it at boot)

use std::path::{Path, PathBuf};

use strum::Display;

use crate::tool_traits::ToolArgs;

/// Hash used by the LUKS key derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
#[strum(serialize_all = "lowercase")]
pub enum LuksHash {
    #[default]
    Sha512,
}

/// Password-based key derivation function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
#[strum(serialize_all = "lowercase")]
pub enum LuksPbkdf {
    /// The only PBKDF GRUB's cryptodisk module can unlock.
    #[default]
    Pbkdf2,
}

/// Cryptographic parameters for `luksFormat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LuksParams {
    pub hash: LuksHash,
    /// Key size in bits.
    pub key_size: u32,
    /// PBKDF iteration time in milliseconds.
    pub iter_time_ms: u32,
    pub pbkdf: LuksPbkdf,
    /// Ask for the passphrase twice.
    pub verify_passphrase: bool,
}

impl Default for LuksParams {
    fn default() -> Self {
        Self {
            hash: LuksHash::Sha512,
            key_size: 512,
            iter_time_ms: 5000,
            pbkdf: LuksPbkdf::Pbkdf2,
            verify_passphrase: true,
        }
    }
}

/// Type-safe arguments for `cryptsetup luksFormat`.
///
/// | Rust Field | CLI Flag |
/// |------------|----------|
/// | `params.hash` | `--hash` |
/// | `params.key_size` | `--key-size` |
/// | `params.iter_time_ms` | `--iter-time` |
/// | `params.pbkdf` | `--pbkdf` |
/// | `params.verify_passphrase` | `--verify-passphrase` |
/// | `device` | positional, last |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LuksFormatArgs {
    /// Partition to encrypt (e.g. `/dev/nvme0n1p2`).
    pub device: PathBuf,
    pub params: LuksParams,
}

impl ToolArgs for LuksFormatArgs {
    fn program(&self) -> &'static str {
        "cryptsetup"
    }

    fn to_cli_args(&self) -> Vec<String> {
        let mut args = vec![
            "luksFormat".to_string(),
            "--type".to_string(),
            "luks2".to_string(),
            "--hash".to_string(),
            self.params.hash.to_string(),
            "--key-size".to_string(),
            self.params.key_size.to_string(),
            "--iter-time".to_string(),
            self.params.iter_time_ms.to_string(),
            "--pbkdf".to_string(),
            self.params.pbkdf.to_string(),
        ];
        if self.params.verify_passphrase {
            args.push("--verify-passphrase".to_string());
        }
        args.push(self.device.display().to_string());
        args
    }
}

/// Type-safe arguments for `cryptsetup open`.
///
/// After opening, the decrypted device is `/dev/mapper/<mapping_name>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LuksOpenArgs {
    pub device: PathBuf,
    pub mapping_name: String,
}

impl ToolArgs for LuksOpenArgs {
    fn program(&self) -> &'static str {
        "cryptsetup"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![
            "open".to_string(),
            self.device.display().to_string(),
            self.mapping_name.clone(),
        ]
    }
}

/// Device node of an opened mapping.
pub fn mapper_path(mapping_name: &str) -> PathBuf {
    Path::new("/dev/mapper").join(mapping_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_luks_format_fixed_parameters() {
        let args = LuksFormatArgs {
            device: PathBuf::from("/dev/nvme0n1p2"),
            params: LuksParams::default(),
        };
        assert_eq!(
            args.to_cli_args(),
            vec![
                "luksFormat",
                "--type",
                "luks2",
                "--hash",
                "sha512",
                "--key-size",
                "512",
                "--iter-time",
                "5000",
                "--pbkdf",
                "pbkdf2",
                "--verify-passphrase",
                "/dev/nvme0n1p2",
            ]
        );
        assert!(args.is_destructive());
    }

    #[test]
    fn test_luks_format_without_verification() {
        let args = LuksFormatArgs {
            device: PathBuf::from("/dev/sda2"),
            params: LuksParams {
                verify_passphrase: false,
                ..LuksParams::default()
            },
        };
        assert!(!args.to_cli_args().contains(&"--verify-passphrase".to_string()));
        assert_eq!(args.to_cli_args().last().map(String::as_str), Some("/dev/sda2"));
    }

    #[test]
    fn test_luks_open_args() {
        let args = LuksOpenArgs {
            device: PathBuf::from("/dev/sda2"),
            mapping_name: "vault0".to_string(),
        };
        assert_eq!(args.invocation().command_line(), "cryptsetup open /dev/sda2 vault0");
    }

    #[test]
    fn test_pbkdf_and_hash_render_lowercase() {
        assert_eq!(LuksPbkdf::Pbkdf2.to_string(), "pbkdf2");
        assert_eq!(LuksHash::Sha512.to_string(), "sha512");
    }

    #[test]
    fn test_mapper_path() {
        assert_eq!(mapper_path("cryptroot"), PathBuf::from("/dev/mapper/cryptroot"));
    }

    #[test]
    fn test_passphrase_never_in_cli_args() {
        let args = LuksFormatArgs {
            device: PathBuf::from("/dev/sda2"),
            params: LuksParams::default(),
        };
        for arg in args.to_cli_args() {
            assert!(
                !arg.contains("key-file") && !arg.contains("password"),
                "CLI args must not carry secrets: {arg}"
            );
        }
    }
}
