//! Type-safe arguments for the bootloader and initramfs tools.

use std::path::PathBuf;

use crate::tool_traits::ToolArgs;

/// `grub-install --target=<target> --efi-directory=<dir> --bootloader-id=<id>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrubInstallArgs {
    pub target: String,
    pub efi_directory: PathBuf,
    pub bootloader_id: String,
}

impl ToolArgs for GrubInstallArgs {
    fn program(&self) -> &'static str {
        "grub-install"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![
            format!("--target={}", self.target),
            format!("--efi-directory={}", self.efi_directory.display()),
            format!("--bootloader-id={}", self.bootloader_id),
        ]
    }
}

/// `grub-mkconfig -o <output>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrubMkconfigArgs {
    pub output: PathBuf,
}

impl ToolArgs for GrubMkconfigArgs {
    fn program(&self) -> &'static str {
        "grub-mkconfig"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec!["-o".to_string(), self.output.display().to_string()]
    }
}

/// `mkinitcpio -P`: regenerate every preset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MkinitcpioArgs;

impl ToolArgs for MkinitcpioArgs {
    fn program(&self) -> &'static str {
        "mkinitcpio"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec!["-P".to_string()]
    }
}
