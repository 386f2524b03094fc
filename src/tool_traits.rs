//! Type-safe system tool argument contracts.
//!
//! This module provides the `ToolArgs` trait for ensuring compile-time correctness
//! of the argument vectors handed to external programs (`parted`, `cryptsetup`,
//! `mount`, `grub-install`, ...). Instead of raw string vectors scattered through
//! the stages, each invocation is a struct that renders its own argv.
//!
//! # Design Goals
//!
//! 1. **Compile-Time Safety**: A stage cannot forget `--type luks2` or swap the
//!    device and mapping name; the struct definition IS the contract.
//! 2. **Single Source of Truth**: The fixed argument vectors live next to the
//!    struct that produces them, and are unit-tested there.
//! 3. **Dry-Run Awareness**: Each tool declares whether it changes system state,
//!    so previews can run read-only probes and skip everything else.

use crate::executor::Invocation;

/// Trait for typed tool arguments.
///
/// # Contract
///
/// - `program()`: Returns the executable name, resolved through `PATH`.
/// - `to_cli_args()`: Returns the arguments exactly as the tool expects them.
/// - `is_destructive()`: Whether running the tool changes system state
///   (block devices, mount table, device-mapper table, boot files).
///
/// # Invariants
///
/// - Secrets are NEVER part of `to_cli_args()` (they would be visible in the
///   process table). Tools that need a passphrase prompt for it themselves.
///
/// # Example
///
/// ```
/// use twixy::tool_traits::ToolArgs;
/// use twixy::tools::disk::MkfsFatArgs;
///
/// let args = MkfsFatArgs { device: "/dev/sda1".into() };
/// assert_eq!(args.program(), "mkfs.fat");
/// assert_eq!(args.to_cli_args(), vec!["-F32", "/dev/sda1"]);
/// ```
pub trait ToolArgs {
    /// Executable name.
    fn program(&self) -> &'static str;

    /// Convert struct fields to CLI arguments.
    fn to_cli_args(&self) -> Vec<String>;

    /// Whether the tool mutates system state.
    ///
    /// Defaults to `true`; read-only probes (`lsblk`, `blkid`) override it.
    fn is_destructive(&self) -> bool {
        true
    }

    /// Build the invocation handed to an `Executor`.
    fn invocation(&self) -> Invocation {
        let invocation = Invocation::new(self.program()).args(self.to_cli_args());
        if self.is_destructive() {
            invocation
        } else {
            invocation.read_only()
        }
    }
}
