//! mkinitcpio configuration stage
//!
//! Puts `encrypt` and `btrfs` into the hook list so the initramfs can unlock
//! and mount the root filesystem, then regenerates every preset.

use tracing::info;

use crate::config::SystemPaths;
use crate::config_edit::rewrite_keys;
use crate::error::Result;
use crate::executor::Executor;
use crate::tool_traits::ToolArgs;
use crate::tools::boot::MkinitcpioArgs;

pub const HOOKS_KEY: &str = "HOOKS=";

/// Hook order matters: `block` before `encrypt`, `encrypt` before `btrfs` and
/// `filesystems`.
pub const HOOKS: [&str; 11] = [
    "base",
    "udev",
    "autodetect",
    "modconf",
    "block",
    "encrypt",
    "btrfs",
    "filesystems",
    "keyboard",
    "keymap",
    "consolefont",
];

/// `HOOKS=(base udev ... consolefont)`
pub fn hooks_line() -> String {
    format!("{HOOKS_KEY}({})", HOOKS.join(" "))
}

/// Replace every `HOOKS=` line; everything else passes through.
pub fn rewrite_mkinitcpio_conf(text: &str) -> String {
    let line = hooks_line();
    rewrite_keys(text, &[(HOOKS_KEY, line.as_str())])
}

/// Run the whole initramfs stage.
pub fn configure_mkinitcpio(paths: &SystemPaths, executor: &mut dyn Executor) -> Result<()> {
    let conf = &paths.mkinitcpio_conf;
    info!("Configuring mkinitcpio via {}", conf.display());

    let text = executor.read_to_string(conf)?;
    executor.write(conf, &rewrite_mkinitcpio_conf(&text))?;
    executor.run(&MkinitcpioArgs.invocation())?;

    info!("mkinitcpio configured");
    Ok(())
}
