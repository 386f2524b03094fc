//! GRUB configuration stage
//!
//! Rewrites two keys in the GRUB defaults file so GRUB can unlock the LUKS
//! container, then installs GRUB to the ESP and generates `grub.cfg`.

use std::path::Path;

use tracing::{debug, info};

use crate::config::{SystemPaths, DISTRO_NAME, GRUB_TARGET};
use crate::config_edit::ConfigDocument;
use crate::error::Result;
use crate::executor::Executor;
use crate::params::InstallationParameters;
use crate::tool_traits::ToolArgs;
use crate::tools::boot::{GrubInstallArgs, GrubMkconfigArgs};
use crate::tools::disk::BlkidUuidArgs;

pub const CRYPTODISK_KEY: &str = "GRUB_ENABLE_CRYPTODISK=";
pub const CMDLINE_KEY: &str = "GRUB_CMDLINE_LINUX=";

/// `GRUB_ENABLE_CRYPTODISK=y`
pub fn cryptodisk_line() -> String {
    format!("{CRYPTODISK_KEY}y")
}

/// The kernel command line that unlocks `<uuid>` as `<mapping>` and boots
/// from its `@` subvolume.
pub fn cmdline_line(luks_uuid: &str, mapping_name: &str) -> String {
    format!(
        "{CMDLINE_KEY}\"cryptdevice=UUID={luks_uuid}:{mapping_name} root=/dev/mapper/{mapping_name} rootflags=subvol=@\""
    )
}

/// Rewrite GRUB defaults text.
///
/// `luks_uuid` is only called if the text has a `GRUB_CMDLINE_LINUX=` line,
/// so the `blkid` query never runs for a file that does not need it.
pub fn rewrite_grub_defaults(
    text: &str,
    mapping_name: &str,
    luks_uuid: impl FnOnce() -> Result<String>,
) -> Result<String> {
    let doc = ConfigDocument::parse(text, &[CRYPTODISK_KEY, CMDLINE_KEY]);
    let cryptodisk = cryptodisk_line();
    let cmdline = if doc.has_key(CMDLINE_KEY) {
        let uuid = luks_uuid()?;
        Some(cmdline_line(uuid.trim(), mapping_name))
    } else {
        debug!("No {} line, skipping UUID lookup", CMDLINE_KEY);
        None
    };

    let mut replacements = vec![(CRYPTODISK_KEY, cryptodisk.as_str())];
    if let Some(ref line) = cmdline {
        replacements.push((CMDLINE_KEY, line.as_str()));
    }
    Ok(doc.render(&replacements))
}

/// `blkid -s UUID -o value <device>`, trimmed.
pub fn query_luks_uuid(executor: &mut dyn Executor, device: &Path) -> Result<String> {
    let args = BlkidUuidArgs {
        device: device.to_path_buf(),
    };
    let uuid = executor.capture(&args.invocation())?;
    Ok(uuid.trim().to_string())
}

/// Run the whole bootloader stage.
pub fn configure_grub(
    params: &InstallationParameters,
    paths: &SystemPaths,
    executor: &mut dyn Executor,
) -> Result<()> {
    let grub_defaults = &paths.grub_defaults;
    info!("Configuring GRUB via {}", grub_defaults.display());

    let text = executor.read_to_string(grub_defaults)?;
    let luks = params.layout().luks();
    let rewritten = rewrite_grub_defaults(&text, &params.mapping_name, || {
        query_luks_uuid(executor, &luks)
    })?;
    executor.write(grub_defaults, &rewritten)?;

    let install = GrubInstallArgs {
        target: GRUB_TARGET.to_string(),
        efi_directory: paths.efi_directory.clone(),
        bootloader_id: DISTRO_NAME.to_string(),
    };
    executor.run(&install.invocation())?;

    let mkconfig = GrubMkconfigArgs {
        output: paths.grub_cfg.clone(),
    };
    executor.run(&mkconfig.invocation())?;

    info!("GRUB configured");
    Ok(())
}
