//! Configuration file handling for headless installs.
//!
//! A JSON file replaces the interactive questions. Passwords may be left out,
//! in which case they are still asked for (masked) at run time.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::config::SystemPaths;
use crate::input::Prompter;
use crate::params::{
    normalize_mapping_name, validate_hostname, validate_username, DiskValidator,
    InstallationParameters, Secret,
};

/// Installation configuration that can be saved/loaded
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallationConfig {
    pub install_disk: String, // "nvme0n1" or "/dev/nvme0n1"
    pub hostname: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapping_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_password: Option<String>,
    #[serde(default)]
    pub paths: SystemPaths,
}

impl InstallationConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration from {:?}", path.as_ref()))?;

        let config: Self =
            serde_json::from_str(&content).context("Failed to parse configuration JSON")?;

        debug!("Loaded configuration from {}", path.as_ref().display());
        Ok(config)
    }

    /// Validate the configuration with the same rules as the interactive
    /// prompts, including the block-device check.
    pub fn validate(&self, disks: &DiskValidator) -> Result<()> {
        disks
            .validate(&self.install_disk)
            .with_context(|| format!("Invalid install_disk '{}'", self.install_disk))?;
        validate_hostname(&self.hostname).context("Invalid hostname")?;
        validate_username(&self.username).context("Invalid username")?;
        if let Some(ref name) = self.mapping_name {
            if name.contains(char::is_whitespace) || name.contains('/') {
                anyhow::bail!("Invalid mapping_name '{}': no whitespace or '/'", name);
            }
        }
        Ok(())
    }

    /// Validate and build the parameters, asking for any missing password.
    pub fn to_parameters(
        &self,
        disks: &DiskValidator,
        prompter: &mut dyn Prompter,
    ) -> crate::error::Result<InstallationParameters> {
        self.validate(disks)?;

        let target_disk = disks.validate(&self.install_disk)?;
        let root_password = match self.root_password {
            Some(ref pw) => Secret::new(pw.clone()),
            None => Secret::new(prompter.ask_secret("Enter root password:")?),
        };
        let user_password = match self.user_password {
            Some(ref pw) => Secret::new(pw.clone()),
            None => Secret::new(prompter.ask_secret("Enter user password:")?),
        };

        let params = InstallationParameters {
            target_disk,
            hostname: validate_hostname(&self.hostname)?,
            username: validate_username(&self.username)?,
            mapping_name: normalize_mapping_name(self.mapping_name.as_deref().unwrap_or_default()),
            root_password,
            user_password,
        };
        info!(
            "Configuration accepted: disk={} host={} user={} mapping={}",
            params.target_disk.display(),
            params.hostname,
            params.username,
            params.mapping_name
        );
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::ScriptedPrompter;
    use std::path::PathBuf;

    fn fake_disks() -> (tempfile::TempDir, DiskValidator) {
        let root = tempfile::tempdir().expect("tempdir");
        let dev = root.path().join("dev");
        let sys_block = root.path().join("sys/block");
        fs::create_dir_all(&dev).expect("dev");
        fs::create_dir_all(sys_block.join("vda")).expect("sys");
        fs::write(dev.join("vda"), "").expect("node");
        (root, DiskValidator::new(dev, sys_block))
    }

    fn create_test_config() -> InstallationConfig {
        InstallationConfig {
            install_disk: "vda".to_string(),
            hostname: "twixy".to_string(),
            username: "admin".to_string(),
            mapping_name: None,
            root_password: Some("rootpw".to_string()),
            user_password: Some("userpw".to_string()),
            paths: SystemPaths::default(),
        }
    }

    #[test]
    fn test_load_full_json_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("install.json");
        let config = create_test_config();

        fs::write(&path, serde_json::to_string_pretty(&config).expect("serialize")).expect("write");
        let loaded = InstallationConfig::load_from_file(&path).expect("load");
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_minimal_json_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("install.json");
        fs::write(
            &path,
            r#"{"install_disk": "/dev/sda", "hostname": "h", "username": "u"}"#,
        )
        .expect("write");

        let config = InstallationConfig::load_from_file(&path).expect("load");
        assert_eq!(config.mapping_name, None);
        assert_eq!(config.root_password, None);
        assert_eq!(config.paths, SystemPaths::default());
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = InstallationConfig::load_from_file("/nonexistent/twixy.json");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").expect("write");
        let err = InstallationConfig::load_from_file(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("parse"));
    }

    #[test]
    fn test_load_json_missing_required_field() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("partial.json");
        fs::write(&path, r#"{"install_disk": "/dev/sda"}"#).expect("write");
        assert!(InstallationConfig::load_from_file(&path).is_err());
    }

    #[test]
    fn test_validation_valid_config() {
        let (_root, disks) = fake_disks();
        assert!(create_test_config().validate(&disks).is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_fields() {
        let (_root, disks) = fake_disks();

        let mut config = create_test_config();
        config.username = "Admin".to_string();
        assert!(config.validate(&disks).is_err());

        let mut config = create_test_config();
        config.hostname = "  ".to_string();
        assert!(config.validate(&disks).is_err());

        let mut config = create_test_config();
        config.install_disk = "vdz".to_string();
        assert!(config.validate(&disks).is_err());

        let mut config = create_test_config();
        config.mapping_name = Some("crypt root".to_string());
        assert!(config.validate(&disks).is_err());
    }

    #[test]
    fn test_to_parameters_defaults_mapping_name() {
        let (_root, disks) = fake_disks();
        let mut prompter = ScriptedPrompter::new(Vec::<&str>::new());
        let params = create_test_config()
            .to_parameters(&disks, &mut prompter)
            .expect("valid");
        assert_eq!(params.mapping_name, "cryptroot");
        assert_eq!(params.target_disk, disks.dev_dir.join("vda"));
        assert_eq!(params.root_password.expose(), "rootpw");
        assert_eq!(prompter.prompts_shown(), 0);
    }

    #[test]
    fn test_to_parameters_prompts_for_missing_passwords() {
        let (_root, disks) = fake_disks();
        let mut config = create_test_config();
        config.root_password = None;
        config.user_password = None;
        config.mapping_name = Some("vault0".to_string());

        let mut prompter = ScriptedPrompter::new(["r00t", "us3r"]);
        let params = config.to_parameters(&disks, &mut prompter).expect("valid");
        assert_eq!(params.root_password.expose(), "r00t");
        assert_eq!(params.user_password.expose(), "us3r");
        assert_eq!(params.mapping_name, "vault0");
        assert_eq!(prompter.prompts_shown(), 2);
    }

    #[test]
    fn test_invalid_config_maps_to_config_error() {
        let (_root, disks) = fake_disks();
        let mut config = create_test_config();
        config.username = "1user".to_string();
        let mut prompter = ScriptedPrompter::new(Vec::<&str>::new());
        let err = config.to_parameters(&disks, &mut prompter).unwrap_err();
        assert!(matches!(err, crate::error::InstallerError::Config(_)));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_json_with_extra_fields_ignored() {
        let config: InstallationConfig = serde_json::from_str(
            r#"{"install_disk": "/dev/sda", "hostname": "h", "username": "u", "desktop": "kde"}"#,
        )
        .expect("extra fields are ignored");
        assert_eq!(config.install_disk, "/dev/sda");
        assert_eq!(PathBuf::from(&config.install_disk), PathBuf::from("/dev/sda"));
    }
}
