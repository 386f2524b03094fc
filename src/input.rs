//! Interactive input collection
//!
//! Asks for the six installation parameters in a fixed order. Each validated
//! field gets `MAX_ATTEMPTS` tries; running out ends the run with
//! `InstallerError::RetriesExhausted`. The passwords are masked and accepted
//! as typed.

use std::collections::VecDeque;

use dialoguer::{Confirm, Input, Password};
use tracing::{debug, warn};

use crate::error::{InstallerError, Result};
use crate::executor::Executor;
use crate::params::{
    normalize_mapping_name, validate_hostname, validate_username, DiskValidator,
    InstallationParameters, Secret, DEFAULT_MAPPING_NAME,
};
use crate::tool_traits::ToolArgs;
use crate::tools::disk::LsblkDisksArgs;
use crate::ui;

/// Tries per validated field.
pub const MAX_ATTEMPTS: usize = 5;

/// Source of operator answers.
pub trait Prompter {
    /// Ask for one line of visible input. Empty answers are allowed.
    fn ask(&mut self, prompt: &str) -> Result<String>;

    /// Ask for a secret without echoing it.
    fn ask_secret(&mut self, prompt: &str) -> Result<String>;

    /// Yes/no question defaulting to no.
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

/// Prompts on the controlling terminal via `dialoguer`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn ask(&mut self, prompt: &str) -> Result<String> {
        let answer: String = Input::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()?;
        Ok(answer)
    }

    fn ask_secret(&mut self, prompt: &str) -> Result<String> {
        let answer = Password::new()
            .with_prompt(prompt)
            .allow_empty_password(true)
            .interact()?;
        Ok(answer)
    }

    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        let answer = Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()?;
        Ok(answer)
    }
}

/// Replays canned answers in order. Used for scripted runs and tests.
///
/// Running out of answers behaves like a closed stdin.
#[derive(Debug, Default, Clone)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    prompts: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            prompts: Vec::new(),
        }
    }

    /// Every prompt shown so far, in order.
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    pub fn prompts_shown(&self) -> usize {
        self.prompts.len()
    }

    fn next(&mut self, prompt: &str) -> Result<String> {
        self.prompts.push(prompt.to_string());
        self.answers.pop_front().ok_or_else(|| {
            InstallerError::Prompt(dialoguer::Error::IO(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "no more scripted answers",
            )))
        })
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&mut self, prompt: &str) -> Result<String> {
        self.next(prompt)
    }

    fn ask_secret(&mut self, prompt: &str) -> Result<String> {
        self.next(prompt)
    }

    /// `y` or `yes` (any case) confirms; anything else declines.
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        let answer = self.next(prompt)?;
        Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
    }
}

/// Ask until `validate` accepts, at most `MAX_ATTEMPTS` times.
///
/// `before_each` runs ahead of every prompt (the disk listing).
fn ask_validated<T>(
    prompter: &mut dyn Prompter,
    field: &str,
    prompt: &str,
    mut before_each: impl FnMut() -> Result<()>,
    validate: impl Fn(&str) -> Result<T>,
) -> Result<T> {
    for attempt in 1..=MAX_ATTEMPTS {
        before_each()?;
        let answer = prompter.ask(prompt)?;
        match validate(&answer) {
            Ok(value) => return Ok(value),
            Err(e) => {
                warn!("Rejected {} (attempt {}/{}): {}", field, attempt, MAX_ATTEMPTS, e);
                ui::print_error(&format!(
                    "Invalid input! Attempts left: {}",
                    MAX_ATTEMPTS - attempt
                ));
            }
        }
    }
    Err(InstallerError::RetriesExhausted {
        field: field.to_string(),
    })
}

/// Show `lsblk -d -o NAME,SIZE` the way the operator would see it.
pub fn list_disks(executor: &mut dyn Executor) -> Result<()> {
    ui::print_warning("\nAvailable disks:");
    executor.run(&LsblkDisksArgs.invocation())
}

/// Ask for the target disk, re-listing the disks before every attempt.
pub fn ask_disk(
    prompter: &mut dyn Prompter,
    executor: &mut dyn Executor,
    disks: &DiskValidator,
) -> Result<std::path::PathBuf> {
    let disk = ask_validated(
        prompter,
        "disk",
        "Enter target disk (e.g. nvme0n1 or /dev/nvme0n1):",
        || list_disks(executor),
        |answer| disks.validate(answer),
    )?;
    ui::print_success(&format!("Disk '{}' is valid.", disk.display()));
    Ok(disk)
}

pub fn ask_hostname(prompter: &mut dyn Prompter) -> Result<String> {
    let hostname = ask_validated(prompter, "hostname", "Enter hostname:", || Ok(()), validate_hostname)?;
    ui::print_success(&format!("Hostname '{hostname}' is valid."));
    Ok(hostname)
}

pub fn ask_username(prompter: &mut dyn Prompter) -> Result<String> {
    let username = ask_validated(prompter, "username", "Enter username:", || Ok(()), validate_username)?;
    ui::print_success(&format!("Username '{username}' is valid."));
    Ok(username)
}

/// Any answer is accepted; empty selects `cryptroot`.
pub fn ask_mapping_name(prompter: &mut dyn Prompter) -> Result<String> {
    let answer = prompter.ask(&format!(
        "Enter LUKS mapping name (default: {DEFAULT_MAPPING_NAME}):"
    ))?;
    let name = normalize_mapping_name(&answer);
    if answer.trim().is_empty() {
        ui::print_success(&format!("Using default LUKS mapping name '{name}'."));
    } else {
        ui::print_success(&format!("LUKS mapping name '{name}' is valid."));
    }
    Ok(name)
}

/// Run the whole questionnaire.
pub fn collect_parameters(
    prompter: &mut dyn Prompter,
    executor: &mut dyn Executor,
    disks: &DiskValidator,
) -> Result<InstallationParameters> {
    let target_disk = ask_disk(prompter, executor, disks)?;
    let hostname = ask_hostname(prompter)?;
    let username = ask_username(prompter)?;
    let mapping_name = ask_mapping_name(prompter)?;
    let root_password = Secret::new(prompter.ask_secret("Enter root password:")?);
    let user_password = Secret::new(prompter.ask_secret("Enter user password:")?);

    debug!("Input collection finished");
    Ok(InstallationParameters {
        target_disk,
        hostname,
        username,
        mapping_name,
        root_password,
        user_password,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::RecordingExecutor;

    fn fake_disks() -> (tempfile::TempDir, DiskValidator) {
        let root = tempfile::tempdir().expect("tempdir");
        let dev = root.path().join("dev");
        let sys_block = root.path().join("sys/block");
        std::fs::create_dir_all(&dev).expect("dev");
        std::fs::create_dir_all(sys_block.join("nvme0n1")).expect("sys");
        std::fs::write(dev.join("nvme0n1"), "").expect("node");
        (root, DiskValidator::new(dev, sys_block))
    }

    #[test]
    fn test_collects_all_fields_in_order() {
        let (_root, disks) = fake_disks();
        let mut prompter =
            ScriptedPrompter::new(["nvme0n1", "twixy", "admin_1", "", "rootpw", "userpw"]);
        let mut exec = RecordingExecutor::new();

        let params = collect_parameters(&mut prompter, &mut exec, &disks).expect("valid input");

        assert_eq!(params.target_disk, disks.dev_dir.join("nvme0n1"));
        assert_eq!(params.hostname, "twixy");
        assert_eq!(params.username, "admin_1");
        assert_eq!(params.mapping_name, "cryptroot");
        assert_eq!(params.root_password.expose(), "rootpw");
        assert_eq!(params.user_password.expose(), "userpw");
        assert_eq!(prompter.prompts_shown(), 6);
        assert_eq!(exec.command_lines(), vec!["lsblk -d -o NAME,SIZE"]);
    }

    #[test]
    fn test_disk_listing_before_every_disk_prompt() {
        let (_root, disks) = fake_disks();
        let mut prompter = ScriptedPrompter::new(["sdz", "sdy", "nvme0n1"]);
        let mut exec = RecordingExecutor::new();

        ask_disk(&mut prompter, &mut exec, &disks).expect("third answer is valid");
        assert_eq!(exec.command_lines().len(), 3);
    }

    #[test]
    fn test_five_invalid_answers_exhaust_without_sixth_prompt() {
        let mut prompter =
            ScriptedPrompter::new(["Admin", "1user", "", "Bad", "UPPER", "valid_after"]);
        let err = ask_username(&mut prompter).unwrap_err();

        assert!(matches!(err, InstallerError::RetriesExhausted { ref field } if field == "username"));
        assert_eq!(err.exit_code(), 1);
        assert_eq!(prompter.prompts_shown(), MAX_ATTEMPTS);
    }

    #[test]
    fn test_recovers_within_retry_budget() {
        let mut prompter = ScriptedPrompter::new(["", "", "", "", "box"]);
        assert_eq!(ask_hostname(&mut prompter).expect("fifth try valid"), "box");
    }

    #[test]
    fn test_mapping_name_is_never_rejected() {
        let mut prompter = ScriptedPrompter::new(["vault0"]);
        assert_eq!(ask_mapping_name(&mut prompter).expect("accepted"), "vault0");
        assert_eq!(prompter.prompts_shown(), 1);
    }

    #[test]
    fn test_listing_failure_is_fatal() {
        let (_root, disks) = fake_disks();
        let mut prompter = ScriptedPrompter::new(["nvme0n1"]);
        let mut exec = RecordingExecutor::new().failing_at(0);

        let err = ask_disk(&mut prompter, &mut exec, &disks).unwrap_err();
        assert!(matches!(err, InstallerError::CommandFailed { .. }));
        assert_eq!(prompter.prompts_shown(), 0);
    }

    #[test]
    fn test_scripted_confirm() {
        let mut prompter = ScriptedPrompter::new(["YES", "n", ""]);
        assert!(prompter.confirm("wipe?").expect("answer"));
        assert!(!prompter.confirm("wipe?").expect("answer"));
        assert!(!prompter.confirm("wipe?").expect("answer"));
    }

    #[test]
    fn test_scripted_prompter_runs_dry() {
        let mut prompter = ScriptedPrompter::new(Vec::<String>::new());
        assert!(matches!(prompter.ask("x"), Err(InstallerError::Prompt(_))));
    }
}
