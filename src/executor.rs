//! Command execution primitive
//!
//! Every side effect of the installer goes through the `Executor` trait:
//! external programs, mount-point directory creation, and the config-file
//! read/write cycle. This is the only error boundary in the provisioning
//! core. A failing operation returns an `InstallerError` naming the exact
//! command line, and the caller stops right there.
//!
//! Three implementations:
//!
//! - `LiveExecutor`: real processes with inherited stdio, real files.
//! - `DryRunExecutor`: runs read-only probes, records everything else.
//! - `RecordingExecutor`: fully in-memory; records order, injects failures.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, info, warn};

use crate::error::{InstallerError, Result};
use crate::process_guard::CommandDeathPact;

/// A fully-specified external program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Executable name, resolved through `PATH`.
    pub program: String,
    /// Arguments in order.
    pub args: Vec<String>,
    /// Read-only probes still run in dry-run mode.
    pub read_only: bool,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            read_only: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Mark this invocation as a probe that does not change system state.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// The command line as the operator would type it.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

/// Side-effect boundary for every installer stage.
pub trait Executor {
    /// Run a program to completion with inherited stdio.
    fn run(&mut self, invocation: &Invocation) -> Result<()>;

    /// Run a program to completion and return its stdout.
    fn capture(&mut self, invocation: &Invocation) -> Result<String>;

    /// Idempotent `mkdir -p`.
    fn create_dir_all(&mut self, path: &Path) -> Result<()>;

    /// Read a whole configuration file.
    fn read_to_string(&mut self, path: &Path) -> Result<String>;

    /// Truncate and rewrite a configuration file.
    fn write(&mut self, path: &Path, contents: &str) -> Result<()>;
}

// ============================================================================
// LiveExecutor
// ============================================================================

/// Executes for real. Used by `--apply`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LiveExecutor;

impl LiveExecutor {
    fn command(invocation: &Invocation) -> Command {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args).with_parent_death_signal();
        cmd
    }
}

impl Executor for LiveExecutor {
    fn run(&mut self, invocation: &Invocation) -> Result<()> {
        info!("Running: {}", invocation);

        let status = Self::command(invocation)
            .status()
            .map_err(|source| InstallerError::CommandSpawn {
                command: invocation.command_line(),
                source,
            })?;

        if status.success() {
            debug!("Command succeeded: {}", invocation.program);
            Ok(())
        } else {
            Err(InstallerError::CommandFailed {
                command: invocation.command_line(),
                code: status.code(),
            })
        }
    }

    fn capture(&mut self, invocation: &Invocation) -> Result<String> {
        info!("Querying: {}", invocation);

        let output = Self::command(invocation)
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .output()
            .map_err(|source| InstallerError::CommandSpawn {
                command: invocation.command_line(),
                source,
            })?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            Err(InstallerError::CommandFailed {
                command: invocation.command_line(),
                code: output.status.code(),
            })
        }
    }

    fn create_dir_all(&mut self, path: &Path) -> Result<()> {
        debug!("Ensuring directory {}", path.display());
        fs::create_dir_all(path).map_err(|source| InstallerError::CreateDir {
            path: path.to_path_buf(),
            source,
        })
    }

    fn read_to_string(&mut self, path: &Path) -> Result<String> {
        fs::read_to_string(path).map_err(|source| InstallerError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })
    }

    fn write(&mut self, path: &Path, contents: &str) -> Result<()> {
        info!("Rewriting {}", path.display());
        fs::write(path, contents).map_err(|source| InstallerError::ConfigWrite {
            path: path.to_path_buf(),
            source,
        })
    }
}

// ============================================================================
// RecordingExecutor
// ============================================================================

/// One side effect observed by a `RecordingExecutor`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Run(Invocation),
    Capture(Invocation),
    CreateDir(PathBuf),
    Read(PathBuf),
    Write(PathBuf),
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Run(inv) => write!(f, "run {}", inv),
            Self::Capture(inv) => write!(f, "query {}", inv),
            Self::CreateDir(path) => write!(f, "mkdir -p {}", path.display()),
            Self::Read(path) => write!(f, "read {}", path.display()),
            Self::Write(path) => write!(f, "write {}", path.display()),
        }
    }
}

/// In-memory executor: records every operation in order and can simulate a
/// failure at any command.
///
/// Files live in a map; reading a path that was never seeded fails with
/// `NotFound` exactly like the live filesystem would.
#[derive(Debug, Default, Clone)]
pub struct RecordingExecutor {
    operations: Vec<Operation>,
    files: BTreeMap<PathBuf, String>,
    captures: HashMap<String, String>,
    fail_at: Option<usize>,
    fail_writes: bool,
    commands_seen: usize,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file that stages may read.
    pub fn with_file(mut self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        self.files.insert(path.into(), contents.into());
        self
    }

    /// Canned stdout for every `capture` of `program`.
    pub fn with_capture(mut self, program: impl Into<String>, stdout: impl Into<String>) -> Self {
        self.captures.insert(program.into(), stdout.into());
        self
    }

    /// Make the command with this zero-based index (counting runs and
    /// captures) exit with status 1.
    pub fn failing_at(mut self, command_index: usize) -> Self {
        self.fail_at = Some(command_index);
        self
    }

    /// Make every file write fail with `PermissionDenied`.
    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Command lines of every run and capture, in order.
    pub fn command_lines(&self) -> Vec<String> {
        self.operations
            .iter()
            .filter_map(|op| match op {
                Operation::Run(inv) | Operation::Capture(inv) => Some(inv.command_line()),
                _ => None,
            })
            .collect()
    }

    /// Current contents of a file.
    pub fn file(&self, path: impl AsRef<Path>) -> Option<&str> {
        self.files.get(path.as_ref()).map(String::as_str)
    }

    fn record_command(&mut self, op: Operation, invocation: &Invocation) -> Result<()> {
        self.operations.push(op);
        let index = self.commands_seen;
        self.commands_seen += 1;
        if self.fail_at == Some(index) {
            return Err(InstallerError::CommandFailed {
                command: invocation.command_line(),
                code: Some(1),
            });
        }
        Ok(())
    }
}

impl Executor for RecordingExecutor {
    fn run(&mut self, invocation: &Invocation) -> Result<()> {
        self.record_command(Operation::Run(invocation.clone()), invocation)
    }

    fn capture(&mut self, invocation: &Invocation) -> Result<String> {
        self.record_command(Operation::Capture(invocation.clone()), invocation)?;
        Ok(self
            .captures
            .get(&invocation.program)
            .cloned()
            .unwrap_or_default())
    }

    fn create_dir_all(&mut self, path: &Path) -> Result<()> {
        self.operations.push(Operation::CreateDir(path.to_path_buf()));
        Ok(())
    }

    fn read_to_string(&mut self, path: &Path) -> Result<String> {
        self.operations.push(Operation::Read(path.to_path_buf()));
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| InstallerError::ConfigRead {
                path: path.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "No such file or directory",
                ),
            })
    }

    fn write(&mut self, path: &Path, contents: &str) -> Result<()> {
        self.operations.push(Operation::Write(path.to_path_buf()));
        if self.fail_writes {
            return Err(InstallerError::ConfigWrite {
                path: path.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "Permission denied",
                ),
            });
        }
        self.files.insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }
}

// ============================================================================
// DryRunExecutor
// ============================================================================

/// Preview executor used when `--apply` is not given.
///
/// Read-only probes (`lsblk`, `blkid`) and config-file reads go to the live
/// system so the preview is realistic. Everything that would change state is
/// recorded and logged instead. Rewritten config contents are kept in memory,
/// so a later read of the same file sees the preview.
#[derive(Debug, Default)]
pub struct DryRunExecutor {
    live: LiveExecutor,
    recorder: RecordingExecutor,
}

impl DryRunExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every operation that was skipped or passed through, in order.
    pub fn operations(&self) -> &[Operation] {
        self.recorder.operations()
    }

    /// Previewed contents of a config file the run would have rewritten.
    pub fn previewed_file(&self, path: impl AsRef<Path>) -> Option<&str> {
        self.recorder.file(path)
    }

    /// Numbered list of the recorded operations.
    pub fn summary(&self) -> String {
        let ops = self.operations();
        let mut lines = vec![format!("Dry-run summary ({} operations):", ops.len())];
        for (i, op) in ops.iter().enumerate() {
            lines.push(format!("    {}. {}", i + 1, op));
        }
        lines.join("\n")
    }

    fn placeholder(invocation: &Invocation) -> String {
        format!("<dry-run: {}>", invocation.command_line())
    }
}

impl Executor for DryRunExecutor {
    fn run(&mut self, invocation: &Invocation) -> Result<()> {
        self.recorder.run(invocation)?;
        if invocation.read_only {
            self.live.run(invocation)
        } else {
            info!("[DRY RUN] Skipped: {}", invocation);
            Ok(())
        }
    }

    fn capture(&mut self, invocation: &Invocation) -> Result<String> {
        self.recorder.capture(invocation)?;
        if !invocation.read_only {
            info!("[DRY RUN] Skipped: {}", invocation);
            return Ok(Self::placeholder(invocation));
        }
        // The device being probed usually does not exist yet because the
        // partitioning before it was skipped.
        match self.live.capture(invocation) {
            Ok(stdout) => Ok(stdout),
            Err(e) => {
                warn!("[DRY RUN] Probe failed ({}), using placeholder", e);
                Ok(Self::placeholder(invocation))
            }
        }
    }

    fn create_dir_all(&mut self, path: &Path) -> Result<()> {
        info!("[DRY RUN] Skipped: mkdir -p {}", path.display());
        self.recorder.create_dir_all(path)
    }

    fn read_to_string(&mut self, path: &Path) -> Result<String> {
        if let Some(previewed) = self.recorder.file(path) {
            let previewed = previewed.to_string();
            self.recorder.operations.push(Operation::Read(path.to_path_buf()));
            return Ok(previewed);
        }
        self.recorder.operations.push(Operation::Read(path.to_path_buf()));
        self.live.read_to_string(path)
    }

    fn write(&mut self, path: &Path, contents: &str) -> Result<()> {
        info!(
            "[DRY RUN] Skipped: write {} lines to {}",
            contents.lines().count(),
            path.display()
        );
        self.recorder.write(path, contents)
    }
}
