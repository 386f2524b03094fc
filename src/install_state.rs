//! Install State Machine
//!
//! Tracks which stage the installer is in, so a failure can be reported
//! against the stage it happened in, and so no stage can run out of order.
//!
//! # Stage Flow
//!
//! ```text
//! NotStarted
//!     ↓
//! CollectingInput
//!     ↓
//! ProvisioningDisk        (destructive: needs confirmation)
//!     ↓
//! ConfiguringBootloader
//!     ↓
//! ConfiguringInitramfs
//!     ↓
//! Completed
//!
//! (Any non-terminal stage can transition to Failed)
//! ```

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tracing::{info, warn};

/// Installation stages in sequential order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum InstallStage {
    /// Nothing has happened yet
    NotStarted = 0,

    /// Asking for (or loading) the installation parameters
    CollectingInput = 1,

    /// Partitioning, LUKS, Btrfs and mounts.
    /// This is a DESTRUCTIVE stage - requires explicit confirmation
    ProvisioningDisk = 2,

    /// Rewriting GRUB defaults, grub-install, grub-mkconfig
    ConfiguringBootloader = 3,

    /// Rewriting mkinitcpio.conf, mkinitcpio -P
    ConfiguringInitramfs = 4,

    /// Every stage succeeded (terminal state)
    Completed = 5,

    /// A stage failed (terminal state)
    Failed = 255,
}

impl InstallStage {
    #[inline]
    pub const fn order(self) -> u8 {
        self as u8
    }

    /// Returns true if this is a terminal state (Completed or Failed)
    #[inline]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns true if this stage destroys data on the target disk
    #[inline]
    pub const fn is_destructive(self) -> bool {
        matches!(self, Self::ProvisioningDisk)
    }

    /// Returns the next stage in the sequence, or None if at a terminal state
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::NotStarted => Some(Self::CollectingInput),
            Self::CollectingInput => Some(Self::ProvisioningDisk),
            Self::ProvisioningDisk => Some(Self::ConfiguringBootloader),
            Self::ConfiguringBootloader => Some(Self::ConfiguringInitramfs),
            Self::ConfiguringInitramfs => Some(Self::Completed),
            Self::Completed | Self::Failed => None,
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::NotStarted => "Not started",
            Self::CollectingInput => "Collecting input",
            Self::ProvisioningDisk => "Provisioning disk",
            Self::ConfiguringBootloader => "Configuring bootloader",
            Self::ConfiguringInitramfs => "Configuring initramfs",
            Self::Completed => "Installation complete",
            Self::Failed => "Installation failed",
        }
    }

    /// Console heading printed when the stage starts, if it has one.
    pub const fn heading(self) -> Option<&'static str> {
        match self {
            Self::ProvisioningDisk => Some("Disk Preparation"),
            Self::ConfiguringBootloader => Some("GRUB Configuration"),
            Self::ConfiguringInitramfs => Some("mkinitcpio Configuration"),
            _ => None,
        }
    }

    /// Returns the approximate progress percentage for this stage
    pub const fn progress_percent(self) -> u8 {
        match self {
            Self::NotStarted => 0,
            Self::CollectingInput => 5,
            Self::ProvisioningDisk => 20,
            Self::ConfiguringBootloader => 70,
            Self::ConfiguringInitramfs => 85,
            Self::Completed => 100,
            Self::Failed => 0, // meaningless once failed
        }
    }

    /// Returns all stages in order (excluding Failed)
    pub const fn all_stages() -> &'static [Self] {
        &[
            Self::NotStarted,
            Self::CollectingInput,
            Self::ProvisioningDisk,
            Self::ConfiguringBootloader,
            Self::ConfiguringInitramfs,
            Self::Completed,
        ]
    }
}

impl fmt::Display for InstallStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur during state transitions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InstallTransitionError {
    #[error("Cannot skip from {from} to {to} (must transition through intermediate stages)")]
    SkippedStage {
        from: InstallStage,
        to: InstallStage,
    },

    #[error("Cannot go backwards from {from} to {to} (installation is forward-only)")]
    BackwardTransition {
        from: InstallStage,
        to: InstallStage,
    },

    #[error("Cannot transition from terminal state {from}")]
    FromTerminalState { from: InstallStage },

    #[error("Stage {stage} requires explicit confirmation (destructive operation)")]
    MissingConfirmation { stage: InstallStage },

    #[error("Already at stage {stage}")]
    AlreadyAtStage { stage: InstallStage },
}

/// Owns the current stage and validates every transition.
///
/// # Example
///
/// ```
/// use twixy::install_state::{InstallerContext, InstallStage};
///
/// let mut ctx = InstallerContext::new();
/// ctx.advance().unwrap();
/// assert_eq!(ctx.current_stage(), InstallStage::CollectingInput);
///
/// // The disk stage needs confirmation first
/// assert!(ctx.advance().is_err());
/// ctx.confirm_destructive_operations();
/// assert_eq!(ctx.advance().unwrap(), InstallStage::ProvisioningDisk);
/// ```
#[derive(Debug, Clone)]
pub struct InstallerContext {
    current: InstallStage,

    /// Stage at which failure occurred (if any)
    failed_at: Option<InstallStage>,

    /// (stage entered, unix timestamp)
    stage_history: Vec<(InstallStage, u64)>,

    destructive_confirmed: bool,
}

impl Default for InstallerContext {
    fn default() -> Self {
        Self::new()
    }
}

impl InstallerContext {
    pub fn new() -> Self {
        Self {
            current: InstallStage::NotStarted,
            failed_at: None,
            stage_history: Vec::with_capacity(InstallStage::all_stages().len()),
            destructive_confirmed: false,
        }
    }

    #[inline]
    pub fn current_stage(&self) -> InstallStage {
        self.current
    }

    #[inline]
    pub fn failed_at(&self) -> Option<InstallStage> {
        self.failed_at
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.current == InstallStage::Completed
    }

    #[inline]
    pub fn is_failed(&self) -> bool {
        self.current == InstallStage::Failed
    }

    #[inline]
    pub fn progress_percent(&self) -> u8 {
        self.current.progress_percent()
    }

    pub fn stage_history(&self) -> &[(InstallStage, u64)] {
        &self.stage_history
    }

    /// Authorize the destructive disk stage. Cannot be revoked.
    pub fn confirm_destructive_operations(&mut self) {
        self.destructive_confirmed = true;
    }

    #[inline]
    pub fn is_destructive_confirmed(&self) -> bool {
        self.destructive_confirmed
    }

    /// Advance to the next stage in sequence.
    ///
    /// # Errors
    ///
    /// - `FromTerminalState` if already at Completed or Failed
    /// - `MissingConfirmation` if entering a destructive stage without confirmation
    pub fn advance(&mut self) -> Result<InstallStage, InstallTransitionError> {
        let next_stage = self
            .current
            .next()
            .ok_or(InstallTransitionError::FromTerminalState { from: self.current })?;
        self.transition_to(next_stage)
    }

    /// Transition to a specific stage (must be the next stage in sequence).
    ///
    /// # Errors
    ///
    /// - `AlreadyAtStage` if target is the current stage
    /// - `BackwardTransition` if target is before current
    /// - `SkippedStage` if target is not the immediate next stage
    /// - `FromTerminalState` if current is a terminal state
    /// - `MissingConfirmation` if entering a destructive stage without confirmation
    pub fn transition_to(
        &mut self,
        target: InstallStage,
    ) -> Result<InstallStage, InstallTransitionError> {
        if self.current.is_terminal() {
            return Err(InstallTransitionError::FromTerminalState { from: self.current });
        }

        if target == self.current {
            return Err(InstallTransitionError::AlreadyAtStage { stage: target });
        }

        // Failed is only reachable through fail()
        if target == InstallStage::Failed {
            return Err(InstallTransitionError::SkippedStage {
                from: self.current,
                to: target,
            });
        }

        if target.order() < self.current.order() {
            return Err(InstallTransitionError::BackwardTransition {
                from: self.current,
                to: target,
            });
        }

        if self.current.next() != Some(target) {
            return Err(InstallTransitionError::SkippedStage {
                from: self.current,
                to: target,
            });
        }

        if target.is_destructive() && !self.destructive_confirmed {
            return Err(InstallTransitionError::MissingConfirmation { stage: target });
        }

        info!("Install stage: {} -> {} ({}%)", self.current, target, target.progress_percent());
        self.record_stage_transition(target);
        self.current = target;

        Ok(target)
    }

    /// Mark the installation as failed, remembering the current stage.
    ///
    /// # Errors
    ///
    /// - `FromTerminalState` if already at Completed or Failed
    pub fn fail(&mut self) -> Result<(), InstallTransitionError> {
        if self.current.is_terminal() {
            return Err(InstallTransitionError::FromTerminalState { from: self.current });
        }

        warn!("Install failed during stage: {}", self.current);
        self.failed_at = Some(self.current);
        self.record_stage_transition(InstallStage::Failed);
        self.current = InstallStage::Failed;

        Ok(())
    }

    fn record_stage_transition(&mut self, stage: InstallStage) {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        self.stage_history.push((stage, timestamp));
    }
}

impl From<InstallTransitionError> for crate::error::InstallerError {
    fn from(err: InstallTransitionError) -> Self {
        crate::error::InstallerError::InstallTransition(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // InstallStage Tests
    // =========================================================================

    #[test]
    fn test_stage_order_is_sequential() {
        for (i, stage) in InstallStage::all_stages().iter().enumerate() {
            assert_eq!(stage.order() as usize, i, "Stage {:?} should have order {}", stage, i);
        }
    }

    #[test]
    fn test_stage_next_forms_chain() {
        let mut current = InstallStage::NotStarted;
        let mut count = 0;

        while let Some(next) = current.next() {
            current = next;
            count += 1;
            assert!(count < 20, "Infinite loop detected in stage chain");
        }

        assert_eq!(current, InstallStage::Completed);
        assert_eq!(count, 5);
    }

    #[test]
    fn test_only_disk_stage_is_destructive() {
        for stage in InstallStage::all_stages() {
            assert_eq!(
                stage.is_destructive(),
                *stage == InstallStage::ProvisioningDisk,
                "{:?}",
                stage
            );
        }
    }

    #[test]
    fn test_progress_percent_increases() {
        let mut last_progress = 0u8;
        for stage in InstallStage::all_stages() {
            let progress = stage.progress_percent();
            assert!(progress >= last_progress, "{:?} went backwards", stage);
            last_progress = progress;
        }
        assert_eq!(InstallStage::Completed.progress_percent(), 100);
    }

    #[test]
    fn test_stage_headings() {
        assert_eq!(InstallStage::ProvisioningDisk.heading(), Some("Disk Preparation"));
        assert_eq!(InstallStage::ConfiguringBootloader.heading(), Some("GRUB Configuration"));
        assert_eq!(
            InstallStage::ConfiguringInitramfs.heading(),
            Some("mkinitcpio Configuration")
        );
        assert_eq!(InstallStage::CollectingInput.heading(), None);
    }

    // =========================================================================
    // InstallerContext Tests
    // =========================================================================

    #[test]
    fn test_advance_through_all_stages() {
        let mut ctx = InstallerContext::new();
        ctx.confirm_destructive_operations();

        while ctx.advance().is_ok() {}

        assert!(ctx.is_complete());
        assert_eq!(ctx.stage_history().len(), 5);
        assert_eq!(ctx.progress_percent(), 100);
    }

    #[test]
    fn test_cannot_advance_from_terminal_states() {
        let mut ctx = InstallerContext::new();
        ctx.fail().expect("fail from NotStarted");
        assert!(matches!(
            ctx.advance().unwrap_err(),
            InstallTransitionError::FromTerminalState { .. }
        ));
        assert!(ctx.fail().is_err());
    }

    #[test]
    fn test_destructive_stage_requires_confirmation() {
        let mut ctx = InstallerContext::new();
        ctx.advance().expect("CollectingInput");

        let err = ctx.advance().unwrap_err();
        assert!(matches!(err, InstallTransitionError::MissingConfirmation { .. }));
        assert_eq!(ctx.current_stage(), InstallStage::CollectingInput);

        ctx.confirm_destructive_operations();
        ctx.advance().expect("Should advance to ProvisioningDisk");
        assert_eq!(ctx.current_stage(), InstallStage::ProvisioningDisk);
    }

    #[test]
    fn test_fail_records_failed_at_stage() {
        let mut ctx = InstallerContext::new();
        ctx.confirm_destructive_operations();
        ctx.transition_to(InstallStage::CollectingInput).expect("input");
        ctx.transition_to(InstallStage::ProvisioningDisk).expect("disk");
        ctx.transition_to(InstallStage::ConfiguringBootloader).expect("grub");

        ctx.fail().expect("Should fail");

        assert!(ctx.is_failed());
        assert_eq!(ctx.failed_at(), Some(InstallStage::ConfiguringBootloader));
        assert_eq!(ctx.stage_history().last().map(|(s, _)| *s), Some(InstallStage::Failed));
    }

    #[test]
    fn test_transition_errors() {
        let mut ctx = InstallerContext::new();
        ctx.confirm_destructive_operations();

        assert!(matches!(
            ctx.transition_to(InstallStage::ProvisioningDisk).unwrap_err(),
            InstallTransitionError::SkippedStage { .. }
        ));
        assert!(matches!(
            ctx.transition_to(InstallStage::NotStarted).unwrap_err(),
            InstallTransitionError::AlreadyAtStage { .. }
        ));
        assert!(matches!(
            ctx.transition_to(InstallStage::Failed).unwrap_err(),
            InstallTransitionError::SkippedStage { .. }
        ));

        ctx.advance().expect("CollectingInput");
        assert!(matches!(
            ctx.transition_to(InstallStage::NotStarted).unwrap_err(),
            InstallTransitionError::BackwardTransition { .. }
        ));
    }

    #[test]
    fn test_error_display() {
        let err = InstallTransitionError::SkippedStage {
            from: InstallStage::NotStarted,
            to: InstallStage::ProvisioningDisk,
        };
        let msg = err.to_string();
        assert!(msg.contains("Cannot skip"));
        assert!(msg.contains("Provisioning disk"));

        let err: crate::error::InstallerError = err.into();
        assert_eq!(err.exit_code(), 1);
    }
}
