//! Process lifecycle management for the installer and its child tools
//!
//! # Problem Solved
//! If the installer itself is killed while a destructive tool (e.g. `parted`
//! or `cryptsetup luksFormat`) is running, the child would keep going with
//! nobody left to report its outcome.
//!
//! # Solution
//! - Children are spawned with a parent-death signal (SIGTERM)
//! - Children stay in the installer's process group so they keep the
//!   terminal: `cryptsetup` must be able to prompt for the passphrase
//! - Ctrl+C is a voluntary exit: restore the terminal, print a notice and
//!   exit 0 immediately, leaving mounts and the opened LUKS mapping as they are

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock, Mutex, Once};
use std::thread;

use nix::sys::signal::Signal;
use nix::sys::termios::{self, SetArg, Termios};
use signal_hook::consts::signal::SIGINT;
use signal_hook::iterator::Signals;
use tracing::{debug, info};

/// Extension trait for std::process::Command to bind a child's lifetime to ours
pub trait CommandDeathPact {
    /// Deliver SIGTERM to the child if the installer dies first
    fn with_parent_death_signal(&mut self) -> &mut Self;
}

impl CommandDeathPact for std::process::Command {
    fn with_parent_death_signal(&mut self) -> &mut Self {
        use std::os::unix::process::CommandExt;
        // SAFETY: the closure only issues a single prctl syscall, which is
        // async-signal-safe and allocates nothing between fork and exec.
        unsafe {
            self.pre_exec(|| {
                nix::sys::prctl::set_pdeathsig(Signal::SIGTERM).map_err(std::io::Error::from)
            });
        }
        self
    }
}

/// Notice printed when the operator interrupts the installer
pub const INTERRUPT_NOTICE: &str = "[INFO] Exited based on user request (Ctrl+C received).";

/// Set from inside the SIGINT handler, before any thread sees the fallout.
static INTERRUPTED: LazyLock<Arc<AtomicBool>> = LazyLock::new(|| Arc::new(AtomicBool::new(false)));

/// Terminal settings captured at startup, restored on interrupt.
static SAVED_TERMINAL: Mutex<Option<Termios>> = Mutex::new(None);

static EXIT: Once = Once::new();

/// Install the Ctrl+C handling.
///
/// Call this once at program start. The handler does not unmount anything or
/// close the encrypted mapping; an interrupted run leaves the system in
/// whatever state the last completed command produced.
///
/// Two actions are registered for SIGINT. A flag is raised inside the handler
/// itself, so a prompt or child command that fails because of the interrupt
/// is recognised as one by `main`. A watcher thread covers the case where the
/// main thread stays blocked (a read that the kernel restarts).
pub fn init_interrupt_handler() -> std::io::Result<()> {
    save_terminal();

    signal_hook::flag::register(SIGINT, Arc::clone(&INTERRUPTED))?;

    let mut signals = Signals::new([SIGINT])?;
    thread::Builder::new()
        .name("sigint-watcher".to_string())
        .spawn(move || {
            if signals.forever().next().is_some() {
                info!("Received SIGINT, exiting without cleanup");
                exit_interrupted();
            }
        })?;

    debug!("Interrupt handler installed");
    Ok(())
}

/// Whether SIGINT has been received.
pub fn interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

/// Restore the terminal, print the notice and exit 0.
///
/// Safe to call from several threads at once; the first caller exits and the
/// rest block until the process is gone.
pub fn exit_interrupted() -> ! {
    EXIT.call_once(|| {
        restore_terminal();
        crate::ui::print_interrupt(INTERRUPT_NOTICE);
        std::process::exit(0);
    });
    std::process::exit(0)
}

fn save_terminal() {
    match termios::tcgetattr(std::io::stdin()) {
        Ok(settings) => {
            if let Ok(mut saved) = SAVED_TERMINAL.lock() {
                *saved = Some(settings);
            }
        }
        // Not a terminal (pipe, file, CI): nothing to restore later
        Err(e) => debug!("stdin terminal settings unavailable: {}", e),
    }
}

/// Put stdin's terminal back the way it was at startup.
///
/// A masked prompt clears ECHO while it reads; exiting mid-read would leave
/// it cleared for the operator's shell.
pub fn restore_terminal() {
    let Ok(saved) = SAVED_TERMINAL.lock() else {
        return;
    };
    if let Some(settings) = saved.as_ref() {
        if let Err(e) = termios::tcsetattr(std::io::stdin(), SetArg::TCSANOW, settings) {
            debug!("Failed to restore terminal settings: {}", e);
        }
    }
}
