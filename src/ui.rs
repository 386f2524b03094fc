//! Operator-facing console output
//!
//! Plain colored lines on stdout. Diagnostics go through `tracing` on stderr
//! instead; this module is only what the operator is meant to read.

use std::io::{self, Write};

use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::style::Stylize;
use crossterm::terminal::{Clear, ClearType};

use crate::config::{DISTRO_NAME, INSTALLER_VERSION};

const LOGO: &str = r"
 _____          _             ___  ____
|_   _|_      _(_)_  ___   _ / _ \/ ___|
  | | \ \ /\ / / \ \/ / | | | | | \___ \
  | |  \ V  V /| |>  <| |_| | |_| |___) |
  |_|   \_/\_/ |_/_/\_\\__, |\___/|____/
                       |___/
";

/// Clear the screen and print the logo and version line.
pub fn print_banner() {
    let mut stdout = io::stdout();
    // Not a terminal (piped output, tests): just print below whatever is there
    let _ = execute!(stdout, Clear(ClearType::All), MoveTo(0, 0));
    println!("{}", LOGO.green());
    println!(
        "{}\n",
        format!("Secure Arch Linux Installer {INSTALLER_VERSION} ({DISTRO_NAME})").blue()
    );
    let _ = stdout.flush();
}

/// `=== Disk Preparation ===`
pub fn print_heading(title: &str) {
    println!("\n{}", format!("=== {title} ===").blue().bold());
}

pub fn print_info(message: &str) {
    println!("{}", format!("[INFO] {message}").blue());
}

pub fn print_success(message: &str) {
    println!("{}", message.green());
}

pub fn print_warning(message: &str) {
    println!("{}", message.yellow());
}

pub fn print_error(message: &str) {
    eprintln!("{}", message.red());
}

/// Called from the Ctrl+C handler, so it starts on a fresh line.
pub fn print_interrupt(message: &str) {
    println!("\n{}", message.yellow());
    let _ = io::stdout().flush();
}
