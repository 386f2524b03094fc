//! Integration tests for the parent-death signal
//!
//! These tests verify that:
//! 1. A child spawned with `with_parent_death_signal()` gets SIGTERM when the
//!    thread that spawned it goes away (the kernel tracks the parent thread)
//! 2. The child is left alone while its parent lives
//! 3. The live executor spawns through the same mechanism

use std::os::unix::process::ExitStatusExt;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use twixy::executor::{Executor, Invocation, LiveExecutor};
use twixy::process_guard::CommandDeathPact;

/// Helper: Check if a process is alive (not dead or zombie)
fn is_process_alive(pid: u32) -> bool {
    use nix::sys::signal;
    use nix::unistd::Pid;

    if signal::kill(Pid::from_raw(pid as i32), None).is_err() {
        return false;
    }

    // 'Z' = zombie, 'X' = dead
    if let Ok(stat) = std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
        let fields: Vec<&str> = stat.split_whitespace().collect();
        if fields.len() > 2 {
            return !matches!(fields[2], "Z" | "X");
        }
    }

    true
}

/// Helper: Reap the child, giving up after `timeout`
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Option<std::process::ExitStatus> {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if let Ok(Some(status)) = child.try_wait() {
            return Some(status);
        }
        thread::sleep(Duration::from_millis(50));
    }
    None
}

fn spawn_sleep() -> Child {
    Command::new("sleep")
        .arg("1000")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .stdin(Stdio::null())
        .with_parent_death_signal()
        .spawn()
        .expect("Failed to spawn sleep 1000")
}

#[test]
fn test_death_pact_child_killed_when_spawner_exits() {
    // The spawning thread exits right after spawn, which counts as parent death
    let mut child = thread::spawn(spawn_sleep)
        .join()
        .expect("spawner thread panicked");

    let status = wait_with_timeout(&mut child, Duration::from_secs(5));
    if status.is_none() {
        let _ = child.kill();
        let _ = child.wait();
    }
    let status = status.expect("child should die with its spawner");
    assert_eq!(status.signal(), Some(nix::sys::signal::Signal::SIGTERM as i32));
}

#[test]
fn test_death_pact_child_survives_while_parent_lives() {
    let mut child = spawn_sleep();
    let pid = child.id();

    thread::sleep(Duration::from_millis(200));
    assert!(is_process_alive(pid), "child should be alive while we are");

    child.kill().expect("kill child");
    child.wait().expect("reap child");
    assert!(!is_process_alive(pid));
}

#[test]
fn test_live_executor_capture_and_failure() {
    let mut exec = LiveExecutor;

    let out = exec
        .capture(&Invocation::new("echo").arg("0b9f3c1e").read_only())
        .expect("echo should succeed");
    assert_eq!(out.trim(), "0b9f3c1e");

    let err = exec
        .run(&Invocation::new("this_binary_definitely_does_not_exist_12345"))
        .unwrap_err();
    assert!(err.to_string().contains("this_binary_definitely_does_not_exist_12345"));
}
