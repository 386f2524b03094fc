//! Engine modules: the installer stages that change the system.
//!
//! Each stage takes the validated parameters and an `Executor`, and returns
//! at the first failed operation.

pub mod bootloader;
pub mod initramfs;
pub mod storage;
