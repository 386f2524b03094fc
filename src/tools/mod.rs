//! Type-safe tool argument modules.
//!
//! This module contains structs that implement `ToolArgs` for each external
//! program the installer drives. Each struct maps Rust fields to the exact
//! argument vector the program expects.

pub mod boot;
pub mod disk;
pub mod encryption;
