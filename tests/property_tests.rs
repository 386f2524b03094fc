//! Property-based tests for the config rewriters and input validators
//!
//! These tests verify:
//! - Unrelated config lines pass through byte-for-byte
//! - Rewriting is idempotent
//! - Username validation matches `[a-z_][a-z0-9_-]*`
//! - Mapping name normalization
//! - Partition naming

use std::path::Path;

use proptest::prelude::*;
use twixy::engine::bootloader::{cmdline_line, rewrite_grub_defaults, CMDLINE_KEY, CRYPTODISK_KEY};
use twixy::engine::initramfs::{hooks_line, rewrite_mkinitcpio_conf, HOOKS_KEY};
use twixy::params::{normalize_mapping_name, validate_username, DEFAULT_MAPPING_NAME};
use twixy::partition::{PartitionLayout, PartitionNaming};

// =============================================================================
// Strategies
// =============================================================================

/// A config line that starts with none of the rewritten keys.
fn unrelated_line() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z#_ =\"()]{0,40}",
        "GRUB_[A-Z_]{1,12}=\"[a-z0-9 =]{0,20}\"".prop_filter("rewritten key", |l| {
            !l.starts_with(CMDLINE_KEY) && !l.starts_with(CRYPTODISK_KEY)
        }),
        Just("GRUB_CMDLINE_LINUX_DEFAULT=\"loglevel=3 quiet\"".to_string()),
        Just("#HOOKS=(base udev)".to_string()),
        Just(" HOOKS=(indented)".to_string()),
        Just("#GRUB_ENABLE_CRYPTODISK=y".to_string()),
    ]
}

/// Either an unrelated line or one of the rewritten keys with junk after it.
fn any_line() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => unrelated_line(),
        1 => "[a-z =\"()]{0,20}".prop_map(|rest| format!("{HOOKS_KEY}{rest}")),
        1 => "[a-z =\"]{0,20}".prop_map(|rest| format!("{CMDLINE_KEY}{rest}")),
        1 => "[yn]?".prop_map(|rest| format!("{CRYPTODISK_KEY}{rest}")),
    ]
}

fn document(line: impl Strategy<Value = String>) -> impl Strategy<Value = String> {
    (prop::collection::vec(line, 0..20), any::<bool>()).prop_map(|(lines, trailing_newline)| {
        let mut text = lines.join("\n");
        if trailing_newline && !text.is_empty() {
            text.push('\n');
        }
        text
    })
}

fn is_username_reference(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}

// =============================================================================
// GRUB Defaults
// =============================================================================

proptest! {
    /// Text without either key comes back unchanged and blkid is never asked.
    #[test]
    fn grub_passes_through_unrelated_text(text in document(unrelated_line())) {
        let out = rewrite_grub_defaults(&text, "cryptroot", || {
            panic!("UUID queried without a GRUB_CMDLINE_LINUX= line")
        }).expect("rewrite");
        prop_assert_eq!(out, text);
    }

    /// Only key lines change; every other line keeps its position.
    #[test]
    fn grub_rewrites_only_key_lines(text in document(any_line())) {
        let out = rewrite_grub_defaults(&text, "vault", || Ok("abcd-1234".to_string()))
            .expect("rewrite");
        let cmdline = cmdline_line("abcd-1234", "vault");

        let before: Vec<&str> = text.split_inclusive('\n').collect();
        let after: Vec<&str> = out.split_inclusive('\n').collect();
        prop_assert_eq!(before.len(), after.len());
        for (old, new) in before.iter().zip(&after) {
            if old.starts_with(CMDLINE_KEY) {
                prop_assert_eq!(*new, format!("{cmdline}\n"));
            } else if old.starts_with(CRYPTODISK_KEY) {
                prop_assert_eq!(*new, "GRUB_ENABLE_CRYPTODISK=y\n");
            } else {
                prop_assert_eq!(new, old);
            }
        }
    }

    #[test]
    fn grub_rewrite_is_idempotent(text in document(any_line())) {
        let uuid = || Ok("abcd-1234".to_string());
        let once = rewrite_grub_defaults(&text, "cryptroot", uuid).expect("first");
        let twice = rewrite_grub_defaults(&once, "cryptroot", uuid).expect("second");
        prop_assert_eq!(once, twice);
    }
}

// =============================================================================
// mkinitcpio
// =============================================================================

proptest! {
    #[test]
    fn mkinitcpio_passes_through_unrelated_text(text in document(unrelated_line())) {
        prop_assert_eq!(rewrite_mkinitcpio_conf(&text), text);
    }

    #[test]
    fn mkinitcpio_replaces_every_hooks_line(text in document(any_line())) {
        let out = rewrite_mkinitcpio_conf(&text);
        let expected = format!("{}\n", hooks_line());
        let hooks_before = text.split_inclusive('\n').filter(|l| l.starts_with(HOOKS_KEY)).count();
        let hooks_after: Vec<&str> = out
            .split_inclusive('\n')
            .filter(|l| l.starts_with(HOOKS_KEY))
            .collect();
        prop_assert_eq!(hooks_before, hooks_after.len());
        prop_assert!(hooks_after.iter().all(|l| *l == expected));
    }

    #[test]
    fn mkinitcpio_rewrite_is_idempotent(text in document(any_line())) {
        let once = rewrite_mkinitcpio_conf(&text);
        prop_assert_eq!(rewrite_mkinitcpio_conf(&once), once.clone());
    }
}

// =============================================================================
// Validators
// =============================================================================

proptest! {
    #[test]
    fn username_matches_reference_pattern(input in "[ -~]{0,16}") {
        let trimmed = input.trim();
        prop_assert_eq!(validate_username(&input).is_ok(), is_username_reference(trimmed));
    }

    #[test]
    fn valid_usernames_are_accepted(name in "[a-z_][a-z0-9_-]{0,15}") {
        prop_assert_eq!(validate_username(&name).expect("valid"), name);
    }

    #[test]
    fn blank_mapping_name_selects_default(spaces in "[ \t]{0,5}") {
        prop_assert_eq!(normalize_mapping_name(&spaces), DEFAULT_MAPPING_NAME);
    }

    #[test]
    fn mapping_name_is_trimmed_and_kept(name in "[A-Za-z0-9_.-]{1,20}", pad in "[ ]{0,3}") {
        let padded = format!("{pad}{name}{pad}");
        prop_assert_eq!(normalize_mapping_name(&padded), name);
    }
}

// =============================================================================
// Partition Naming
// =============================================================================

proptest! {
    #[test]
    fn disks_ending_in_digit_get_p_separator(base in "(nvme|mmcblk|loop)[0-9]{1,2}(n[0-9])?") {
        let disk = format!("/dev/{base}");
        let layout = PartitionLayout::new(Path::new(&disk));
        prop_assert_eq!(layout.naming, PartitionNaming::NvmeStyle);
        prop_assert_eq!(layout.esp(), Path::new(&format!("{disk}p1")).to_path_buf());
        prop_assert_eq!(layout.luks(), Path::new(&format!("{disk}p2")).to_path_buf());
    }

    #[test]
    fn disks_ending_in_letter_get_plain_numbers(base in "(sd|vd|hd)[a-z]{1,2}") {
        let disk = format!("/dev/{base}");
        let layout = PartitionLayout::new(Path::new(&disk));
        prop_assert_eq!(layout.naming, PartitionNaming::Traditional);
        prop_assert_eq!(layout.esp(), Path::new(&format!("{disk}1")).to_path_buf());
        prop_assert_eq!(layout.luks(), Path::new(&format!("{disk}2")).to_path_buf());
    }
}
