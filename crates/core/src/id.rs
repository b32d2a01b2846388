// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Identifier generation and validation.

use uuid::{Uuid, Variant};

/// Payload fields that must hold a well-formed UUID whenever present.
pub const IDENTIFIER_FIELDS: &[&str] = &["id", "anonymous_victim_id"];

/// Generate a fresh random (version 4) identifier.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Validate that a string is a hyphenated RFC 4122 UUID of version 1 through 5.
///
/// Braced, URN and simple (unhyphenated) forms are rejected even though the
/// `uuid` crate can parse them; the remote only stores the hyphenated form.
pub fn is_valid_uuid(s: &str) -> bool {
    if s.len() != 36 {
        return false;
    }
    match Uuid::try_parse(s) {
        Ok(uuid) => {
            uuid.get_variant() == Variant::RFC4122 && (1..=5).contains(&uuid.get_version_num())
        }
        Err(_) => false,
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
