// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Canonical key layout
//!
//! Objects land in the intake bucket under arbitrary prefixes with their
//! content digest as the final path segment. Their canonical home is a
//! sharded key derived from the identity that owns the content:
//!
//! ```text
//! 1a/2b/3c/4d/1a2b3c4d5e6f...
//! ```
//!
//! The two-character shard prefix keeps the destination namespace from
//! hot-spotting on a flat listing.

/// Extract the content digest from an object key
///
/// The digest is the key's final path segment (the base name). Returns
/// `None` when the key has no non-empty final segment.
pub fn digest_from_key(key: &str) -> Option<&str> {
    let trimmed = key.trim_end_matches('/');
    let base = trimmed.rsplit('/').next().unwrap_or(trimmed);
    (!base.is_empty()).then_some(base)
}

/// Derive the canonical sharded key for an identity
///
/// The first eight characters of the identity are split into two-character
/// segments to form the shard prefix, and the full identity becomes the
/// final segment. Identities shorter than eight characters shard on as many
/// complete pairs as they have.
pub fn canonical_path(identity: &str) -> String {
    let head: Vec<char> = identity.chars().take(8).collect();
    let mut segments: Vec<String> = head
        .chunks_exact(2)
        .map(|pair| pair.iter().collect())
        .collect();
    segments.push(identity.to_string());
    segments.join("/")
}
