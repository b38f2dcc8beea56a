// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Stable content fingerprints over the watched keys of a configuration object.

use crate::constants::FINGERPRINT_ENTRY_DELIMITER;
use crate::types::ConfigObject;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use fnv::FnvHasher;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::Hasher;

/// 64-bit FNV-1a digest of a configuration object's watched entries.
///
/// Only comparable between fingerprints computed with the same watched key set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(u64);

impl Fingerprint {
    pub fn of_str(data: &str) -> Self {
        let mut hasher = FnvHasher::default();
        hasher.write(data.as_bytes());
        Fingerprint(hasher.finish())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Fingerprint the entries of `object` selected by `watched_keys`.
///
/// `None` or an empty set selects every entry. Entries become `key=value`
/// strings (binary values base64 encoded) which are sorted before hashing.
pub fn fingerprint<K: ConfigObject>(
    object: &K,
    watched_keys: Option<&BTreeSet<String>>,
) -> Fingerprint {
    let selected =
        |key: &str| watched_keys.map_or(true, |keys| keys.is_empty() || keys.contains(key));

    let text = object
        .text_entries()
        .into_iter()
        .flatten()
        .filter(|(k, _)| selected(k.as_str()))
        .map(|(k, v)| format!("{}={}", k, v));

    let binary = object
        .binary_entries()
        .into_iter()
        .flatten()
        .filter(|(k, _)| selected(k.as_str()))
        .map(|(k, v)| format!("{}={}", k, BASE64.encode(&v.0)));

    let mut entries: Vec<String> = text.chain(binary).collect();
    entries.sort_unstable();

    Fingerprint::of_str(&entries.join(FINGERPRINT_ENTRY_DELIMITER))
}
