// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Decides which configuration object transitions should restart dependents.

use crate::reload::fingerprint::fingerprint;
use crate::types::ConfigObject;
use std::sync::Arc;

/// A transition observed for one configuration object
#[derive(Debug, Clone)]
pub enum ChangeEvent<K> {
    Created(Arc<K>),
    Updated { old: Arc<K>, new: Arc<K> },
    Deleted(Arc<K>),
}

impl<K> ChangeEvent<K> {
    /// The most recent state carried by the event
    pub fn object(&self) -> &Arc<K> {
        match self {
            ChangeEvent::Created(obj) | ChangeEvent::Deleted(obj) => obj,
            ChangeEvent::Updated { new, .. } => new,
        }
    }
}

/// Only updates can qualify. Creations and deletions never restart dependents.
pub fn admits<K: ConfigObject>(event: &ChangeEvent<K>) -> bool {
    match event {
        ChangeEvent::Created(_) | ChangeEvent::Deleted(_) => false,
        ChangeEvent::Updated { old, new } => should_propagate(old.as_ref(), new.as_ref()),
    }
}

/// True when the watched content differs between `old` and `new`.
///
/// The policy of `new` governs both sides of the comparison.
pub fn should_propagate<K: ConfigObject>(old: &K, new: &K) -> bool {
    let policy = new.watch_policy();
    if !policy.tracking_enabled {
        return false;
    }

    let watched = policy.watched_keys.as_ref();
    fingerprint(old, watched) != fingerprint(new, watched)
}
