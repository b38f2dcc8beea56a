// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Pairs controller callbacks with the last processed state of each object.

use crate::reload::ChangeEvent;
use kube::{Resource, ResourceExt};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Last successfully processed object per (namespace, name).
///
/// Only advanced by `commit`, so an event that failed is re-evaluated against
/// the same previous state when it is redelivered.
pub struct TransitionLog<K> {
    committed: Mutex<HashMap<(String, String), Arc<K>>>,
}

impl<K> Default for TransitionLog<K> {
    fn default() -> Self {
        Self {
            committed: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Resource> TransitionLog<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify `current` against the committed state of the same object.
    ///
    /// A first sighting, or a UID change from delete-and-recreate, is a creation.
    pub fn observe(&self, current: Arc<K>) -> ChangeEvent<K> {
        let committed = self.committed.lock();
        match committed.get(&identity(current.as_ref())) {
            Some(old) if old.uid() == current.uid() => ChangeEvent::Updated {
                old: old.clone(),
                new: current,
            },
            _ => ChangeEvent::Created(current),
        }
    }

    pub fn commit(&self, object: Arc<K>) {
        let key = identity(object.as_ref());
        self.committed.lock().insert(key, object);
    }

    /// Drop the committed state of a deleted object
    pub fn forget(&self, namespace: &str, name: &str) -> Option<ChangeEvent<K>> {
        self.committed
            .lock()
            .remove(&(namespace.to_string(), name.to_string()))
            .map(ChangeEvent::Deleted)
    }

    /// Keep only the objects for which `keep(namespace, name)` holds
    pub fn retain(&self, mut keep: impl FnMut(&str, &str) -> bool) -> usize {
        let mut committed = self.committed.lock();
        let before = committed.len();
        committed.retain(|(namespace, name), _| keep(namespace, name));
        before - committed.len()
    }

    pub fn len(&self) -> usize {
        self.committed.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn identity<K: Resource>(object: &K) -> (String, String) {
    (object.namespace().unwrap_or_default(), object.name_any())
}
