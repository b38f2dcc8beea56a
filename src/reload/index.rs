// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Reverse index from configuration objects to the workloads consuming them.
//!
//! The index keeps a forward map (workload → references) next to the reverse
//! map (config object → workloads). Both are updated under one write lock, so a
//! reader sees either the old or the new reference set of a workload.

use crate::config::WatchScope;
use crate::error::{ReloaderError, Result};
use crate::reload::references::{extract_references, WorkloadReferences};
use crate::types::{ConfigKey, Workload, WorkloadKind, WorkloadRef};
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Read side of the dependency index as seen by the reconciliation driver
pub trait DependentLookup: Send + Sync {
    /// Workloads currently believed to reference `key`
    fn dependents(&self, key: &ConfigKey) -> Result<BTreeSet<WorkloadRef>>;
}

/// One watched stream of workloads: a workload kind in a scope
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexSource {
    pub kind: WorkloadKind,
    pub scope: WatchScope,
}

impl IndexSource {
    pub fn new(kind: WorkloadKind, scope: WatchScope) -> Self {
        Self { kind, scope }
    }

    pub fn contains(&self, workload: &WorkloadRef) -> bool {
        workload.kind == self.kind && self.scope.contains(&workload.namespace)
    }
}

impl fmt::Display for IndexSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in {}", self.kind, self.scope)
    }
}

#[derive(Default)]
struct IndexState {
    forward: HashMap<WorkloadRef, Arc<WorkloadReferences>>,
    reverse: HashMap<ConfigKey, BTreeSet<WorkloadRef>>,
    /// Sources whose initial list has not completed yet
    pending: HashSet<IndexSource>,
}

impl IndexState {
    fn replace(&mut self, workload: WorkloadRef, references: WorkloadReferences) {
        self.unlink(&workload);
        if references.is_empty() {
            return;
        }

        for key in references.keys(&workload.namespace) {
            self.reverse.entry(key).or_default().insert(workload.clone());
        }
        self.forward.insert(workload, Arc::new(references));
    }

    fn unlink(&mut self, workload: &WorkloadRef) -> bool {
        let Some(previous) = self.forward.remove(workload) else {
            return false;
        };

        for key in previous.keys(&workload.namespace) {
            if let Some(dependents) = self.reverse.get_mut(&key) {
                dependents.remove(workload);
                if dependents.is_empty() {
                    self.reverse.remove(&key);
                }
            }
        }
        true
    }
}

/// Concurrency-safe dependency index shared by all reconcilers
#[derive(Default)]
pub struct DependencyIndex {
    state: RwLock<IndexState>,
}

impl DependencyIndex {
    /// An index that reports itself unavailable until every source has been
    /// restored from its initial list.
    pub fn with_sources(sources: impl IntoIterator<Item = IndexSource>) -> Self {
        Self {
            state: RwLock::new(IndexState {
                pending: sources.into_iter().collect(),
                ..Default::default()
            }),
        }
    }

    /// Re-extract and replace the references of a single workload
    pub fn register<W: Workload>(&self, workload: &W) {
        self.replace(WorkloadRef::of(workload), extract_references(workload));
    }

    /// Atomically swap the reference set recorded for `workload`
    pub fn replace(&self, workload: WorkloadRef, references: WorkloadReferences) {
        debug!(workload = %workload, "Indexing workload references");
        self.state.write().replace(workload, references);
    }

    pub fn remove(&self, workload: &WorkloadRef) {
        if self.state.write().unlink(workload) {
            debug!(workload = %workload, "Removed workload from index");
        }
    }

    /// Replace everything known about `source` with a fresh listing.
    ///
    /// Workloads of that source missing from `entries` are dropped, which
    /// cleans up deletions missed while a watch was disconnected.
    pub fn restore(
        &self,
        source: &IndexSource,
        entries: impl IntoIterator<Item = (WorkloadRef, WorkloadReferences)>,
    ) {
        let entries: Vec<_> = entries.into_iter().collect();
        let listed: HashSet<&WorkloadRef> = entries.iter().map(|(w, _)| w).collect();

        let mut state = self.state.write();
        let stale: Vec<WorkloadRef> = state
            .forward
            .keys()
            .filter(|w| source.contains(w) && !listed.contains(w))
            .cloned()
            .collect();
        for workload in &stale {
            state.unlink(workload);
        }
        let count = entries.len();
        for (workload, references) in entries {
            state.replace(workload, references);
        }
        state.pending.remove(source);

        debug!(
            source = %source,
            workloads = count,
            dropped = stale.len(),
            "Restored index source"
        );
    }

    pub fn is_ready(&self) -> bool {
        self.state.read().pending.is_empty()
    }

    pub fn lookup(&self, key: &ConfigKey) -> Result<BTreeSet<WorkloadRef>> {
        let state = self.state.read();
        if !state.pending.is_empty() {
            return Err(ReloaderError::IndexNotReady(format!(
                "{} workload source(s) still syncing",
                state.pending.len()
            )));
        }

        Ok(state.reverse.get(key).cloned().unwrap_or_default())
    }

    /// Snapshot of the references recorded for one workload
    pub fn references_of(&self, workload: &WorkloadRef) -> Option<Arc<WorkloadReferences>> {
        self.state.read().forward.get(workload).cloned()
    }

    /// Number of workloads with at least one reference
    pub fn len(&self) -> usize {
        self.state.read().forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DependentLookup for DependencyIndex {
    fn dependents(&self, key: &ConfigKey) -> Result<BTreeSet<WorkloadRef>> {
        self.lookup(key)
    }
}
