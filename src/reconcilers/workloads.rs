// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Workload watches feeding the dependency index.

use crate::config::{Config, WatchScope};
use crate::kubernetes::scoped_api;
use crate::reload::{extract_references, DependencyIndex, IndexSource, WorkloadReferences};
use crate::types::{Workload, WorkloadKind, WorkloadRef};
use futures::{future, future::BoxFuture, FutureExt, StreamExt};
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use kube::{runtime::WatchStreamExt, Client};
use kube_runtime::watcher::{watcher, Config as WatcherConfig, Event};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Keeps the dependency index current for every workload kind in every scope
pub struct WorkloadRegistrar {
    client: Client,
    scopes: Vec<WatchScope>,
    index: Arc<DependencyIndex>,
}

impl WorkloadRegistrar {
    pub fn new(client: Client, config: &Config, index: Arc<DependencyIndex>) -> Self {
        Self {
            client,
            scopes: config.scopes(),
            index,
        }
    }

    /// The watch streams this registrar will run, used to seed index readiness
    pub fn sources(config: &Config) -> Vec<IndexSource> {
        config
            .scopes()
            .into_iter()
            .flat_map(|scope| {
                WorkloadKind::ALL
                    .into_iter()
                    .map(move |kind| IndexSource::new(kind, scope.clone()))
            })
            .collect()
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let mut watches: Vec<BoxFuture<'static, ()>> = Vec::new();
        for scope in &self.scopes {
            watches.push(self.watch::<Deployment>(scope));
            watches.push(self.watch::<StatefulSet>(scope));
            watches.push(self.watch::<DaemonSet>(scope));
        }

        future::join_all(watches).await;
        Ok(())
    }

    fn watch<W: Workload>(&self, scope: &WatchScope) -> BoxFuture<'static, ()> {
        watch_workloads::<W>(self.client.clone(), scope.clone(), self.index.clone()).boxed()
    }
}

async fn watch_workloads<W: Workload>(client: Client, scope: WatchScope, index: Arc<DependencyIndex>) {
    info!("Watching {}s in {}", W::KIND, scope);
    let api = scoped_api::<W>(&client, &scope);
    let mut sync = SourceSync::new(IndexSource::new(W::KIND, scope), index);

    let mut events = watcher(api, WatcherConfig::default())
        .default_backoff()
        .boxed();
    while let Some(event) = events.next().await {
        match event {
            Ok(event) => sync.apply(event),
            Err(e) => warn!("Watch error for {}: {}", sync.source, e),
        }
    }
    warn!("Watch for {} ended", sync.source);
}

/// Applies watch events of a single source to the index.
///
/// An initial listing is buffered and swapped in as a whole once complete.
pub struct SourceSync {
    source: IndexSource,
    index: Arc<DependencyIndex>,
    listing: Vec<(WorkloadRef, WorkloadReferences)>,
}

impl SourceSync {
    pub fn new(source: IndexSource, index: Arc<DependencyIndex>) -> Self {
        Self {
            source,
            index,
            listing: Vec::new(),
        }
    }

    pub fn apply<W: Workload>(&mut self, event: Event<W>) {
        match event {
            Event::Init => {
                debug!("Listing {}", self.source);
                self.listing.clear();
            }
            Event::InitApply(workload) => {
                self.listing
                    .push((WorkloadRef::of(&workload), extract_references(&workload)));
            }
            Event::InitDone => {
                let listing = std::mem::take(&mut self.listing);
                info!("Indexed {} workload(s) for {}", listing.len(), self.source);
                self.index.restore(&self.source, listing);
            }
            Event::Apply(workload) => self.index.register(&workload),
            Event::Delete(workload) => self.index.remove(&WorkloadRef::of(&workload)),
        }
    }
}
