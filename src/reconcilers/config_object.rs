// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! ConfigMap and Secret reconciler - restarts dependents on watched changes.

use crate::config::{Config, WatchScope};
use crate::constants::reconcile::ERROR_REQUEUE_SECS;
use crate::error::{ReloaderError, Result};
use crate::kubernetes::scoped_api;
use crate::reconcilers::transitions::TransitionLog;
use crate::reload::{admits, Propagation, ReloadDriver};
use crate::types::{ConfigKey, ConfigObject};
use futures::{future, StreamExt, TryStreamExt};
use kube::{
    runtime::{controller, controller::Action, reflector, watcher, Controller, WatchStreamExt},
    Client, ResourceExt,
};
use kube_runtime::watcher::{Config as WatcherConfig, Event};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// State shared by every reconcile call for one kind of configuration object
pub struct ReloadContext<K> {
    driver: Arc<ReloadDriver>,
    transitions: TransitionLog<K>,
}

impl<K: ConfigObject> ReloadContext<K> {
    pub fn new(driver: Arc<ReloadDriver>) -> Self {
        Self {
            driver,
            transitions: TransitionLog::new(),
        }
    }

    fn deleted(&self, namespace: &str, name: &str) {
        if let Some(event) = self.transitions.forget(namespace, name) {
            debug!(
                "{} {}/{} deleted, admitted={}",
                K::KIND,
                namespace,
                name,
                admits(&event)
            );
        }
    }
}

pub struct ConfigObjectReconciler<K> {
    client: Client,
    scopes: Vec<WatchScope>,
    context: Arc<ReloadContext<K>>,
}

impl<K: ConfigObject> ConfigObjectReconciler<K> {
    pub fn new(client: Client, config: &Config, driver: Arc<ReloadDriver>) -> Self {
        Self {
            client,
            scopes: config.scopes(),
            context: Arc::new(ReloadContext::new(driver)),
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let controllers = self.scopes.iter().map(|scope| {
            info!("Watching {}s in {}", K::KIND, scope);
            let context = self.context.clone();
            let mut deletions = DeletionSync::new(scope.clone(), self.context.clone());

            // Deletions never reach reconcile, so they are taken off the shared watch
            let (reader, writer) = reflector::store();
            let objects = watcher(scoped_api::<K>(&self.client, scope), WatcherConfig::default())
                .default_backoff()
                .inspect_ok(move |event| deletions.apply(event))
                .reflect(writer)
                .applied_objects();

            Controller::for_stream(objects, reader)
                .run(reconcile::<K>, error_policy::<K>, self.context.clone())
                .for_each(move |res| {
                    match res {
                        Ok((o, _)) => debug!("Reconciled {}: {:?}", K::KIND, o),
                        Err(controller::Error::ObjectNotFound(o)) => {
                            context.deleted(o.namespace.as_deref().unwrap_or_default(), &o.name)
                        }
                        Err(e) => warn!("Reconciliation error: {:?}", e),
                    }
                    future::ready(())
                })
        });

        future::join_all(controllers).await;
        Ok(())
    }
}

/// Drops transition state for objects that left one watch scope.
///
/// Objects deleted while the watch was disconnected are missing from the next
/// listing and dropped once it completes.
pub struct DeletionSync<K> {
    scope: WatchScope,
    context: Arc<ReloadContext<K>>,
    listing: HashSet<(String, String)>,
}

impl<K: ConfigObject> DeletionSync<K> {
    pub fn new(scope: WatchScope, context: Arc<ReloadContext<K>>) -> Self {
        Self {
            scope,
            context,
            listing: HashSet::new(),
        }
    }

    pub fn apply(&mut self, event: &Event<K>) {
        match event {
            Event::Init => self.listing.clear(),
            Event::InitApply(object) => {
                self.listing
                    .insert((object.namespace().unwrap_or_default(), object.name_any()));
            }
            Event::InitDone => {
                let listing = std::mem::take(&mut self.listing);
                let scope = &self.scope;
                let dropped = self.context.transitions.retain(|namespace, name| {
                    !scope.contains(namespace)
                        || listing.contains(&(namespace.to_string(), name.to_string()))
                });
                if dropped > 0 {
                    debug!("Dropped {} {}(s) gone from {}", dropped, K::KIND, scope);
                }
            }
            Event::Delete(object) => self
                .context
                .deleted(&object.namespace().unwrap_or_default(), &object.name_any()),
            Event::Apply(_) => {}
        }
    }
}

async fn reconcile<K: ConfigObject>(object: Arc<K>, ctx: Arc<ReloadContext<K>>) -> Result<Action> {
    let key = ConfigKey::of(object.as_ref());
    let event = ctx.transitions.observe(object.clone());

    if !admits(&event) {
        debug!("No watched change in {}, skipping", key);
        ctx.transitions.commit(object);
        return Ok(Action::await_change());
    }

    info!("Watched content of {} changed", key);
    match ctx.driver.reconcile(&key).await? {
        Propagation::Vanished => {
            ctx.transitions.forget(&key.namespace, &key.name);
        }
        Propagation::Restarted(workloads) => {
            info!("Reloaded {} workload(s) for {}", workloads.len(), key);
            ctx.transitions.commit(object);
        }
    }

    Ok(Action::await_change())
}

fn error_policy<K: ConfigObject>(
    object: Arc<K>,
    error: &ReloaderError,
    _ctx: Arc<ReloadContext<K>>,
) -> Action {
    error!("Failed to reload dependents of {}: {}", ConfigKey::of(object.as_ref()), error);
    Action::requeue(Duration::from_secs(ERROR_REQUEUE_SECS))
}
