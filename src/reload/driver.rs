// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Turns an admitted configuration change into workload restarts.

use crate::constants::annotations;
use crate::error::Result;
use crate::reload::index::DependentLookup;
use crate::types::{ConfigKey, WorkloadRef};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use kube::api::ObjectMeta;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// Fetches the current state of configuration objects
#[async_trait]
pub trait ObjectSource: Send + Sync {
    /// Metadata of the object, or `None` when it no longer exists
    async fn fetch(&self, key: &ConfigKey) -> Result<Option<ObjectMeta>>;
}

/// Applies minimal partial updates to workloads
#[async_trait]
pub trait WorkloadPatcher: Send + Sync {
    /// Set a single annotation on the workload's pod template, leaving
    /// everything else untouched
    async fn annotate_pod_template(
        &self,
        workload: &WorkloadRef,
        annotation: &str,
        value: &str,
    ) -> Result<()>;
}

/// Result of a successful reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Propagation {
    /// The object was deleted before it could be processed
    Vanished,
    /// These dependents were told to restart
    Restarted(Vec<WorkloadRef>),
}

pub struct ReloadDriver {
    objects: Arc<dyn ObjectSource>,
    dependents: Arc<dyn DependentLookup>,
    workloads: Arc<dyn WorkloadPatcher>,
}

impl ReloadDriver {
    pub fn new(
        objects: Arc<dyn ObjectSource>,
        dependents: Arc<dyn DependentLookup>,
        workloads: Arc<dyn WorkloadPatcher>,
    ) -> Self {
        Self {
            objects,
            dependents,
            workloads,
        }
    }

    /// Re-fetch the object, find its dependents and restart each of them.
    ///
    /// Every dependent is attempted even when an earlier one fails; the first
    /// failure is then returned so the event gets redelivered.
    #[instrument(skip(self, key), fields(object = %key))]
    pub async fn reconcile(&self, key: &ConfigKey) -> Result<Propagation> {
        let Some(meta) = self.objects.fetch(key).await? else {
            info!("Object no longer exists, nothing to reload");
            return Ok(Propagation::Vanished);
        };
        debug!(
            resource_version = meta.resource_version.as_deref().unwrap_or_default(),
            "Fetched object"
        );

        let dependents = self.dependents.dependents(key)?;
        if dependents.is_empty() {
            debug!("No workloads reference this object");
            return Ok(Propagation::Restarted(Vec::new()));
        }

        let timestamp = reload_timestamp();
        let mut restarted = Vec::with_capacity(dependents.len());
        let mut first_error = None;

        for workload in dependents {
            match self
                .workloads
                .annotate_pod_template(&workload, annotations::RELOAD_TIMESTAMP, &timestamp)
                .await
            {
                Ok(()) => {
                    info!(workload = %workload, "Triggered reload");
                    restarted.push(workload);
                }
                Err(e) => {
                    error!(workload = %workload, "Failed to trigger reload: {}", e);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(Propagation::Restarted(restarted)),
        }
    }
}

/// Value written to the reload annotation, RFC 3339 in UTC with microseconds
pub fn reload_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
