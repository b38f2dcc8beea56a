// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Extraction of the ConfigMaps and Secrets a workload's pod template consumes.

use crate::types::{ConfigKey, ConfigKind, Workload};
use k8s_openapi::api::core::v1::{Container, PodSpec};
use std::collections::BTreeSet;

/// Names of the configuration objects a workload references, per kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkloadReferences {
    pub config_maps: BTreeSet<String>,
    pub secrets: BTreeSet<String>,
}

impl WorkloadReferences {
    pub fn names(&self, kind: ConfigKind) -> &BTreeSet<String> {
        match kind {
            ConfigKind::ConfigMap => &self.config_maps,
            ConfigKind::Secret => &self.secrets,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.config_maps.is_empty() && self.secrets.is_empty()
    }

    /// Keys of every referenced object, resolved in the workload's namespace
    pub fn keys<'a>(&'a self, namespace: &'a str) -> impl Iterator<Item = ConfigKey> + 'a {
        let config_maps = self
            .config_maps
            .iter()
            .map(move |name| ConfigKey::new(ConfigKind::ConfigMap, namespace, name.as_str()));
        let secrets = self
            .secrets
            .iter()
            .map(move |name| ConfigKey::new(ConfigKind::Secret, namespace, name.as_str()));
        config_maps.chain(secrets)
    }

    fn add_config_map(&mut self, name: impl Into<Option<String>>) {
        insert_name(&mut self.config_maps, name);
    }

    fn add_secret(&mut self, name: impl Into<Option<String>>) {
        insert_name(&mut self.secrets, name);
    }
}

// Unnamed references are dropped
fn insert_name(names: &mut BTreeSet<String>, name: impl Into<Option<String>>) {
    if let Some(name) = name.into().filter(|n| !n.is_empty()) {
        names.insert(name);
    }
}

/// All ConfigMap and Secret names referenced from the workload's pod template
pub fn extract_references<W: Workload>(workload: &W) -> WorkloadReferences {
    workload
        .pod_template()
        .and_then(|t| t.spec.as_ref())
        .map(references_in_pod_spec)
        .unwrap_or_default()
}

/// Referenced names of a single kind
pub fn extract_references_of_kind<W: Workload>(workload: &W, kind: ConfigKind) -> BTreeSet<String> {
    extract_references(workload).names(kind).clone()
}

pub fn references_in_pod_spec(spec: &PodSpec) -> WorkloadReferences {
    let mut refs = WorkloadReferences::default();

    for volume in spec.volumes.iter().flatten() {
        if let Some(cm) = &volume.config_map {
            refs.add_config_map(cm.name.clone());
        }
        if let Some(secret) = &volume.secret {
            refs.add_secret(secret.secret_name.clone());
        }
        let sources = volume.projected.as_ref().and_then(|p| p.sources.as_ref());
        for source in sources.into_iter().flatten() {
            if let Some(cm) = &source.config_map {
                refs.add_config_map(cm.name.clone());
            }
            if let Some(secret) = &source.secret {
                refs.add_secret(secret.name.clone());
            }
        }
    }

    let containers = spec
        .containers
        .iter()
        .chain(spec.init_containers.iter().flatten());
    for container in containers {
        add_container_references(&mut refs, container);
    }

    refs
}

fn add_container_references(refs: &mut WorkloadReferences, container: &Container) {
    let value_sources = container
        .env
        .iter()
        .flatten()
        .filter_map(|env| env.value_from.as_ref());
    for source in value_sources {
        if let Some(selector) = &source.config_map_key_ref {
            refs.add_config_map(selector.name.clone());
        }
        if let Some(selector) = &source.secret_key_ref {
            refs.add_secret(selector.name.clone());
        }
    }

    for env_from in container.env_from.iter().flatten() {
        if let Some(cm) = &env_from.config_map_ref {
            refs.add_config_map(cm.name.clone());
        }
        if let Some(secret) = &env_from.secret_ref {
            refs.add_secret(secret.name.clone());
        }
    }
}
