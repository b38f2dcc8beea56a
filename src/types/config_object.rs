// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! ConfigMaps and Secrets as watched configuration objects.

use crate::constants::annotations;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use k8s_openapi::{ByteString, NamespaceResourceScope};
use kube::{Resource, ResourceExt};
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// The kinds of configuration object that can trigger reloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConfigKind {
    ConfigMap,
    Secret,
}

impl fmt::Display for ConfigKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigKind::ConfigMap => f.write_str("configmap"),
            ConfigKind::Secret => f.write_str("secret"),
        }
    }
}

/// Namespace-qualified identity of a configuration object
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConfigKey {
    pub kind: ConfigKind,
    pub namespace: String,
    pub name: String,
}

impl ConfigKey {
    pub fn new(kind: ConfigKind, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn of<K: ConfigObject>(object: &K) -> Self {
        Self::new(
            K::KIND,
            object.namespace().unwrap_or_default(),
            object.name_any(),
        )
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}/{}", self.kind, self.namespace, self.name)
    }
}

/// A key/value bundle whose watched content decides whether dependents restart.
///
/// Text entries are hashed as-is, binary entries as opaque bytes.
pub trait ConfigObject:
    Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone
    + DeserializeOwned
    + fmt::Debug
    + Send
    + Sync
    + 'static
{
    const KIND: ConfigKind;

    fn text_entries(&self) -> Option<&BTreeMap<String, String>>;

    fn binary_entries(&self) -> Option<&BTreeMap<String, ByteString>>;

    /// Tracking policy derived from the object's annotations
    fn watch_policy(&self) -> WatchPolicy {
        self.meta()
            .annotations
            .as_ref()
            .map(WatchPolicy::from_annotations)
            .unwrap_or_default()
    }
}

impl ConfigObject for ConfigMap {
    const KIND: ConfigKind = ConfigKind::ConfigMap;

    fn text_entries(&self) -> Option<&BTreeMap<String, String>> {
        self.data.as_ref()
    }

    fn binary_entries(&self) -> Option<&BTreeMap<String, ByteString>> {
        self.binary_data.as_ref()
    }
}

impl ConfigObject for Secret {
    const KIND: ConfigKind = ConfigKind::Secret;

    fn text_entries(&self) -> Option<&BTreeMap<String, String>> {
        self.string_data.as_ref()
    }

    fn binary_entries(&self) -> Option<&BTreeMap<String, ByteString>> {
        self.data.as_ref()
    }
}

/// Per-object tracking settings read from annotations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchPolicy {
    pub tracking_enabled: bool,
    /// `None` means every key is watched
    pub watched_keys: Option<BTreeSet<String>>,
}

impl Default for WatchPolicy {
    fn default() -> Self {
        Self {
            tracking_enabled: true,
            watched_keys: None,
        }
    }
}

impl WatchPolicy {
    pub fn from_annotations(annotations: &BTreeMap<String, String>) -> Self {
        // Once present, only an explicit "true" keeps tracking on
        let tracking_enabled = annotations
            .get(annotations::WATCH)
            .map_or(true, |v| v.trim().eq_ignore_ascii_case("true"));

        let watched_keys = annotations
            .get(annotations::KEYS_TO_WATCH)
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|k| !k.is_empty())
                    .map(str::to_string)
                    .collect::<BTreeSet<_>>()
            })
            .filter(|keys| !keys.is_empty());

        Self {
            tracking_enabled,
            watched_keys,
        }
    }
}
