// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::WATCH_NAMESPACE_ENV;
use anyhow::{Context, Result};
use std::env;
use std::fmt;

/// Where watches and controllers are pointed at
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WatchScope {
    Cluster,
    Namespace(String),
}

impl WatchScope {
    /// Whether an object living in `namespace` is visible from this scope
    pub fn contains(&self, namespace: &str) -> bool {
        match self {
            WatchScope::Cluster => true,
            WatchScope::Namespace(ns) => ns == namespace,
        }
    }
}

impl fmt::Display for WatchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchScope::Cluster => f.write_str("<cluster>"),
            WatchScope::Namespace(ns) => f.write_str(ns),
        }
    }
}

/// Operator configuration loaded from environment variables
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Namespaces to watch; empty means the whole cluster
    pub namespaces: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let namespaces = match env::var(WATCH_NAMESPACE_ENV) {
            Ok(raw) => parse_namespaces(&raw),
            Err(env::VarError::NotPresent) => Vec::new(),
            Err(e) => {
                return Err(e).with_context(|| format!("{} is not valid unicode", WATCH_NAMESPACE_ENV))
            }
        };

        Ok(Config { namespaces })
    }

    /// One scope per configured namespace, or a single cluster-wide scope
    pub fn scopes(&self) -> Vec<WatchScope> {
        if self.namespaces.is_empty() {
            vec![WatchScope::Cluster]
        } else {
            self.namespaces
                .iter()
                .cloned()
                .map(WatchScope::Namespace)
                .collect()
        }
    }
}

/// Split a comma-separated namespace list, dropping blanks and duplicates
pub fn parse_namespaces(raw: &str) -> Vec<String> {
    let mut namespaces: Vec<String> = Vec::new();
    for ns in raw.split(',').map(str::trim).filter(|ns| !ns.is_empty()) {
        if !namespaces.iter().any(|existing| existing == ns) {
            namespaces.push(ns.to_string());
        }
    }
    namespaces
}
