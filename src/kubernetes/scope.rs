// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Namespace scoping of API handles

use crate::config::WatchScope;
use k8s_openapi::NamespaceResourceScope;
use kube::{Api, Client, Resource};

/// An `Api` covering the whole cluster or a single namespace
pub fn scoped_api<K>(client: &Client, scope: &WatchScope) -> Api<K>
where
    K: Resource<Scope = NamespaceResourceScope>,
    <K as Resource>::DynamicType: Default,
{
    match scope {
        WatchScope::Cluster => Api::all(client.clone()),
        WatchScope::Namespace(ns) => Api::namespaced(client.clone(), ns),
    }
}
