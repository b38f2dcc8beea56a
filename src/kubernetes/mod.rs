// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes utilities for API scoping and the API-backed reload store.

pub mod scope;
pub mod store;

pub use scope::scoped_api;
pub use store::KubeStore;
