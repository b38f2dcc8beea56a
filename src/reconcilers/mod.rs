// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes reconcilers that react to watch events.

pub mod config_object;
pub mod transitions;
pub mod workloads;

pub use config_object::ConfigObjectReconciler;
pub use transitions::TransitionLog;
pub use workloads::{SourceSync, WorkloadRegistrar};
