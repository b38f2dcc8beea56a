// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Domain types for configuration objects and the workloads consuming them.

pub mod config_object;
pub mod workload;

pub use config_object::{ConfigKey, ConfigKind, ConfigObject, WatchPolicy};
pub use workload::{Workload, WorkloadKind, WorkloadRef};
