// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Change detection and dependency propagation.

pub mod driver;
pub mod filter;
pub mod fingerprint;
pub mod index;
pub mod references;

pub use driver::{ObjectSource, Propagation, ReloadDriver, WorkloadPatcher};
pub use filter::{admits, should_propagate, ChangeEvent};
pub use fingerprint::{fingerprint, Fingerprint};
pub use index::{DependencyIndex, DependentLookup, IndexSource};
pub use references::{extract_references, extract_references_of_kind, WorkloadReferences};
