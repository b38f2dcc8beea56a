// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Kubernetes annotation keys used by the reloader
pub mod annotations {
    /// Set to "false" on a ConfigMap or Secret to stop tracking it
    pub const WATCH: &str = "k8s-confsec-reloader.io/watch";
    /// Comma-separated list of keys whose changes trigger a reload (optional)
    pub const KEYS_TO_WATCH: &str = "k8s-confsec-reloader.io/keys-to-watch";
    /// Written on workload pod templates to force a rollout
    pub const RELOAD_TIMESTAMP: &str = "k8s-confsec-reloader.io/reload-timestamp";
}

/// The operator name used as field manager for patches
pub const OPERATOR_NAME: &str = "confsec-reloader";

/// Environment variable holding the comma-separated namespaces to watch
pub const WATCH_NAMESPACE_ENV: &str = "WATCH_NAMESPACE";

/// Separator placed between `key=value` entries before hashing.
///
/// Values are not escaped, so `{a: "1;b=2"}` and `{a: "1", b: "2"}` share a
/// fingerprint. Kept for fingerprint compatibility with existing deployments.
pub const FINGERPRINT_ENTRY_DELIMITER: &str = ";";

/// Reconciliation retry configuration
pub mod reconcile {
    /// Delay before a failed reconciliation is redelivered
    pub const ERROR_REQUEUE_SECS: u64 = 30;
}
