// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! API server backed implementations of the reload collaborators

use crate::constants::OPERATOR_NAME;
use crate::error::Result;
use crate::reload::{ObjectSource, WorkloadPatcher};
use crate::types::{ConfigKey, ConfigKind, Workload, WorkloadKind, WorkloadRef};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use k8s_openapi::NamespaceResourceScope;
use kube::{
    api::{ObjectMeta, Patch, PatchParams},
    Api, Client, Resource,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::fmt::Debug;
use tracing::{debug, instrument};

/// Reads configuration objects and patches workloads through the API server
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectSource for KubeStore {
    async fn fetch(&self, key: &ConfigKey) -> Result<Option<ObjectMeta>> {
        match key.kind {
            ConfigKind::ConfigMap => fetch_metadata::<ConfigMap>(&self.client, key).await,
            ConfigKind::Secret => fetch_metadata::<Secret>(&self.client, key).await,
        }
    }
}

#[async_trait]
impl WorkloadPatcher for KubeStore {
    async fn annotate_pod_template(
        &self,
        workload: &WorkloadRef,
        annotation: &str,
        value: &str,
    ) -> Result<()> {
        let patch = pod_template_annotation_patch(annotation, value);
        match workload.kind {
            WorkloadKind::Deployment => {
                patch_workload::<Deployment>(&self.client, workload, &patch).await
            }
            WorkloadKind::StatefulSet => {
                patch_workload::<StatefulSet>(&self.client, workload, &patch).await
            }
            WorkloadKind::DaemonSet => {
                patch_workload::<DaemonSet>(&self.client, workload, &patch).await
            }
        }
    }
}

/// Merge patch touching only one pod template annotation
pub fn pod_template_annotation_patch(annotation: &str, value: &str) -> Value {
    json!({
        "spec": {
            "template": {
                "metadata": {
                    "annotations": { annotation: value }
                }
            }
        }
    })
}

// Metadata-only GET; the object's data is not needed once the change is admitted
#[instrument(skip(client, key), fields(object = %key))]
async fn fetch_metadata<K>(client: &Client, key: &ConfigKey) -> Result<Option<ObjectMeta>>
where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Clone
        + DeserializeOwned
        + Debug,
{
    let api: Api<K> = Api::namespaced(client.clone(), &key.namespace);
    let found = api.get_metadata_opt(&key.name).await?;
    debug!(found = found.is_some(), "Fetched object metadata");
    Ok(found.map(|partial| partial.metadata))
}

#[instrument(skip(client, workload, patch), fields(workload = %workload))]
async fn patch_workload<W: Workload>(
    client: &Client,
    workload: &WorkloadRef,
    patch: &Value,
) -> Result<()> {
    let api: Api<W> = Api::namespaced(client.clone(), &workload.namespace);
    let params = PatchParams {
        field_manager: Some(OPERATOR_NAME.to_string()),
        ..Default::default()
    };
    api.patch(&workload.name, &params, &Patch::Merge(patch)).await?;
    debug!("Patched pod template");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::annotations;
    use crate::error::ReloaderError;
    use crate::test_utils::{deployment_json, partial_metadata_json, MockService};

    #[test]
    fn test_patch_only_touches_pod_template_annotation() {
        let patch =
            pod_template_annotation_patch(annotations::RELOAD_TIMESTAMP, "2026-01-01T00:00:00Z");

        assert_eq!(
            patch,
            json!({
                "spec": {
                    "template": {
                        "metadata": {
                            "annotations": {
                                "k8s-confsec-reloader.io/reload-timestamp": "2026-01-01T00:00:00Z"
                            }
                        }
                    }
                }
            })
        );
    }

    #[tokio::test]
    async fn test_fetch_existing_config_map() {
        let mock = MockService::new().on_get(
            "/api/v1/namespaces/default/configmaps/my-config",
            200,
            &partial_metadata_json("default", "my-config", "123"),
        );
        let store = KubeStore::new(mock.client());

        let meta = store
            .fetch(&ConfigKey::new(ConfigKind::ConfigMap, "default", "my-config"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(meta.name.as_deref(), Some("my-config"));
        assert_eq!(meta.resource_version.as_deref(), Some("123"));
    }

    #[tokio::test]
    async fn test_fetch_missing_secret_is_none() {
        let mock = MockService::new();
        let store = KubeStore::new(mock.client());

        let meta = store
            .fetch(&ConfigKey::new(ConfigKind::Secret, "default", "my-secret"))
            .await
            .unwrap();

        assert!(meta.is_none());
        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "GET");
        assert_eq!(requests[0].path, "/api/v1/namespaces/default/secrets/my-secret");
    }

    #[tokio::test]
    async fn test_fetch_server_error_is_surfaced() {
        let mock = MockService::new().on_get(
            "/api/v1/namespaces/default/configmaps/my-config",
            500,
            r#"{"kind":"Status","apiVersion":"v1","status":"Failure","message":"etcd unavailable","reason":"InternalError","code":500}"#,
        );
        let store = KubeStore::new(mock.client());

        let result = store
            .fetch(&ConfigKey::new(ConfigKind::ConfigMap, "default", "my-config"))
            .await;

        assert!(matches!(result, Err(ReloaderError::KubeError(_))));
    }

    #[tokio::test]
    async fn test_annotate_deployment_sends_merge_patch() {
        let path = "/apis/apps/v1/namespaces/default/deployments/test-app";
        let mock = MockService::new().on_patch(path, 200, &deployment_json("default", "test-app"));
        let store = KubeStore::new(mock.client());
        let workload = WorkloadRef::new(WorkloadKind::Deployment, "default", "test-app");

        store
            .annotate_pod_template(&workload, annotations::RELOAD_TIMESTAMP, "2026-01-01T00:00:00Z")
            .await
            .unwrap();

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "PATCH");
        assert_eq!(requests[0].path, path);
        assert_eq!(
            requests[0].content_type.as_deref(),
            Some("application/merge-patch+json")
        );
        assert_eq!(
            requests[0].body,
            pod_template_annotation_patch(annotations::RELOAD_TIMESTAMP, "2026-01-01T00:00:00Z")
        );
    }

    #[tokio::test]
    async fn test_annotate_uses_workload_kind_path() {
        let mock = MockService::new();
        let store = KubeStore::new(mock.client());
        let workload = WorkloadRef::new(WorkloadKind::StatefulSet, "db", "postgres");

        // Unregistered path answers 404, which must be surfaced
        let result = store
            .annotate_pod_template(&workload, annotations::RELOAD_TIMESTAMP, "now")
            .await;

        assert!(result.is_err());
        assert_eq!(
            mock.requests()[0].path,
            "/apis/apps/v1/namespaces/db/statefulsets/postgres"
        );
    }
}
