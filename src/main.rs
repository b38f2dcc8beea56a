// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use kube::Client;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use confsec_reloader::config::Config;
use confsec_reloader::kubernetes::KubeStore;
use confsec_reloader::reconcilers::{ConfigObjectReconciler, WorkloadRegistrar};
use confsec_reloader::reload::{DependencyIndex, ReloadDriver};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing, honouring RUST_LOG
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting config/secret reloader");

    let config = Config::from_env()?;
    info!("Configuration loaded: namespaces={:?}", config.namespaces);

    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    // Lookups fail until every workload watch has completed its initial list
    let index = Arc::new(DependencyIndex::with_sources(WorkloadRegistrar::sources(
        &config,
    )));
    let store = Arc::new(KubeStore::new(client.clone()));
    let driver = Arc::new(ReloadDriver::new(store.clone(), index.clone(), store));

    let registrar = WorkloadRegistrar::new(client.clone(), &config, index);
    let config_maps = ConfigObjectReconciler::<ConfigMap>::new(client.clone(), &config, driver.clone());
    let secrets = ConfigObjectReconciler::<Secret>::new(client, &config, driver);

    info!("Starting reconcilers...");

    tokio::try_join!(registrar.run(), config_maps.run(), secrets.run())?;

    // This should never be reached as reconcilers run forever
    warn!("All reconcilers stopped unexpectedly");
    Ok(())
}
