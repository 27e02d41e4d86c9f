// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cluster client creation

use crate::error::{LabError, Result};
use kube::Client;
use tracing::{info, instrument};

/// Create a client from the ambient kubeconfig (as written by `gcloud container clusters get-credentials`)
pub async fn connect() -> Result<Client> {
    Client::try_default()
        .await
        .map_err(|e| LabError::KubeconfigError(format!("Failed to create client: {}", e)))
}

/// Confirm the credentials work by asking the API server for its version
#[instrument(skip(client))]
pub async fn verify_connection(client: &Client) -> Result<String> {
    let version = client.apiserver_version().await?;
    info!("Connected to Kubernetes API server {}", version.git_version);
    Ok(version.git_version)
}
