// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::error::{LabError, Result};
use std::path::PathBuf;

/// Lab configuration resolved from flags, environment variables and prompts
#[derive(Debug, Clone)]
pub struct LabConfig {
    /// Compute zone of the cluster, e.g. `us-central1-a`
    pub zone: String,
    /// Name of the GKE cluster
    pub cluster: String,
    /// Region derived from the zone, used for the regional static address
    pub region: String,
    /// Directory holding the lab manifests
    pub manifest_dir: PathBuf,
    /// Namespace the lab objects are deployed into
    pub namespace: String,
}

impl LabConfig {
    pub fn new(
        zone: impl Into<String>,
        cluster: impl Into<String>,
        manifest_dir: impl Into<PathBuf>,
        namespace: impl Into<String>,
    ) -> Result<Self> {
        let zone = zone.into().trim().to_string();
        let cluster = cluster.into().trim().to_string();
        if cluster.is_empty() {
            return Err(LabError::ConfigError("cluster name is empty".to_string()));
        }
        let region = region_from_zone(&zone)?;

        Ok(LabConfig {
            zone,
            cluster,
            region,
            manifest_dir: manifest_dir.into(),
            namespace: namespace.into(),
        })
    }
}

/// Derive the region from a zone by dropping its single-letter suffix
pub fn region_from_zone(zone: &str) -> Result<String> {
    match zone.rsplit_once('-') {
        Some((region, suffix))
            if region.contains('-')
                && suffix.len() == 1
                && suffix.chars().all(|c| c.is_ascii_lowercase()) =>
        {
            Ok(region.to_string())
        }
        _ => Err(LabError::ConfigError(format!(
            "'{}' is not a compute zone (expected e.g. us-central1-a)",
            zone
        ))),
    }
}
