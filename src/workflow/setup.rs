// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cluster authentication, static address reservation and manifest checks.

use crate::config::LabConfig;
use crate::error::Result;
use crate::gcloud::{AddressInfo, Gcloud, StaticAddress};
use crate::kubernetes::{connect, verify_connection};
use crate::manifests::ManifestSet;
use crate::workflow::lab_addresses;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone)]
pub struct SetupReport {
    pub kubectl: Option<PathBuf>,
    pub server_version: String,
    pub addresses: Vec<(StaticAddress, AddressInfo)>,
}

impl fmt::Display for SetupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Kubernetes API server: {}", self.server_version)?;
        match &self.kubectl {
            Some(path) => writeln!(f, "kubectl: {}", path.display())?,
            None => writeln!(f, "kubectl: not installed (not required)")?,
        }
        write!(f, "Static addresses:")?;
        for (address, info) in &self.addresses {
            write!(
                f,
                "\n  {:<32} {:<16} {}",
                address.to_string(),
                info.address,
                info.status.as_deref().unwrap_or("UNKNOWN")
            )?;
        }
        Ok(())
    }
}

/// Authenticate against the cluster, reserve both static addresses and check the manifests.
/// Every failure here is fatal.
#[instrument(skip(config, gcloud), fields(cluster = %config.cluster, zone = %config.zone))]
pub async fn run(config: &LabConfig, gcloud: &Gcloud) -> Result<SetupReport> {
    let kubectl = which::which("kubectl").ok();
    debug!("kubectl: {:?}", kubectl);

    println!("Fetching credentials for {} in {}", config.cluster, config.zone);
    gcloud.get_credentials(&config.cluster, &config.zone).await?;
    let client = connect().await?;
    let server_version = verify_connection(&client).await?;

    let mut addresses = Vec::new();
    for address in lab_addresses(config) {
        println!("Reserving static address {}", address);
        let reserved = gcloud.reserve_address(&address).await?;
        addresses.push((address, reserved));
    }

    let manifests = ManifestSet::new(&config.manifest_dir);
    manifests.verify()?;
    info!("Manifests verified in {}", manifests.dir().display());

    Ok(SetupReport {
        kubectl,
        server_version,
        addresses,
    })
}
