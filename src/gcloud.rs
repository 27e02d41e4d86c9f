// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Thin wrapper around the `gcloud` CLI for credentials and static addresses.

use crate::error::{LabError, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::process::Output;
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// Where a static address lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressScope {
    Regional(String),
    Global,
}

/// A static IP address reservation requested from the cloud platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticAddress {
    pub name: String,
    pub scope: AddressScope,
}

impl StaticAddress {
    pub fn regional(name: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scope: AddressScope::Regional(region.into()),
        }
    }

    pub fn global(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scope: AddressScope::Global,
        }
    }

    /// Arguments for `gcloud compute addresses <verb>` targeting this address
    pub fn args(&self, verb: &str) -> Vec<String> {
        let mut args = vec![
            "compute".to_string(),
            "addresses".to_string(),
            verb.to_string(),
            self.name.clone(),
        ];
        match &self.scope {
            AddressScope::Regional(region) => {
                args.push("--region".to_string());
                args.push(region.clone());
            }
            AddressScope::Global => args.push("--global".to_string()),
        }
        args
    }
}

impl fmt::Display for StaticAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            AddressScope::Regional(region) => write!(f, "{} ({})", self.name, region),
            AddressScope::Global => write!(f, "{} (global)", self.name),
        }
    }
}

/// Subset of `gcloud compute addresses describe --format=json`
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AddressInfo {
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub address_type: Option<String>,
}

/// Subset of `gcloud compute forwarding-rules list --format=json`
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ForwardingRule {
    pub name: String,
    #[serde(rename = "IPAddress", default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
}

impl ForwardingRule {
    /// Last path segment of the region URL, or `global`
    pub fn location(&self) -> &str {
        self.region
            .as_deref()
            .and_then(|r| r.rsplit('/').next())
            .unwrap_or("global")
    }
}

/// Handle on the `gcloud` executable
#[derive(Debug, Clone)]
pub struct Gcloud {
    program: PathBuf,
}

impl Gcloud {
    /// Locate `gcloud` on `PATH`
    pub fn locate() -> Result<Self> {
        let program = which::which("gcloud").map_err(|_| LabError::MissingTool("gcloud".to_string()))?;
        debug!("Using gcloud at {}", program.display());
        Ok(Self { program })
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn output(&self, args: &[String]) -> Result<Output> {
        debug!("Running gcloud {}", args.join(" "));
        Ok(Command::new(&self.program).args(args).output().await?)
    }

    async fn run(&self, args: &[String]) -> Result<String> {
        let output = self.output(args).await?;
        if !output.status.success() {
            return Err(LabError::command_failed(
                format!("gcloud {}", args.join(" ")),
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn run_json<T: DeserializeOwned>(&self, mut args: Vec<String>) -> Result<T> {
        args.push("--format=json".to_string());
        let stdout = self.run(&args).await?;
        parse_json(&args, &stdout)
    }

    /// Write kubeconfig credentials for the cluster
    #[instrument(skip(self))]
    pub async fn get_credentials(&self, cluster: &str, zone: &str) -> Result<()> {
        let args: Vec<String> = ["container", "clusters", "get-credentials", cluster, "--zone", zone]
            .iter()
            .map(|s| s.to_string())
            .collect();
        self.run(&args).await?;
        info!("Fetched credentials for cluster {}", cluster);
        Ok(())
    }

    /// Describe an address, `None` when it does not exist
    #[instrument(skip(self), fields(address = %address))]
    pub async fn describe_address(&self, address: &StaticAddress) -> Result<Option<AddressInfo>> {
        let mut args = address.args("describe");
        args.push("--format=json".to_string());

        let output = self.output(&args).await?;
        if output.status.success() {
            return parse_json(&args, &String::from_utf8_lossy(&output.stdout)).map(Some);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if is_not_found(&stderr) {
            debug!("Address {} does not exist", address);
            return Ok(None);
        }
        Err(LabError::command_failed(
            format!("gcloud {}", args.join(" ")),
            stderr.trim().to_string(),
        ))
    }

    /// Reserve the address unless it already exists, returning its details
    #[instrument(skip(self), fields(address = %address))]
    pub async fn reserve_address(&self, address: &StaticAddress) -> Result<AddressInfo> {
        if let Some(existing) = self.describe_address(address).await? {
            info!("Address {} already reserved: {}", address, existing.address);
            return Ok(existing);
        }

        self.run(&address.args("create")).await?;
        info!("Reserved address {}", address);

        self.describe_address(address).await?.ok_or_else(|| {
            LabError::command_failed(
                format!("gcloud {}", address.args("describe").join(" ")),
                "address missing right after creation",
            )
        })
    }

    /// Release the address. Returns false when it did not exist.
    #[instrument(skip(self), fields(address = %address))]
    pub async fn release_address(&self, address: &StaticAddress) -> Result<bool> {
        if self.describe_address(address).await?.is_none() {
            return Ok(false);
        }
        let mut args = address.args("delete");
        args.push("--quiet".to_string());
        self.run(&args).await?;
        info!("Released address {}", address);
        Ok(true)
    }

    pub async fn list_forwarding_rules(&self) -> Result<Vec<ForwardingRule>> {
        self.run_json(vec![
            "compute".to_string(),
            "forwarding-rules".to_string(),
            "list".to_string(),
        ])
        .await
    }
}

fn parse_json<T: DeserializeOwned>(args: &[String], stdout: &str) -> Result<T> {
    serde_json::from_str(stdout).map_err(|source| LabError::CommandOutput {
        command: format!("gcloud {}", args.join(" ")),
        source,
    })
}

fn is_not_found(stderr: &str) -> bool {
    stderr.contains("was not found") || stderr.contains("notFound")
}
