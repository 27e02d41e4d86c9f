// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Command line surface: `netlab setup|deploy|cleanup`.

use crate::config::LabConfig;
use crate::constants::{addresses, env, poll};
use crate::error::LabError;
use crate::gcloud::Gcloud;
use crate::kubernetes::connect;
use crate::poll::PollSchedule;
use crate::workflow::{cleanup, lab_addresses, setup, DeployOptions, Deployer};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use dialoguer::{theme::ColorfulTheme, Input};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::info;

/// Provision the GKE services and ingress networking lab
#[derive(Parser, Debug)]
#[command(name = "netlab")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Compute zone of the cluster, e.g. us-central1-a
    #[arg(long, global = true, env = env::ZONE)]
    pub zone: Option<String>,

    /// Name of the GKE cluster
    #[arg(long, global = true, env = env::CLUSTER)]
    pub cluster: Option<String>,

    /// Directory containing the lab manifests
    #[arg(long, global = true, default_value = "manifests")]
    pub manifests: PathBuf,

    /// Namespace the lab objects are deployed into
    #[arg(long, short = 'n', global = true, default_value = "default")]
    pub namespace: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Authenticate, reserve static addresses and verify manifests
    Setup,
    /// Apply the lab objects in order and wait for external addresses
    Deploy(DeployArgs),
    /// Delete the lab objects and release the static addresses
    Cleanup,
}

#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Seconds to wait for pods to become ready
    #[arg(long, default_value_t = poll::POD_TIMEOUT_SECS)]
    pub pod_timeout: u64,

    /// Seconds to wait for the LoadBalancer service's external IP
    #[arg(long, default_value_t = poll::LOAD_BALANCER_TIMEOUT_SECS)]
    pub lb_timeout: u64,

    /// Seconds to wait for the ingress's external IP
    #[arg(long, default_value_t = poll::INGRESS_TIMEOUT_SECS)]
    pub ingress_timeout: u64,

    /// Seconds between external IP queries
    #[arg(long, default_value_t = poll::INTERVAL_SECS)]
    pub poll_interval: u64,

    /// Do not exec into the DNS demo pod to test connectivity
    #[arg(long)]
    pub skip_connectivity_test: bool,
}

impl DeployArgs {
    pub fn options(&self) -> DeployOptions {
        DeployOptions {
            pod_wait: PollSchedule::from_secs(poll::POD_INTERVAL_SECS, self.pod_timeout),
            load_balancer_wait: PollSchedule::from_secs(self.poll_interval, self.lb_timeout),
            ingress_wait: PollSchedule::from_secs(self.poll_interval, self.ingress_timeout),
            connectivity_test: !self.skip_connectivity_test,
        }
    }
}

impl Cli {
    /// Build the lab configuration, prompting for zone or cluster when missing
    pub fn resolve_config(&self) -> crate::error::Result<LabConfig> {
        let zone = resolve_value(self.zone.clone(), "Compute zone (e.g. us-central1-a)", "--zone or my_zone")?;
        let cluster = resolve_value(self.cluster.clone(), "Cluster name", "--cluster or my_cluster")?;
        LabConfig::new(zone, cluster, self.manifests.clone(), self.namespace.clone())
    }

    pub async fn run(self) -> Result<()> {
        let config = self.resolve_config()?;
        info!(
            "Configuration: zone={} region={} cluster={} namespace={}",
            config.zone, config.region, config.cluster, config.namespace
        );

        match self.command {
            Commands::Setup => {
                let gcloud = Gcloud::locate()?;
                let report = setup::run(&config, &gcloud).await.context("setup failed")?;
                println!("{}", report);
            }
            Commands::Deploy(args) => {
                let gcloud = Gcloud::locate()?;
                let [regional, _] = lab_addresses(&config);
                let reserved = gcloud
                    .describe_address(&regional)
                    .await?
                    .ok_or_else(|| {
                        LabError::ConfigError(format!(
                            "static address {} is not reserved, run `netlab setup` first",
                            addresses::REGIONAL
                        ))
                    })?;

                let client = connect().await?;
                let report = Deployer::new(client, &config, args.options())
                    .run(&reserved.address)
                    .await
                    .context("deployment aborted, objects applied so far are left in place")?;
                println!("{}", report);
            }
            Commands::Cleanup => {
                let gcloud = Gcloud::locate()?;
                let report = cleanup::run(connect().await, &config, &gcloud).await;
                println!("{}", report);
            }
        }

        Ok(())
    }
}

fn resolve_value(value: Option<String>, prompt: &str, hint: &str) -> crate::error::Result<String> {
    if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
        return Ok(value);
    }

    if !std::io::stdin().is_terminal() {
        return Err(LabError::ConfigError(format!("{} is not set", hint)));
    }

    Input::<String>::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .interact_text()
        .map_err(|e| LabError::ConfigError(format!("failed to read {}: {}", hint, e)))
}
