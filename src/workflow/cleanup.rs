// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Removal of lab objects and static addresses. Runs to the end; failures are reported.

use crate::config::LabConfig;
use crate::constants::objects;
use crate::error::Result;
use crate::gcloud::{ForwardingRule, Gcloud};
use crate::kubernetes::delete_if_exists;
use crate::workflow::lab_addresses;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Pod, Service};
use k8s_openapi::api::networking::v1::Ingress;
use kube::Client;
use std::fmt;
use tracing::{instrument, warn};

#[derive(Debug, Clone, Default)]
pub struct CleanupReport {
    pub deleted: Vec<String>,
    pub absent: Vec<String>,
    pub released: Vec<String>,
    pub failures: Vec<String>,
    pub forwarding_rules: Vec<ForwardingRule>,
}

impl CleanupReport {
    fn record(&mut self, id: String, result: Result<bool>) {
        match result {
            Ok(true) => self.deleted.push(id),
            Ok(false) => self.absent.push(id),
            Err(e) => {
                warn!("Failed to delete {}: {}", id, e);
                self.failures.push(format!("{}: {}", id, e));
            }
        }
    }
}

impl fmt::Display for CleanupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Deleted: {}", list_or_none(&self.deleted))?;
        writeln!(f, "Already absent: {}", list_or_none(&self.absent))?;
        writeln!(f, "Released addresses: {}", list_or_none(&self.released))?;
        if !self.failures.is_empty() {
            writeln!(f, "Failures:")?;
            for failure in &self.failures {
                writeln!(f, "  {}", failure)?;
            }
        }
        if self.forwarding_rules.is_empty() {
            write!(f, "No forwarding rules remain")
        } else {
            write!(f, "Remaining forwarding rules (may take a few minutes to disappear):")?;
            for rule in &self.forwarding_rules {
                write!(
                    f,
                    "\n  {:<40} {:<16} {}",
                    rule.name,
                    rule.ip_address.as_deref().unwrap_or("-"),
                    rule.location()
                )?;
            }
            Ok(())
        }
    }
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

/// Delete the lab objects, ingress first so its load balancer is torn down before its backends
#[instrument(skip(client))]
pub async fn delete_lab_objects(client: &Client, namespace: &str) -> CleanupReport {
    let mut report = CleanupReport::default();

    let id = format!("ingress/{}", objects::HELLO_INGRESS);
    report.record(id, delete_if_exists::<Ingress>(client, namespace, objects::HELLO_INGRESS).await);

    for name in [objects::HELLO_LB_SVC, objects::HELLO_SVC, objects::DNS_DEMO_SERVICE] {
        report.record(format!("service/{}", name), delete_if_exists::<Service>(client, namespace, name).await);
    }
    for name in objects::HELLO_DEPLOYMENTS {
        report.record(format!("deployment/{}", name), delete_if_exists::<Deployment>(client, namespace, name).await);
    }
    for name in objects::DNS_DEMO_PODS {
        report.record(format!("pod/{}", name), delete_if_exists::<Pod>(client, namespace, name).await);
    }

    report
}

/// Release both static addresses and list forwarding rules still present
pub async fn release_addresses(config: &LabConfig, gcloud: &Gcloud, report: &mut CleanupReport) {
    for address in lab_addresses(config) {
        match gcloud.release_address(&address).await {
            Ok(true) => report.released.push(address.to_string()),
            Ok(false) => report.absent.push(format!("address/{}", address.name)),
            Err(e) => {
                warn!("Failed to release {}: {}", address, e);
                report.failures.push(format!("address/{}: {}", address.name, e));
            }
        }
    }

    match gcloud.list_forwarding_rules().await {
        Ok(rules) => report.forwarding_rules = rules,
        Err(e) => report.failures.push(format!("forwarding-rules list: {}", e)),
    }
}

/// Full cleanup. Without a Kubernetes client the object deletions are skipped and
/// recorded as a failure; the addresses are released either way.
pub async fn run(client: Result<Client>, config: &LabConfig, gcloud: &Gcloud) -> CleanupReport {
    let mut report = match client {
        Ok(client) => delete_lab_objects(&client, &config.namespace).await,
        Err(e) => {
            warn!("Skipping Kubernetes object deletion: {}", e);
            CleanupReport {
                failures: vec![format!("kubernetes objects: {}", e)],
                ..Default::default()
            }
        }
    };
    release_addresses(config, gcloud, &mut report).await;
    report
}
