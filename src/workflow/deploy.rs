// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Ordered deployment of the lab: apply, wait, poll, summarize.

use crate::config::LabConfig;
use crate::constants::{manifests, objects, poll};
use crate::error::{LabError, Result};
use crate::kubernetes::{
    apply_manifest, connectivity_checks, ensure_namespace_exists, exec_in_pod,
    list_service_summaries, wait_for_ingress_external_ip, wait_for_pods_ready,
    wait_for_service_external_ip, ServiceSummary,
};
use crate::manifests::ManifestSet;
use crate::poll::{PollOutcome, PollSchedule};
use kube::Client;
use std::fmt;
use std::net::IpAddr;
use tracing::{info, instrument, warn};

/// The deployment steps, in the order they run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployStep {
    DnsDemo,
    HelloV1,
    ClusterIp,
    NodePort,
    HelloV2,
    LoadBalancer,
    Ingress,
    Connectivity,
}

impl DeployStep {
    pub const ALL: [DeployStep; 8] = [
        DeployStep::DnsDemo,
        DeployStep::HelloV1,
        DeployStep::ClusterIp,
        DeployStep::NodePort,
        DeployStep::HelloV2,
        DeployStep::LoadBalancer,
        DeployStep::Ingress,
        DeployStep::Connectivity,
    ];

    /// Manifest submitted by this step
    pub fn manifest(&self) -> Option<&'static str> {
        match self {
            DeployStep::DnsDemo => Some(manifests::DNS_DEMO),
            DeployStep::HelloV1 => Some(manifests::HELLO_V1),
            DeployStep::ClusterIp => Some(manifests::HELLO_SVC),
            DeployStep::NodePort => Some(manifests::HELLO_NODEPORT_SVC),
            DeployStep::HelloV2 => Some(manifests::HELLO_V2),
            DeployStep::LoadBalancer => Some(manifests::HELLO_LB_SVC),
            DeployStep::Ingress => Some(manifests::HELLO_INGRESS),
            DeployStep::Connectivity => None,
        }
    }

    /// Label selector of the pods this step waits for
    pub fn pod_selector(&self) -> Option<&'static str> {
        match self {
            DeployStep::DnsDemo => Some(objects::DNS_DEMO_SELECTOR),
            DeployStep::HelloV1 => Some(objects::HELLO_V1_SELECTOR),
            DeployStep::HelloV2 => Some(objects::HELLO_V2_SELECTOR),
            _ => None,
        }
    }
}

impl fmt::Display for DeployStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DeployStep::DnsDemo => "deploy DNS demo",
            DeployStep::HelloV1 => "deploy hello v1",
            DeployStep::ClusterIp => "apply ClusterIP service",
            DeployStep::NodePort => "convert service to NodePort",
            DeployStep::HelloV2 => "deploy hello v2",
            DeployStep::LoadBalancer => "apply LoadBalancer service",
            DeployStep::Ingress => "apply ingress",
            DeployStep::Connectivity => "test in-cluster connectivity",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    Done,
    Warning(String),
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub step: DeployStep,
    pub status: StepStatus,
}

/// Timeouts and switches for a deployment run
#[derive(Debug, Clone)]
pub struct DeployOptions {
    pub pod_wait: PollSchedule,
    pub load_balancer_wait: PollSchedule,
    pub ingress_wait: PollSchedule,
    pub connectivity_test: bool,
}

impl Default for DeployOptions {
    fn default() -> Self {
        Self {
            pod_wait: PollSchedule::from_secs(poll::POD_INTERVAL_SECS, poll::POD_TIMEOUT_SECS),
            load_balancer_wait: PollSchedule::from_secs(
                poll::INTERVAL_SECS,
                poll::LOAD_BALANCER_TIMEOUT_SECS,
            ),
            ingress_wait: PollSchedule::from_secs(poll::INTERVAL_SECS, poll::INGRESS_TIMEOUT_SECS),
            connectivity_test: true,
        }
    }
}

/// Outcome of a deployment that ran to completion
#[derive(Debug, Clone, Default)]
pub struct DeployReport {
    pub steps: Vec<StepReport>,
    pub load_balancer_ip: Option<String>,
    pub ingress_ip: Option<String>,
    pub services: Vec<ServiceSummary>,
}

impl DeployReport {
    pub fn warnings(&self) -> Vec<(DeployStep, &str)> {
        self.steps
            .iter()
            .filter_map(|r| match &r.status {
                StepStatus::Warning(msg) => Some((r.step, msg.as_str())),
                _ => None,
            })
            .collect()
    }

    fn record(&mut self, step: DeployStep, status: StepStatus) {
        if let StepStatus::Warning(msg) = &status {
            warn!("{}: {}", step, msg);
        }
        self.steps.push(StepReport { step, status });
    }
}

impl fmt::Display for DeployReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Services:")?;
        writeln!(
            f,
            "  {:<16} {:<13} {:<16} {:<16} PORTS",
            "NAME", "TYPE", "CLUSTER-IP", "EXTERNAL-IP"
        )?;
        for service in &self.services {
            writeln!(f, "  {}", service)?;
        }
        writeln!(
            f,
            "LoadBalancer address: {}",
            self.load_balancer_ip.as_deref().unwrap_or("<pending>")
        )?;
        writeln!(
            f,
            "Ingress address:      {}",
            self.ingress_ip.as_deref().unwrap_or("<pending>")
        )?;

        let warnings = self.warnings();
        if warnings.is_empty() {
            write!(f, "All steps completed without warnings")
        } else {
            write!(f, "Warnings:")?;
            for (step, msg) in warnings {
                write!(f, "\n  {}: {}", step, msg)?;
            }
            Ok(())
        }
    }
}

/// Runs the deployment steps against one cluster
pub struct Deployer<'a> {
    client: Client,
    config: &'a LabConfig,
    manifests: ManifestSet,
    options: DeployOptions,
}

impl<'a> Deployer<'a> {
    pub fn new(client: Client, config: &'a LabConfig, options: DeployOptions) -> Self {
        Self {
            client,
            manifests: ManifestSet::new(&config.manifest_dir),
            config,
            options,
        }
    }

    /// Apply every step in order. Submission failures abort with an error and leave
    /// already-applied objects in place; waits that time out become warnings.
    #[instrument(skip(self), fields(namespace = %self.config.namespace))]
    pub async fn run(&self, regional_address: &str) -> Result<DeployReport> {
        let namespace = self.config.namespace.as_str();
        let total = DeployStep::ALL.len();
        let mut report = DeployReport::default();

        regional_address
            .parse::<IpAddr>()
            .map_err(|_| LabError::InvalidAddress(regional_address.to_string()))?;
        self.manifests.verify()?;
        ensure_namespace_exists(&self.client, namespace).await?;

        for (index, step) in DeployStep::ALL.into_iter().enumerate() {
            println!("[{}/{}] {}", index + 1, total, step);

            let status = match step {
                DeployStep::LoadBalancer => {
                    let (status, ip) = self.deploy_load_balancer(regional_address).await?;
                    report.load_balancer_ip = ip;
                    status
                }
                DeployStep::Ingress => {
                    let (status, ip) = self.deploy_ingress().await?;
                    report.ingress_ip = ip;
                    status
                }
                DeployStep::Connectivity => self.test_connectivity().await,
                _ => self.apply_and_wait(step).await?,
            };

            if status == StepStatus::Done {
                println!("      done");
            }
            report.record(step, status);
        }

        report.services = match list_service_summaries(&self.client, namespace).await {
            Ok(services) => services,
            Err(e) => {
                warn!("Failed to list services for summary: {}", e);
                Vec::new()
            }
        };

        Ok(report)
    }

    async fn apply_step(&self, step: DeployStep) -> Result<()> {
        if let Some(name) = step.manifest() {
            let manifest = self.manifests.load(name).await?;
            apply_manifest(&self.client, &self.config.namespace, &manifest).await?;
        }
        Ok(())
    }

    async fn apply_and_wait(&self, step: DeployStep) -> Result<StepStatus> {
        self.apply_step(step).await?;

        let Some(selector) = step.pod_selector() else {
            return Ok(StepStatus::Done);
        };

        match wait_for_pods_ready(
            &self.client,
            &self.config.namespace,
            selector,
            self.options.pod_wait,
        )
        .await
        {
            PollOutcome::Ready { value, .. } => {
                info!("{} pod(s) ready for {}", value, selector);
                Ok(StepStatus::Done)
            }
            PollOutcome::TimedOut { .. } => Ok(StepStatus::Warning(format!(
                "pods {} not ready within {:?}",
                selector, self.options.pod_wait.timeout
            ))),
        }
    }

    async fn deploy_load_balancer(&self, regional_address: &str) -> Result<(StepStatus, Option<String>)> {
        let template = self.manifests.load(manifests::HELLO_LB_SVC).await?;
        let (manifest, replaced) = template.with_address(regional_address)?;
        if replaced == 0 {
            warn!(
                "{} does not contain {}, applying it unchanged",
                manifests::HELLO_LB_SVC,
                manifests::PLACEHOLDER_IP
            );
        }
        apply_manifest(&self.client, &self.config.namespace, &manifest).await?;

        let outcome = wait_for_service_external_ip(
            &self.client,
            &self.config.namespace,
            objects::HELLO_LB_SVC,
            self.options.load_balancer_wait,
        )
        .await;

        Ok(match outcome.into_value() {
            Some(ip) => {
                println!("      external IP: {}", ip);
                (StepStatus::Done, Some(ip))
            }
            None => (
                StepStatus::Warning(format!(
                    "no external IP for {} within {:?}",
                    objects::HELLO_LB_SVC,
                    self.options.load_balancer_wait.timeout
                )),
                None,
            ),
        })
    }

    async fn deploy_ingress(&self) -> Result<(StepStatus, Option<String>)> {
        self.apply_step(DeployStep::Ingress).await?;

        let outcome = wait_for_ingress_external_ip(
            &self.client,
            &self.config.namespace,
            objects::HELLO_INGRESS,
            self.options.ingress_wait,
        )
        .await;

        Ok(match outcome.into_value() {
            Some(ip) => {
                println!("      external IP: {}", ip);
                (StepStatus::Done, Some(ip))
            }
            None => (
                StepStatus::Warning(format!(
                    "no external IP for {} within {:?}",
                    objects::HELLO_INGRESS,
                    self.options.ingress_wait.timeout
                )),
                None,
            ),
        })
    }

    async fn test_connectivity(&self) -> StepStatus {
        if !self.options.connectivity_test {
            return StepStatus::Skipped;
        }

        let pod = objects::DNS_DEMO_PODS[0];
        let mut failures = Vec::new();

        for check in connectivity_checks(&self.config.namespace) {
            match exec_in_pod(&self.client, &self.config.namespace, pod, check.command).await {
                Ok(output) if output.success => {
                    println!("      {}: ok", check.label);
                }
                Ok(output) => failures.push(format!(
                    "{} failed: {}",
                    check.label,
                    output.message.unwrap_or_else(|| "non-zero exit".to_string())
                )),
                Err(e) => failures.push(format!("{} failed: {}", check.label, e)),
            }
        }

        if failures.is_empty() {
            StepStatus::Done
        } else {
            StepStatus::Warning(failures.join("; "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::manifests::ALL;
    use crate::test_utils::{
        ingress_json, list_json, namespace_json, pod_json, service_json, MockService,
    };
    use std::path::Path;
    use std::time::Duration;

    fn lab_config() -> LabConfig {
        LabConfig::new(
            "us-central1-a",
            "standard-cluster-1",
            Path::new(env!("CARGO_MANIFEST_DIR")).join("manifests"),
            "default",
        )
        .unwrap()
    }

    fn fast_options() -> DeployOptions {
        let schedule = PollSchedule::new(Duration::from_secs(10), Duration::from_secs(30));
        DeployOptions {
            pod_wait: schedule,
            load_balancer_wait: schedule,
            ingress_wait: schedule,
            connectivity_test: false,
        }
    }

    fn lab_api(lb_ip: Option<&str>, ingress_ip: Option<&str>) -> MockService {
        let core = "/api/v1/namespaces/default";
        let apps = "/apis/apps/v1/namespaces/default";
        let net = "/apis/networking.k8s.io/v1/namespaces/default";

        MockService::new()
            .on_get("/api/v1/namespaces/default", 200, &namespace_json("default"))
            .on_patch(&format!("{core}/services/dns-demo"), 200, &service_json("dns-demo", "ClusterIP", None))
            .on_patch(&format!("{core}/pods/dns-demo-1"), 200, &pod_json("dns-demo-1", false))
            .on_patch(&format!("{core}/pods/dns-demo-2"), 200, &pod_json("dns-demo-2", false))
            .on_patch(&format!("{apps}/deployments/hello-v1"), 200, r#"{"apiVersion":"apps/v1","kind":"Deployment","metadata":{"name":"hello-v1"}}"#)
            .on_patch(&format!("{apps}/deployments/hello-v2"), 200, r#"{"apiVersion":"apps/v1","kind":"Deployment","metadata":{"name":"hello-v2"}}"#)
            .on_patch(&format!("{core}/services/hello-svc"), 200, &service_json("hello-svc", "NodePort", None))
            .on_patch(&format!("{core}/services/hello-lb-svc"), 200, &service_json("hello-lb-svc", "LoadBalancer", None))
            .on_patch(&format!("{net}/ingresses/hello-ingress"), 200, &ingress_json("hello-ingress", None))
            .on_get(
                &format!("{core}/pods"),
                200,
                &list_json("PodList", &[pod_json("a", true), pod_json("b", true)]),
            )
            .on_get(&format!("{core}/services/hello-lb-svc"), 200, &service_json("hello-lb-svc", "LoadBalancer", lb_ip))
            .on_get(&format!("{net}/ingresses/hello-ingress"), 200, &ingress_json("hello-ingress", ingress_ip))
            .on_get(
                &format!("{core}/services"),
                200,
                &list_json(
                    "ServiceList",
                    &[
                        service_json("hello-svc", "NodePort", None),
                        service_json("hello-lb-svc", "LoadBalancer", lb_ip),
                    ],
                ),
            )
    }

    #[test]
    fn test_steps_follow_manifest_order() {
        let applied: Vec<_> = DeployStep::ALL.iter().filter_map(|s| s.manifest()).collect();
        assert_eq!(applied, ALL.to_vec());
    }

    #[test]
    fn test_only_workload_steps_wait_for_pods() {
        let waiting: Vec<_> = DeployStep::ALL
            .iter()
            .filter(|s| s.pod_selector().is_some())
            .copied()
            .collect();
        assert_eq!(
            waiting,
            vec![DeployStep::DnsDemo, DeployStep::HelloV1, DeployStep::HelloV2]
        );
    }

    #[test]
    fn test_report_lists_warnings() {
        let mut report = DeployReport::default();
        report.record(DeployStep::HelloV1, StepStatus::Done);
        report.record(DeployStep::LoadBalancer, StepStatus::Warning("no external IP".to_string()));

        assert_eq!(report.warnings(), vec![(DeployStep::LoadBalancer, "no external IP")]);
        let rendered = report.to_string();
        assert!(rendered.contains("apply LoadBalancer service: no external IP"));
        assert!(rendered.contains("LoadBalancer address: <pending>"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_completes_with_addresses() {
        let config = lab_config();
        let api = lab_api(Some("34.68.12.200"), Some("35.201.1.2"));
        let client = api.clone().into_client();

        let report = Deployer::new(client, &config, fast_options())
            .run("34.68.12.200")
            .await
            .unwrap();

        let submitted = api.bodies("PATCH", "/api/v1/namespaces/default/services/hello-lb-svc");
        assert_eq!(submitted.len(), 1);
        let service: serde_json::Value = serde_json::from_str(&submitted[0]).unwrap();
        assert_eq!(service["spec"]["loadBalancerIP"], "34.68.12.200");
        assert!(!submitted[0].contains("10.10.10.10"));

        assert_eq!(report.steps.len(), DeployStep::ALL.len());
        assert!(report.warnings().is_empty());
        assert_eq!(report.load_balancer_ip.as_deref(), Some("34.68.12.200"));
        assert_eq!(report.ingress_ip.as_deref(), Some("35.201.1.2"));
        assert_eq!(report.services.len(), 2);
        assert_eq!(
            report.steps.last().map(|r| &r.status),
            Some(&StepStatus::Skipped)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_address_timeouts_are_soft() {
        let config = lab_config();
        let client = lab_api(None, None).into_client();

        let report = Deployer::new(client, &config, fast_options())
            .run("34.68.12.200")
            .await
            .unwrap();

        let warned: Vec<_> = report.warnings().into_iter().map(|(s, _)| s).collect();
        assert_eq!(warned, vec![DeployStep::LoadBalancer, DeployStep::Ingress]);
        assert_eq!(report.load_balancer_ip, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_aborts_on_failed_submission() {
        let config = lab_config();
        // no PATCH routes: the first submission gets a 404 and the run stops there
        let client = MockService::new()
            .on_get("/api/v1/namespaces/default", 200, &namespace_json("default"))
            .into_client();

        let err = Deployer::new(client, &config, fast_options())
            .run("34.68.12.200")
            .await
            .unwrap_err();

        assert!(matches!(err, LabError::KubeError(_)));
    }

    #[tokio::test]
    async fn test_run_rejects_invalid_regional_address() {
        let config = lab_config();
        let api = lab_api(None, None);
        let client = api.clone().into_client();

        let err = Deployer::new(client, &config, fast_options())
            .run("not-an-address")
            .await;

        assert!(matches!(err, Err(LabError::InvalidAddress(_))));
        assert!(api.requests().is_empty());
    }
}
