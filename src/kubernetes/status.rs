// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Readiness and external address queries for pods, services and ingresses

use crate::error::Result;
use crate::poll::{non_empty, poll_until, PollOutcome, PollSchedule};
use k8s_openapi::api::core::v1::{Pod, Service};
use k8s_openapi::api::networking::v1::Ingress;
use kube::{api::ListParams, Api, Client, ResourceExt};
use kube_runtime::wait::Condition;
use std::fmt;
use tracing::instrument;

/// Pod carries a `Ready=True` condition
pub fn is_pod_ready() -> impl Condition<Pod> {
    |obj: Option<&Pod>| {
        obj.and_then(|pod| pod.status.as_ref())
            .and_then(|status| status.conditions.as_ref())
            .is_some_and(|conditions| {
                conditions
                    .iter()
                    .any(|c| c.type_ == "Ready" && c.status == "True")
            })
    }
}

/// At least one pod exists and every pod is ready
pub fn all_pods_ready(pods: &[Pod]) -> bool {
    let ready = is_pod_ready();
    !pods.is_empty() && pods.iter().all(|pod| ready.matches_object(Some(pod)))
}

/// First non-empty load balancer IP of a service
pub fn service_external_ip(service: &Service) -> Option<String> {
    service
        .status
        .as_ref()?
        .load_balancer
        .as_ref()?
        .ingress
        .as_ref()?
        .iter()
        .find_map(|ingress| non_empty(ingress.ip.as_deref()))
}

/// First non-empty load balancer IP of an ingress
pub fn ingress_external_ip(ingress: &Ingress) -> Option<String> {
    ingress
        .status
        .as_ref()?
        .load_balancer
        .as_ref()?
        .ingress
        .as_ref()?
        .iter()
        .find_map(|lb| non_empty(lb.ip.as_deref()))
}

/// Number of ready pods matching `selector`, `None` while any of them is not ready
pub async fn query_pods_ready(client: &Client, namespace: &str, selector: &str) -> Result<Option<usize>> {
    let pods: Api<Pod> = Api::namespaced(client.clone(), namespace);
    let list = pods.list(&ListParams::default().labels(selector)).await?;

    if all_pods_ready(&list.items) {
        Ok(Some(list.items.len()))
    } else {
        Ok(None)
    }
}

pub async fn query_service_external_ip(client: &Client, namespace: &str, name: &str) -> Result<Option<String>> {
    let services: Api<Service> = Api::namespaced(client.clone(), namespace);
    Ok(service_external_ip(&services.get(name).await?))
}

pub async fn query_ingress_external_ip(client: &Client, namespace: &str, name: &str) -> Result<Option<String>> {
    let ingresses: Api<Ingress> = Api::namespaced(client.clone(), namespace);
    Ok(ingress_external_ip(&ingresses.get(name).await?))
}

/// Block until every pod matching `selector` is ready or the schedule runs out
#[instrument(skip(client, schedule))]
pub async fn wait_for_pods_ready(
    client: &Client,
    namespace: &str,
    selector: &str,
    schedule: PollSchedule,
) -> PollOutcome<usize> {
    let description = format!("pods {}", selector);
    poll_until(&description, schedule, || query_pods_ready(client, namespace, selector)).await
}

#[instrument(skip(client, schedule))]
pub async fn wait_for_service_external_ip(
    client: &Client,
    namespace: &str,
    name: &str,
    schedule: PollSchedule,
) -> PollOutcome<String> {
    let description = format!("external IP of service {}", name);
    poll_until(&description, schedule, || query_service_external_ip(client, namespace, name)).await
}

#[instrument(skip(client, schedule))]
pub async fn wait_for_ingress_external_ip(
    client: &Client,
    namespace: &str,
    name: &str,
    schedule: PollSchedule,
) -> PollOutcome<String> {
    let description = format!("external IP of ingress {}", name);
    poll_until(&description, schedule, || query_ingress_external_ip(client, namespace, name)).await
}

/// One row of the status summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSummary {
    pub name: String,
    pub service_type: String,
    pub cluster_ip: Option<String>,
    pub external_ip: Option<String>,
    pub ports: Vec<String>,
}

impl ServiceSummary {
    pub fn from_service(service: &Service) -> Self {
        let spec = service.spec.as_ref();
        let ports = spec
            .and_then(|s| s.ports.as_ref())
            .map(|ports| {
                ports
                    .iter()
                    .map(|p| match p.node_port {
                        Some(node_port) => format!("{}:{}/{}", p.port, node_port, p.protocol.as_deref().unwrap_or("TCP")),
                        None => format!("{}/{}", p.port, p.protocol.as_deref().unwrap_or("TCP")),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            name: service.name_any(),
            service_type: spec
                .and_then(|s| s.type_.clone())
                .unwrap_or_else(|| "ClusterIP".to_string()),
            cluster_ip: spec.and_then(|s| non_empty(s.cluster_ip.as_deref())),
            external_ip: service_external_ip(service),
            ports,
        }
    }
}

impl fmt::Display for ServiceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<16} {:<13} {:<16} {:<16} {}",
            self.name,
            self.service_type,
            self.cluster_ip.as_deref().unwrap_or("<none>"),
            self.external_ip.as_deref().unwrap_or("<pending>"),
            self.ports.join(",")
        )
    }
}

/// Summaries of all services in the namespace, sorted by name
pub async fn list_service_summaries(client: &Client, namespace: &str) -> Result<Vec<ServiceSummary>> {
    let services: Api<Service> = Api::namespaced(client.clone(), namespace);
    let mut summaries: Vec<_> = services
        .list(&ListParams::default())
        .await?
        .items
        .iter()
        .map(ServiceSummary::from_service)
        .collect();
    summaries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(summaries)
}
