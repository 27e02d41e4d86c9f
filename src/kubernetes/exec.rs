// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! In-pod command execution used by the connectivity test

use crate::error::{LabError, Result};
use k8s_openapi::api::core::v1::Pod;
use kube::{api::AttachParams, Api, Client};
use tokio::io::AsyncReadExt;
use tracing::{debug, instrument};

/// Captured result of a command run inside a pod
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    pub stdout: String,
    pub success: bool,
    pub message: Option<String>,
}

/// A command to run from inside the cluster, with a short label for reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectivityCheck {
    pub label: String,
    pub command: Vec<String>,
}

/// DNS and HTTP checks run from the DNS demo pod
pub fn connectivity_checks(namespace: &str) -> Vec<ConnectivityCheck> {
    let dns_name = format!("dns-demo.{}.svc.cluster.local", namespace);
    let url = format!("http://hello-svc.{}.svc.cluster.local", namespace);

    vec![
        ConnectivityCheck {
            label: format!("resolve {}", dns_name),
            command: vec!["nslookup".to_string(), dns_name],
        },
        ConnectivityCheck {
            label: format!("fetch {}", url),
            command: ["wget", "-q", "-O", "-", "-T", "5", url.as_str()]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        },
    ]
}

/// Run `command` in the first container of `pod` and collect its stdout
#[instrument(skip(client))]
pub async fn exec_in_pod(
    client: &Client,
    namespace: &str,
    pod: &str,
    command: Vec<String>,
) -> Result<ExecOutput> {
    let pods: Api<Pod> = Api::namespaced(client.clone(), namespace);
    let mut attached = pods
        .exec(pod, command, &AttachParams::default().stderr(false))
        .await?;

    let mut stdout = String::new();
    if let Some(mut reader) = attached.stdout() {
        reader.read_to_string(&mut stdout).await?;
    }

    let status = match attached.take_status() {
        Some(status) => status.await,
        None => None,
    };
    attached
        .join()
        .await
        .map_err(|e| LabError::command_failed(format!("exec in pod {}", pod), e.to_string()))?;

    let success = status
        .as_ref()
        .and_then(|s| s.status.as_deref())
        .is_some_and(|s| s == "Success");
    let message = status.and_then(|s| s.message);
    debug!("exec in {} finished, success={}", pod, success);

    Ok(ExecOutput {
        stdout,
        success,
        message,
    })
}
