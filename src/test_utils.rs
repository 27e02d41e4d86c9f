// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities for mocking Kubernetes API responses.

use http::{Request, Response};
use kube::client::Body;
use kube::Client;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

/// A request seen by [`MockService`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: String,
}

/// A mock HTTP service that returns predefined responses based on request paths.
/// Clones share their routes and the log of requests received.
#[derive(Clone)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<(String, String), (u16, String)>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn on(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), (status, body.to_string()));
        self
    }

    /// Add a response for GET requests matching the exact path
    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.on("GET", path, status, body)
    }

    /// Add a response for POST requests matching the exact path
    pub fn on_post(self, path: &str, status: u16, body: &str) -> Self {
        self.on("POST", path, status, body)
    }

    /// Add a response for PATCH requests (server-side apply)
    pub fn on_patch(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PATCH", path, status, body)
    }

    pub fn on_delete(self, path: &str, status: u16, body: &str) -> Self {
        self.on("DELETE", path, status, body)
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    /// Every request received so far, in arrival order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Bodies of the requests received for `method` and `path`
    pub fn bodies(&self, method: &str, path: &str) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .map(|r| r.body)
            .collect()
    }

    fn find_response(&self, method: &str, path: &str) -> Option<(u16, String)> {
        let responses = self.responses.lock().unwrap();

        responses
            .get(&(method.to_string(), path.to_string()))
            .cloned()
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();

        let response = self.find_response(&method, &path);
        let requests = self.requests.clone();

        Box::pin(async move {
            let bytes = req.into_body().collect_bytes().await?;
            requests.lock().unwrap().push(RecordedRequest {
                method,
                path: path.clone(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });

            let (status, body) = response.unwrap_or_else(|| (404, not_found_json(&path)));
            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

/// Create a mock namespace JSON response
pub fn namespace_json(name: &str) -> String {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "Namespace",
        "metadata": {
            "name": name,
            "uid": "test-uid"
        }
    })
    .to_string()
}

/// Create a 404 not found response
pub fn not_found_json(path: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": format!("{} not found", path),
        "reason": "NotFound",
        "code": 404
    })
    .to_string()
}

/// API server `/version` response
pub fn version_json(git_version: &str) -> String {
    serde_json::json!({
        "major": "1",
        "minor": "30",
        "gitVersion": git_version,
        "gitCommit": "0000000",
        "gitTreeState": "clean",
        "buildDate": "2026-01-01T00:00:00Z",
        "goVersion": "go1.22.5",
        "compiler": "gc",
        "platform": "linux/amd64"
    })
    .to_string()
}

/// Service with cluster IP 10.12.0.7; non-ClusterIP types get node port 30100
pub fn service_json(name: &str, service_type: &str, external_ip: Option<&str>) -> String {
    let mut port = serde_json::json!({"port": 80, "protocol": "TCP", "targetPort": 8080});
    if service_type != "ClusterIP" {
        port["nodePort"] = serde_json::json!(30100);
    }
    let load_balancer = match external_ip {
        Some(ip) => serde_json::json!({"ingress": [{"ip": ip}]}),
        None => serde_json::json!({}),
    };

    serde_json::json!({
        "apiVersion": "v1",
        "kind": "Service",
        "metadata": {"name": name, "namespace": "default"},
        "spec": {"type": service_type, "clusterIP": "10.12.0.7", "ports": [port]},
        "status": {"loadBalancer": load_balancer}
    })
    .to_string()
}

pub fn ingress_json(name: &str, external_ip: Option<&str>) -> String {
    let load_balancer = match external_ip {
        Some(ip) => serde_json::json!({"ingress": [{"ip": ip}]}),
        None => serde_json::json!({}),
    };

    serde_json::json!({
        "apiVersion": "networking.k8s.io/v1",
        "kind": "Ingress",
        "metadata": {"name": name, "namespace": "default"},
        "spec": {},
        "status": {"loadBalancer": load_balancer}
    })
    .to_string()
}

pub fn pod_json(name: &str, ready: bool) -> String {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "Pod",
        "metadata": {"name": name, "namespace": "default"},
        "status": {
            "phase": "Running",
            "conditions": [
                {"type": "Ready", "status": if ready { "True" } else { "False" }}
            ]
        }
    })
    .to_string()
}

/// Wrap already-serialized items into a list response
pub fn list_json(kind: &str, items: &[String]) -> String {
    let items: Vec<serde_json::Value> = items
        .iter()
        .map(|item| serde_json::from_str(item).unwrap())
        .collect();

    serde_json::json!({
        "apiVersion": "v1",
        "kind": kind,
        "metadata": {"resourceVersion": "1"},
        "items": items
    })
    .to_string()
}

/// Shell script standing in for `gcloud`. Every invocation appends its arguments to
/// `calls.log`; `describe` of an address succeeds only once its name was created.
#[cfg(unix)]
pub struct FakeGcloud {
    dir: tempfile::TempDir,
}

#[cfg(unix)]
impl FakeGcloud {
    /// `reserved` names the addresses that exist before the first call
    pub fn new(reserved: &[&str]) -> Self {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().join("addresses");
        std::fs::create_dir(&state).unwrap();
        for name in reserved {
            std::fs::write(state.join(name), "").unwrap();
        }

        let script = format!(
            r#"#!/bin/sh
echo "$@" >> "{log}"
state="{state}"
case "$2 $3" in
  "addresses describe")
    if [ -f "$state/$4" ]; then
      echo '{{"name":"'"$4"'","address":"34.68.12.200","status":"RESERVED","addressType":"EXTERNAL"}}'
    else
      echo "ERROR: (gcloud.compute.addresses.describe) Could not fetch resource:" >&2
      echo " - The resource 'projects/lab/regions/us-central1/addresses/$4' was not found" >&2
      exit 1
    fi ;;
  "addresses create") touch "$state/$4" ;;
  "addresses delete") rm "$state/$4" ;;
  "forwarding-rules list") echo '[]' ;;
  *) echo "unexpected arguments: $@" >&2; exit 2 ;;
esac
"#,
            log = dir.path().join("calls.log").display(),
            state = state.display(),
        );

        let program = dir.path().join("gcloud");
        std::fs::write(&program, script).unwrap();
        std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755)).unwrap();
        Self { dir }
    }

    pub fn gcloud(&self) -> crate::gcloud::Gcloud {
        crate::gcloud::Gcloud::with_program(self.dir.path().join("gcloud"))
    }

    /// Argument lines of every invocation so far
    pub fn calls(&self) -> Vec<String> {
        std::fs::read_to_string(self.dir.path().join("calls.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn was_called_with(&self, verb: &str) -> bool {
        self.calls()
            .iter()
            .any(|call| call.split_whitespace().nth(2) == Some(verb))
    }
}
