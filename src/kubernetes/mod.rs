// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes utilities for applying lab objects, readiness checks and in-pod commands.

pub mod apply;
pub mod client;
pub mod exec;
pub mod namespaces;
pub mod status;

pub use apply::{apply_manifest, delete_if_exists};
pub use client::{connect, verify_connection};
pub use exec::{connectivity_checks, exec_in_pod};
pub use namespaces::ensure_namespace_exists;
pub use status::{
    list_service_summaries, wait_for_ingress_external_ip, wait_for_pods_ready,
    wait_for_service_external_ip, ServiceSummary,
};
