// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Field manager used for server-side apply
pub const FIELD_MANAGER: &str = "netlab";

/// Environment variables holding the target zone and cluster
pub mod env {
    pub const ZONE: &str = "my_zone";
    pub const CLUSTER: &str = "my_cluster";
}

/// Manifest file names, relative to the manifest directory
pub mod manifests {
    pub const DNS_DEMO: &str = "dns-demo.yaml";
    pub const HELLO_V1: &str = "hello-v1.yaml";
    pub const HELLO_SVC: &str = "hello-svc.yaml";
    pub const HELLO_NODEPORT_SVC: &str = "hello-nodeport-svc.yaml";
    pub const HELLO_V2: &str = "hello-v2.yaml";
    pub const HELLO_LB_SVC: &str = "hello-lb-svc.yaml";
    pub const HELLO_INGRESS: &str = "hello-ingress.yaml";

    /// Every manifest the deployment needs, in apply order
    pub const ALL: [&str; 7] = [
        DNS_DEMO,
        HELLO_V1,
        HELLO_SVC,
        HELLO_NODEPORT_SVC,
        HELLO_V2,
        HELLO_LB_SVC,
        HELLO_INGRESS,
    ];

    /// Address literal in the LoadBalancer manifest replaced with the reserved regional IP
    pub const PLACEHOLDER_IP: &str = "10.10.10.10";
}

/// Names of the lab's Kubernetes objects
pub mod objects {
    pub const DNS_DEMO_SERVICE: &str = "dns-demo";
    pub const DNS_DEMO_PODS: [&str; 2] = ["dns-demo-1", "dns-demo-2"];
    pub const DNS_DEMO_SELECTOR: &str = "app=dns-demo";
    pub const HELLO_V1_SELECTOR: &str = "app=hello,version=v1";
    pub const HELLO_V2_SELECTOR: &str = "app=hello,version=v2";
    pub const HELLO_DEPLOYMENTS: [&str; 2] = ["hello-v1", "hello-v2"];
    pub const HELLO_SVC: &str = "hello-svc";
    pub const HELLO_LB_SVC: &str = "hello-lb-svc";
    pub const HELLO_INGRESS: &str = "hello-ingress";
}

/// Static addresses reserved on the cloud platform
pub mod addresses {
    pub const REGIONAL: &str = "regional-loadbalancer";
    pub const GLOBAL: &str = "global-ingress";
}

/// Polling defaults
pub mod poll {
    /// Interval between external address queries in seconds
    pub const INTERVAL_SECS: u64 = 10;
    /// Interval between pod readiness checks in seconds
    pub const POD_INTERVAL_SECS: u64 = 2;
    pub const POD_TIMEOUT_SECS: u64 = 120;
    pub const LOAD_BALANCER_TIMEOUT_SECS: u64 = 300;
    /// Ingress provisioning on GKE routinely takes several minutes
    pub const INGRESS_TIMEOUT_SECS: u64 = 600;
}
