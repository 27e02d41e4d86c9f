// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! The three lab workflows: setup, deploy and cleanup.

pub mod cleanup;
pub mod deploy;
pub mod setup;

pub use deploy::{DeployOptions, DeployReport, Deployer};

use crate::config::LabConfig;
use crate::constants::addresses;
use crate::gcloud::StaticAddress;

/// The regional address used by the LoadBalancer service and the global one used by the ingress
pub fn lab_addresses(config: &LabConfig) -> [StaticAddress; 2] {
    [
        StaticAddress::regional(addresses::REGIONAL, &config.region),
        StaticAddress::global(addresses::GLOBAL),
    ]
}
