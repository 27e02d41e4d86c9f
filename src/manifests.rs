// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Loading, decoding and placeholder substitution for the lab manifests.

use crate::constants::manifests::{ALL, PLACEHOLDER_IP};
use crate::error::{LabError, Result};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Pod, Service};
use k8s_openapi::api::networking::v1::Ingress;
use kube::ResourceExt;
use serde::Deserialize;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// A Kubernetes object declared in one of the lab manifests
#[derive(Debug, Clone)]
pub enum LabObject {
    Pod(Pod),
    Service(Service),
    Deployment(Deployment),
    Ingress(Ingress),
}

impl LabObject {
    pub fn kind(&self) -> &'static str {
        match self {
            LabObject::Pod(_) => "Pod",
            LabObject::Service(_) => "Service",
            LabObject::Deployment(_) => "Deployment",
            LabObject::Ingress(_) => "Ingress",
        }
    }

    pub fn name(&self) -> String {
        match self {
            LabObject::Pod(o) => o.name_any(),
            LabObject::Service(o) => o.name_any(),
            LabObject::Deployment(o) => o.name_any(),
            LabObject::Ingress(o) => o.name_any(),
        }
    }
}

/// Raw contents of a single manifest file
#[derive(Debug, Clone)]
pub struct Manifest {
    pub name: String,
    pub contents: String,
}

impl Manifest {
    pub fn new(name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }

    /// Decode every YAML document in the manifest into a typed object
    pub fn objects(&self) -> Result<Vec<LabObject>> {
        let mut objects = Vec::new();

        for document in serde_yaml::Deserializer::from_str(&self.contents) {
            let value = serde_yaml::Value::deserialize(document)
                .map_err(|e| LabError::invalid_manifest(&self.name, e.to_string()))?;
            if value.is_null() {
                continue;
            }

            let Some(kind) = value.get("kind").and_then(|k| k.as_str()).map(str::to_string) else {
                return Err(LabError::invalid_manifest(&self.name, "document has no kind"));
            };

            let object = match kind.as_str() {
                "Pod" => LabObject::Pod(self.decode(value)?),
                "Service" => LabObject::Service(self.decode(value)?),
                "Deployment" => LabObject::Deployment(self.decode(value)?),
                "Ingress" => LabObject::Ingress(self.decode(value)?),
                _ => {
                    return Err(LabError::UnsupportedKind {
                        name: self.name.clone(),
                        kind,
                    })
                }
            };
            debug!("Decoded {} {} from {}", object.kind(), object.name(), self.name);
            objects.push(object);
        }

        Ok(objects)
    }

    /// Replace the placeholder address with `address`, returning the number of replacements.
    /// The address must parse as an IP address.
    pub fn with_address(&self, address: &str) -> Result<(Manifest, usize)> {
        address
            .parse::<IpAddr>()
            .map_err(|_| LabError::InvalidAddress(address.to_string()))?;

        let (contents, replaced) = substitute_placeholder(&self.contents, PLACEHOLDER_IP, address);
        Ok((Manifest::new(self.name.clone(), contents), replaced))
    }

    fn decode<K: serde::de::DeserializeOwned>(&self, value: serde_yaml::Value) -> Result<K> {
        serde_yaml::from_value(value).map_err(|e| LabError::invalid_manifest(&self.name, e.to_string()))
    }
}

/// Textually replace every occurrence of `placeholder`. Leaves all other bytes untouched
/// and returns the input unchanged when the placeholder is absent.
pub fn substitute_placeholder(contents: &str, placeholder: &str, value: &str) -> (String, usize) {
    let count = contents.matches(placeholder).count();
    if count == 0 {
        return (contents.to_string(), 0);
    }
    (contents.replace(placeholder, value), count)
}

/// The directory of manifests the lab is deployed from
#[derive(Debug, Clone)]
pub struct ManifestSet {
    dir: PathBuf,
}

impl ManifestSet {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Names of required manifests that are not present on disk
    pub fn missing(&self) -> Vec<String> {
        ALL.iter()
            .filter(|name| !self.path(name).is_file())
            .map(|name| name.to_string())
            .collect()
    }

    /// Fail when any required manifest is missing
    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    pub fn verify(&self) -> Result<()> {
        let missing = self.missing();
        if missing.is_empty() {
            debug!("All {} manifests present", ALL.len());
            return Ok(());
        }
        Err(LabError::MissingManifests {
            dir: self.dir.clone(),
            missing,
        })
    }

    pub async fn load(&self, name: &str) -> Result<Manifest> {
        let path = self.path(name);
        let contents = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| LabError::ManifestRead { path, source })?;
        Ok(Manifest::new(name, contents))
    }
}
