// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LabError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Failed to load kubeconfig: {0}")]
    KubeconfigError(String),

    #[error("Required tool '{0}' not found on PATH")]
    MissingTool(String),

    #[error("Command `{command}` failed: {message}")]
    CommandFailed { command: String, message: String },

    #[error("Failed to parse output of `{command}`: {source}")]
    CommandOutput {
        command: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Missing manifest files in {dir}: {missing:?}")]
    MissingManifests { dir: PathBuf, missing: Vec<String> },

    #[error("Failed to read manifest {path}: {source}")]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid manifest {name}: {message}")]
    InvalidManifest { name: String, message: String },

    #[error("Unsupported object kind '{kind}' in manifest {name}")]
    UnsupportedKind { name: String, kind: String },

    #[error("Invalid IP address '{0}'")]
    InvalidAddress(String),

    #[error("Namespace creation failed: {0}")]
    NamespaceError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LabError {
    pub fn command_failed(command: impl Into<String>, message: impl Into<String>) -> Self {
        LabError::CommandFailed {
            command: command.into(),
            message: message.into(),
        }
    }

    pub fn invalid_manifest(name: impl Into<String>, message: impl Into<String>) -> Self {
        LabError::InvalidManifest {
            name: name.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LabError>;
