// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Server-side apply and deletion of lab objects

use crate::constants::FIELD_MANAGER;
use crate::error::Result;
use crate::manifests::{LabObject, Manifest};
use k8s_openapi::NamespaceResourceScope;
use kube::{
    api::{DeleteParams, Patch, PatchParams},
    Api, Client, Resource, ResourceExt,
};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;
use tracing::{debug, info, instrument};

/// Apply a single object. Re-applying an unchanged declaration is a no-op on the API server.
pub async fn apply_object(client: &Client, namespace: &str, object: &LabObject) -> Result<()> {
    match object {
        LabObject::Pod(o) => apply(client, namespace, o).await,
        LabObject::Service(o) => apply(client, namespace, o).await,
        LabObject::Deployment(o) => apply(client, namespace, o).await,
        LabObject::Ingress(o) => apply(client, namespace, o).await,
    }
}

/// Apply every object in a manifest, in document order. Returns `kind/name` of each object.
#[instrument(skip(client, manifest), fields(manifest = %manifest.name))]
pub async fn apply_manifest(
    client: &Client,
    namespace: &str,
    manifest: &Manifest,
) -> Result<Vec<String>> {
    let mut applied = Vec::new();
    for object in manifest.objects()? {
        apply_object(client, namespace, &object).await?;
        let id = format!("{}/{}", object.kind().to_lowercase(), object.name());
        info!("Applied {}", id);
        applied.push(id);
    }
    Ok(applied)
}

async fn apply<K>(client: &Client, namespace: &str, object: &K) -> Result<()>
where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Clone
        + Debug
        + DeserializeOwned
        + Serialize,
{
    let api: Api<K> = Api::namespaced(client.clone(), namespace);
    let pp = PatchParams::apply(FIELD_MANAGER).force();
    api.patch(&object.name_any(), &pp, &Patch::Apply(object))
        .await?;
    Ok(())
}

/// Delete an object, returning false when it did not exist
pub async fn delete_if_exists<K>(client: &Client, namespace: &str, name: &str) -> Result<bool>
where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Clone
        + Debug
        + DeserializeOwned,
{
    let api: Api<K> = Api::namespaced(client.clone(), namespace);

    match api.delete(name, &DeleteParams::default()).await {
        Ok(_) => {
            info!("Deleted {} {}/{}", K::kind(&()), namespace, name);
            Ok(true)
        }
        Err(kube::Error::Api(err)) if err.code == 404 => {
            debug!("{} {}/{} already gone", K::kind(&()), namespace, name);
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}
