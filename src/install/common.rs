// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Install embedded manifests, or collect them for later rendering.

use crate::assets;
use crate::error::{is_already_exists, Result};
use crate::kubernetes::resources::post_params;
use crate::kubernetes::{dynamic_api, replace_resource, replace_status, ApplyOutcome, Collection};
use crate::types::Test;
use k8s_openapi::api::core::v1::PersistentVolumeClaim;
use kube::{api::DynamicObject, Client, Resource, ResourceExt};
use tracing::{debug, info, instrument};

/// Hook to change objects before they are created
pub type ResourceCustomizer<'a> = &'a dyn Fn(DynamicObject) -> DynamicObject;

/// A customizer that leaves objects untouched
pub fn identity_customizer(obj: DynamicObject) -> DynamicObject {
    obj
}

/// Install (or collect) several embedded manifests in order
pub async fn resources_or_collect(
    client: &Client,
    namespace: Option<&str>,
    mut collection: Option<&mut Collection>,
    force: bool,
    customizer: ResourceCustomizer<'_>,
    names: &[&str],
) -> Result<()> {
    for name in names {
        resource_or_collect(client, namespace, collection.as_deref_mut(), force, customizer, name)
            .await?;
    }
    Ok(())
}

/// Install (or collect) a single embedded manifest
pub async fn resource_or_collect(
    client: &Client,
    namespace: Option<&str>,
    collection: Option<&mut Collection>,
    force: bool,
    customizer: ResourceCustomizer<'_>,
    name: &str,
) -> Result<ApplyOutcome> {
    let obj = assets::load_resource(name)?;
    runtime_object_or_collect(client, namespace, collection, force, customizer(obj)).await
}

/// Install a single object, or add it to the collection.
///
/// The namespace is only applied to namespaced kinds. With `force` an
/// existing object is replaced, and a replaced `Test` also gets its status
/// reset.
#[instrument(skip(client, collection, obj), fields(name = %obj.name_any()))]
pub async fn runtime_object_or_collect(
    client: &Client,
    namespace: Option<&str>,
    collection: Option<&mut Collection>,
    force: bool,
    mut obj: DynamicObject,
) -> Result<ApplyOutcome> {
    if let Some(collection) = collection {
        // Collected before the namespace is set
        collection.add(&obj)?;
        return Ok(ApplyOutcome::Collected);
    }

    let (api, namespaced) = dynamic_api(client, &obj, namespace).await?;
    if namespaced {
        if let Some(ns) = namespace {
            obj.metadata.namespace = Some(ns.to_string());
        }
    }
    let kind = obj
        .types
        .as_ref()
        .map(|t| t.kind.clone())
        .unwrap_or_default();

    if kind == <PersistentVolumeClaim as k8s_openapi::Resource>::KIND {
        return match api.create(&post_params(), &obj).await {
            Ok(_) => Ok(ApplyOutcome::Created),
            Err(e) if is_already_exists(&e) => {
                debug!("Claim {} already exists, keeping it", obj.name_any());
                Ok(ApplyOutcome::Unchanged)
            }
            Err(e) => Err(e.into()),
        };
    }

    if force {
        let (outcome, mut stored) = replace_resource(&api, &obj).await?;
        if kind == Test::kind(&()) {
            stored.data["status"] = serde_json::json!({});
            replace_status(&api, &stored).await?;
        }
        info!("{} {} {:?}", kind, stored.name_any(), outcome);
        return Ok(outcome);
    }

    api.create(&post_params(), &obj).await?;
    info!("{} {} created", kind, obj.name_any());
    Ok(ApplyOutcome::Created)
}
