// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Idempotent create/replace helpers for typed and dynamic resources

use crate::constants::FIELD_MANAGER;
use crate::error::{is_already_exists, Result, YaksError};
use kube::{
    api::{DynamicObject, PostParams},
    core::GroupVersionKind,
    discovery::{self, Scope},
    Api, Client, Resource, ResourceExt,
};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;
use tracing::{debug, instrument};

/// What happened to a resource handed to the install helpers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Created,
    Replaced,
    /// Left as found on the cluster
    Unchanged,
    /// Added to a collection instead of being applied
    Collected,
}

pub(crate) fn post_params() -> PostParams {
    PostParams {
        field_manager: Some(FIELD_MANAGER.to_string()),
        ..Default::default()
    }
}

/// Create the object, or replace it when it already exists.
/// The replacement carries the live resourceVersion so the update is not rejected.
/// Returns the object as stored by the API server.
#[instrument(skip(api, obj), fields(name = %obj.name_any()))]
pub async fn replace_resource<K>(api: &Api<K>, obj: &K) -> Result<(ApplyOutcome, K)>
where
    K: Resource + Clone + Serialize + DeserializeOwned + Debug,
{
    let pp = post_params();
    match api.create(&pp, obj).await {
        Ok(created) => Ok((ApplyOutcome::Created, created)),
        Err(e) if is_already_exists(&e) => {
            let name = obj.name_any();
            debug!("{} already exists, replacing it", name);
            let live = api.get(&name).await?;

            let mut replacement = obj.clone();
            replacement.meta_mut().resource_version = live.resource_version();
            let replaced = api.replace(&name, &pp, &replacement).await?;
            Ok((ApplyOutcome::Replaced, replaced))
        }
        Err(e) => Err(e.into()),
    }
}

/// Write the status of an object through the status subresource
pub async fn replace_status<K>(api: &Api<K>, obj: &K) -> Result<K>
where
    K: Resource + Clone + Serialize + DeserializeOwned + Debug,
{
    Ok(api
        .replace_status(&obj.name_any(), &post_params(), serde_json::to_vec(obj)?)
        .await?)
}

/// Check if a resource with the given name exists
pub async fn is_resource_installed<K>(api: &Api<K>, name: &str) -> Result<bool>
where
    K: Resource + Clone + DeserializeOwned + Debug,
{
    Ok(api.get_opt(name).await?.is_some())
}

/// Split an apiVersion like "rbac.authorization.k8s.io/v1" into group and version
pub fn parse_api_version(api_version: &str) -> (&str, &str) {
    api_version.split_once('/').unwrap_or(("", api_version))
}

/// Resolve the API for a dynamic object through discovery.
/// Returns the API and whether the kind is namespaced.
pub async fn dynamic_api(
    client: &Client,
    obj: &DynamicObject,
    namespace: Option<&str>,
) -> Result<(Api<DynamicObject>, bool)> {
    let types = obj.types.as_ref().ok_or_else(|| {
        YaksError::MissingResource(format!("{} has no apiVersion/kind", obj.name_any()))
    })?;
    let (group, version) = parse_api_version(&types.api_version);
    let gvk = GroupVersionKind::gvk(group, version, &types.kind);

    let (ar, caps) = discovery::pinned_kind(client, &gvk).await?;
    let api = match (&caps.scope, namespace) {
        (Scope::Namespaced, Some(ns)) => Api::namespaced_with(client.clone(), ns, &ar),
        (Scope::Namespaced, None) => Api::default_namespaced_with(client.clone(), &ar),
        (Scope::Cluster, _) => Api::all_with(client.clone(), &ar),
    };
    Ok((api, caps.scope == Scope::Namespaced))
}
