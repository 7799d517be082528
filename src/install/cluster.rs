// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cluster-wide prerequisites: CRDs, the user cluster role and console links

use crate::assets;
use crate::constants::{USER_CLUSTER_ROLE, VERSION};
use crate::error::{is_already_exists, Result, YaksError};
use crate::install::common::{identity_customizer, resource_or_collect};
use crate::install::crd::{convert_crd, CrdApiVersion};
use crate::install::openshift::openshift_console_download_link;
use crate::kubernetes::resources::post_params;
use crate::kubernetes::{
    is_api_extensions_v1, is_crd_installed, is_resource_installed, wait_for_all_crd_installation,
    ApplyOutcome, Collection,
};
use crate::types::{Instance, Test};
use k8s_openapi::api::rbac::v1::ClusterRole;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::{api::DynamicObject, Api, Client, CustomResourceExt, ResourceExt};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Install the CRDs, the user cluster role and the console download link.
///
/// With a collection, CRDs and the cluster role are added to it instead of
/// being created, and the CRD wait is skipped.
#[instrument(skip(client, collection))]
pub async fn setup_cluster_wide_resources_or_collect(
    client: &Client,
    mut collection: Option<&mut Collection>,
    wait_timeout: Duration,
) -> Result<()> {
    let crd_api = if is_api_extensions_v1(client).await? {
        CrdApiVersion::V1
    } else {
        info!("apiextensions.k8s.io/v1 not available, falling back to v1beta1 CRDs");
        CrdApiVersion::V1beta1
    };

    install_crd(client, "Instance", Instance::crd(), crd_api, collection.as_deref_mut()).await?;
    install_crd(client, "Test", Test::crd(), crd_api, collection.as_deref_mut()).await?;

    if collection.is_none() {
        wait_for_all_crd_installation(client, wait_timeout).await?;
    }

    let role_installed = is_cluster_role_installed(client, USER_CLUSTER_ROLE).await?;
    if !role_installed || collection.is_some() {
        install_resource(client, collection.as_deref_mut(), assets::USER_CLUSTER_ROLE).await?;
    }

    openshift_console_download_link(client).await
}

/// Install a single CRD unless it is already served
pub async fn install_crd(
    client: &Client,
    kind: &str,
    crd: CustomResourceDefinition,
    crd_api: CrdApiVersion,
    collection: Option<&mut Collection>,
) -> Result<ApplyOutcome> {
    let name = crd.name_any();
    let crd = convert_crd(&crd, crd_api)
        .map_err(|e| YaksError::CrdConversion(name.clone(), e.to_string()))?;

    if let Some(collection) = collection {
        collection.add(&crd)?;
        return Ok(ApplyOutcome::Collected);
    }

    if is_crd_installed(client, kind, VERSION).await? {
        debug!("CRD {} already installed", name);
        return Ok(ApplyOutcome::Unchanged);
    }

    let crds: Api<DynamicObject> = Api::all_with(client.clone(), &crd_api.api_resource());
    match crds.create(&post_params(), &crd).await {
        Ok(_) => {
            info!("CRD {} installed", name);
            Ok(ApplyOutcome::Created)
        }
        Err(e) if is_already_exists(&e) => {
            debug!("CRD {} created concurrently", name);
            Ok(ApplyOutcome::Unchanged)
        }
        Err(e) => Err(e.into()),
    }
}

pub(crate) async fn is_cluster_role_installed(client: &Client, name: &str) -> Result<bool> {
    let roles: Api<ClusterRole> = Api::all(client.clone());
    is_resource_installed(&roles, name).await
}

pub(crate) async fn install_resource(
    client: &Client,
    collection: Option<&mut Collection>,
    resource: &str,
) -> Result<ApplyOutcome> {
    resource_or_collect(client, None, collection, false, &identity_customizer, resource).await
}
