// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! CRD availability checking utilities

use crate::constants::crd::POLL_INTERVAL_SECS;
use crate::constants::{GROUP, VERSION};
use crate::error::{is_not_found, Result, YaksError};
use kube::Client;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, instrument};

/// Group version of the v1 CRD API
pub const API_EXTENSIONS_V1: &str = "apiextensions.k8s.io/v1";

/// Check whether discovery lists `kind` under the given group version.
/// A group version that is not served at all counts as "not listed".
pub async fn has_api_resource(client: &Client, group_version: &str, kind: &str) -> Result<bool> {
    match client.list_api_group_resources(group_version).await {
        Ok(list) => Ok(list.resources.iter().any(|r| r.kind == kind)),
        Err(e) if is_not_found(&e) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Check whether the cluster serves the given group version
pub async fn is_group_version_served(client: &Client, group_version: &str) -> Result<bool> {
    match client.list_api_group_resources(group_version).await {
        Ok(_) => Ok(true),
        Err(e) if is_not_found(&e) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Check if the cluster supports `apiextensions.k8s.io/v1` CRDs
pub async fn is_api_extensions_v1(client: &Client) -> Result<bool> {
    is_group_version_served(client, API_EXTENSIONS_V1).await
}

/// Check if the YAKS CRD of the given kind is installed
pub async fn is_crd_installed(client: &Client, kind: &str, version: &str) -> Result<bool> {
    has_api_resource(client, &format!("{}/{}", GROUP, version), kind).await
}

/// Check if all the CRDs the client relies on are installed
pub async fn are_all_crds_installed(client: &Client) -> Result<bool> {
    if !is_crd_installed(client, "Instance", VERSION).await? {
        return Ok(false);
    }
    is_crd_installed(client, "Test", VERSION).await
}

/// Wait until all CRDs are served, polling every POLL_INTERVAL_SECS seconds.
/// A timeout too large to represent waits without a deadline.
#[instrument(skip(client))]
pub async fn wait_for_all_crd_installation(client: &Client, timeout: Duration) -> Result<()> {
    let deadline = Instant::now().checked_add(timeout);

    loop {
        if are_all_crds_installed(client).await? {
            info!("YAKS CRDs ({}/{}) are available", GROUP, VERSION);
            return Ok(());
        }

        if deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(YaksError::CrdTimeout(timeout.as_secs()));
        }

        debug!(
            "YAKS CRDs not yet available, checking again in {} seconds...",
            POLL_INTERVAL_SECS
        );
        sleep(Duration::from_secs(POLL_INTERVAL_SECS)).await;
    }
}
