// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::assets;
use crate::constants::USER_CLUSTER_ROLE;
use crate::install::cluster::{install_resource, is_cluster_role_installed};
use crate::install::openshift::openshift_console_download_link;
use kube::Client;
use tracing::{debug, info};

/// Try to install optional tools and warn if something goes wrong.
/// Never fails: missing permissions on these resources are common.
pub async fn operator_startup_optional_tools(client: &Client) {
    if let Err(e) = openshift_console_download_link(client).await {
        info!("Cannot install OpenShift CLI download link: skipping.");
        debug!("Error while installing OpenShift CLI download link: {}", e);
    }

    match is_cluster_role_installed(client, USER_CLUSTER_ROLE).await {
        Err(e) => {
            info!("Cannot detect user cluster role: skipping.");
            debug!("Error while getting user cluster role: {}", e);
        }
        Ok(false) => {
            if let Err(e) = install_resource(client, None, assets::USER_CLUSTER_ROLE).await {
                info!("Cannot install user cluster role: skipping.");
                debug!("Error while installing user cluster role: {}", e);
            }
        }
        Ok(true) => {}
    }
}
