// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! OpenShift console integration

use crate::error::{is_forbidden, Result};
use crate::kubernetes::has_api_resource;
use crate::kubernetes::resources::post_params;
use kube::{
    api::{DeleteParams, DynamicObject},
    discovery::ApiResource,
    Api, Client,
};
use serde_json::json;
use tracing::{debug, info, instrument};

const CONSOLE_GROUP_VERSION: &str = "console.openshift.io/v1";
const CONSOLE_CLI_DOWNLOAD: &str = "ConsoleCLIDownload";

/// Name of the download entry shown in the OpenShift console
pub const DOWNLOAD_LINK_NAME: &str = "yaks-cli-download";

fn console_cli_download_resource() -> ApiResource {
    ApiResource {
        group: "console.openshift.io".to_string(),
        version: "v1".to_string(),
        api_version: CONSOLE_GROUP_VERSION.to_string(),
        kind: CONSOLE_CLI_DOWNLOAD.to_string(),
        plural: "consoleclidownloads".to_string(),
    }
}

/// Download entry pointing at the CLI release matching `version`
pub fn console_download_link(version: &str) -> Result<DynamicObject> {
    Ok(serde_json::from_value(json!({
        "apiVersion": CONSOLE_GROUP_VERSION,
        "kind": CONSOLE_CLI_DOWNLOAD,
        "metadata": {
            "name": DOWNLOAD_LINK_NAME,
            "labels": { "app": "yaks" }
        },
        "spec": {
            "displayName": "yaks - YAKS Command Line Interface",
            "description": "YAKS is a platform to enable Cloud Native BDD testing on Kubernetes.",
            "links": [{
                "href": format!("https://github.com/citrusframework/yaks/releases/tag/v{}", version),
                "text": "Download the YAKS CLI tool"
            }]
        }
    }))?)
}

/// Register the CLI download link in the OpenShift console.
/// Does nothing on clusters without the console API.
#[instrument(skip(client))]
pub async fn openshift_console_download_link(client: &Client) -> Result<()> {
    if !has_api_resource(client, CONSOLE_GROUP_VERSION, CONSOLE_CLI_DOWNLOAD).await? {
        debug!("{} is not served, skipping console download link", CONSOLE_CLI_DOWNLOAD);
        return Ok(());
    }

    let downloads: Api<DynamicObject> = Api::all_with(client.clone(), &console_cli_download_resource());
    let link = console_download_link(env!("CARGO_PKG_VERSION"))?;

    if let Some(existing) = downloads.get_opt(DOWNLOAD_LINK_NAME).await? {
        if existing.data["spec"]["links"] == link.data["spec"]["links"] {
            debug!("Console download link is up to date");
            return Ok(());
        }
        info!("Replacing stale console download link");
        match downloads.delete(DOWNLOAD_LINK_NAME, &DeleteParams::default()).await {
            Ok(_) => {}
            Err(e) if is_forbidden(&e) => {
                debug!("Not allowed to delete the console download link: {}", e);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }
    }

    match downloads.create(&post_params(), &link).await {
        Ok(_) => {
            info!("Console download link installed");
            Ok(())
        }
        Err(e) if is_forbidden(&e) => {
            debug!("Not allowed to create the console download link: {}", e);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
