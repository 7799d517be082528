// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cluster client creation from inferred or explicit kubeconfig

use crate::error::{Result, YaksError};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config as KConfig};
use std::path::PathBuf;
use tracing::{debug, instrument};

/// Where to load the cluster connection from
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    /// Explicit kubeconfig file, otherwise the usual lookup applies
    pub kubeconfig: Option<PathBuf>,
    /// Context to select from the kubeconfig
    pub context: Option<String>,
}

/// Create a client and return it together with the default namespace of
/// the selected context.
#[instrument]
pub async fn create_client(options: &ClientOptions) -> Result<(Client, String)> {
    let config = if options.kubeconfig.is_none() && options.context.is_none() {
        KConfig::infer()
            .await
            .map_err(|e| YaksError::KubeconfigError(format!("Failed to infer config: {}", e)))?
    } else {
        let kubeconfig = match &options.kubeconfig {
            Some(path) => Kubeconfig::read_from(path),
            None => Kubeconfig::read(),
        }
        .map_err(|e| YaksError::KubeconfigError(format!("Failed to read kubeconfig: {}", e)))?;

        let kube_options = KubeConfigOptions {
            context: options.context.clone(),
            ..Default::default()
        };
        KConfig::from_custom_kubeconfig(kubeconfig, &kube_options)
            .await
            .map_err(|e| YaksError::KubeconfigError(format!("Failed to create config: {}", e)))?
    };

    debug!(
        "Using cluster {} with default namespace {}",
        config.cluster_url, config.default_namespace
    );

    let namespace = config.default_namespace.clone();
    let client = Client::try_from(config)
        .map_err(|e| YaksError::KubeconfigError(format!("Failed to create client: {}", e)))?;

    Ok((client, namespace))
}
