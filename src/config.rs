// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

use crate::constants::crd::WAIT_TIMEOUT_SECS;
use crate::olm::OlmOptions;

/// Client configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Namespace used when none is given on the command line
    pub namespace: Option<String>,
    /// How long to wait for freshly installed CRDs to be served
    pub crd_wait_timeout: Duration,
    /// OLM coordinates of the operator package
    pub olm: OlmOptions,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            namespace: None,
            crd_wait_timeout: Duration::from_secs(WAIT_TIMEOUT_SECS),
            olm: OlmOptions::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let value = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let crd_wait_timeout = match value("YAKS_CRD_WAIT_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(
                raw.parse()
                    .context("YAKS_CRD_WAIT_TIMEOUT_SECS must be a number of seconds")?,
            ),
            None => Duration::from_secs(WAIT_TIMEOUT_SECS),
        };

        let defaults = OlmOptions::default();
        let olm = OlmOptions {
            operator_name: value("YAKS_OLM_OPERATOR_NAME").unwrap_or(defaults.operator_name),
            package: value("YAKS_OLM_PACKAGE").unwrap_or(defaults.package),
            channel: value("YAKS_OLM_CHANNEL").unwrap_or(defaults.channel),
            source: value("YAKS_OLM_SOURCE").unwrap_or(defaults.source),
            source_namespace: value("YAKS_OLM_SOURCE_NAMESPACE")
                .unwrap_or(defaults.source_namespace),
            starting_csv: value("YAKS_OLM_STARTING_CSV").unwrap_or(defaults.starting_csv),
            global_namespace: value("YAKS_OLM_GLOBAL_NAMESPACE")
                .unwrap_or(defaults.global_namespace),
        };

        Ok(Config {
            namespace: value("YAKS_NAMESPACE"),
            crd_wait_timeout,
            olm,
        })
    }
}
