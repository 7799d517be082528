// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes utilities for client creation, CRD discovery, resource
//! application and YAML rendering.

pub mod client;
pub mod crd;
pub mod permission;
pub mod resources;
pub mod yaml;

pub use client::{create_client, ClientOptions};
pub use crd::{
    are_all_crds_installed, has_api_resource, is_api_extensions_v1, is_crd_installed,
    wait_for_all_crd_installation,
};
pub use permission::check_permission;
pub use resources::{
    dynamic_api, is_resource_installed, replace_resource, replace_status, ApplyOutcome,
};
pub use yaml::{to_yaml, Collection};
