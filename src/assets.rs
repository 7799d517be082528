// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Manifests compiled into the binary

use crate::error::{Result, YaksError};
use kube::api::DynamicObject;

/// Cluster role aggregated into the admin and edit roles
pub const USER_CLUSTER_ROLE: &str = "/rbac/user-cluster-role.yaml";

/// Raw content of an embedded manifest
pub fn resource_as_string(name: &str) -> Result<&'static str> {
    match name {
        USER_CLUSTER_ROLE => Ok(include_str!("../resources/rbac/user-cluster-role.yaml")),
        _ => Err(YaksError::MissingResource(name.to_string())),
    }
}

/// Parse an embedded manifest into an untyped object
pub fn load_resource(name: &str) -> Result<DynamicObject> {
    Ok(serde_yaml::from_str(resource_as_string(name)?)?)
}
