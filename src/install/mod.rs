// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Installation of cluster prerequisites and embedded manifests.

pub mod cluster;
pub mod common;
pub mod crd;
pub mod openshift;
pub mod optional;

pub use cluster::{install_crd, setup_cluster_wide_resources_or_collect};
pub use common::{
    identity_customizer, resource_or_collect, resources_or_collect, runtime_object_or_collect,
    ResourceCustomizer,
};
pub use crd::{convert_crd, downgrade_to_v1beta1, CrdApiVersion};
pub use openshift::openshift_console_download_link;
pub use optional::operator_startup_optional_tools;
