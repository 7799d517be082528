// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Access checks for the current user or service account

use crate::error::Result;
use k8s_openapi::api::authorization::v1::{
    ResourceAttributes, SelfSubjectAccessReview, SelfSubjectAccessReviewSpec,
};
use kube::{api::PostParams, Api, Client};
use tracing::{debug, instrument};

/// Ask the API server whether the caller may perform `verb` on the resource
#[instrument(skip(client))]
pub async fn check_permission(
    client: &Client,
    group: &str,
    resource: &str,
    namespace: &str,
    name: &str,
    verb: &str,
) -> Result<bool> {
    let review = SelfSubjectAccessReview {
        spec: SelfSubjectAccessReviewSpec {
            resource_attributes: Some(ResourceAttributes {
                group: Some(group.to_string()),
                resource: Some(resource.to_string()),
                namespace: Some(namespace.to_string()),
                name: Some(name.to_string()),
                verb: Some(verb.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        },
        ..Default::default()
    };

    let reviews: Api<SelfSubjectAccessReview> = Api::all(client.clone());
    let response = reviews.create(&PostParams::default(), &review).await?;
    let allowed = response.status.is_some_and(|s| s.allowed);

    debug!("Permission to {} {}.{}: {}", verb, resource, group, allowed);
    Ok(allowed)
}
