// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! CRD manifests and conversion to the legacy `v1beta1` API.
//!
//! The CRDs are generated from the Rust types. Clusters that predate
//! `apiextensions.k8s.io/v1` (OpenShift 3, Kubernetes < 1.16) only accept
//! `v1beta1`, where schema, subresources and printer columns live at the
//! top level of the spec whenever all versions share them.

use crate::error::{Result, YaksError};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::{
    CustomResourceColumnDefinition, CustomResourceDefinition,
};
use kube::{api::DynamicObject, discovery::ApiResource, ResourceExt};
use serde_json::{json, Value};

/// API version used to create CRDs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrdApiVersion {
    V1,
    V1beta1,
}

impl CrdApiVersion {
    pub fn version(&self) -> &'static str {
        match self {
            CrdApiVersion::V1 => "v1",
            CrdApiVersion::V1beta1 => "v1beta1",
        }
    }

    pub fn api_resource(&self) -> ApiResource {
        ApiResource {
            group: "apiextensions.k8s.io".to_string(),
            version: self.version().to_string(),
            api_version: format!("apiextensions.k8s.io/{}", self.version()),
            kind: "CustomResourceDefinition".to_string(),
            plural: "customresourcedefinitions".to_string(),
        }
    }
}

/// Render a CRD for the requested API version
pub fn convert_crd(crd: &CustomResourceDefinition, target: CrdApiVersion) -> Result<DynamicObject> {
    match target {
        CrdApiVersion::V1 => Ok(serde_json::from_value(serde_json::to_value(crd)?)?),
        CrdApiVersion::V1beta1 => downgrade_to_v1beta1(crd),
    }
}

/// Convert a `v1` CRD into its `apiextensions.k8s.io/v1beta1` form
pub fn downgrade_to_v1beta1(crd: &CustomResourceDefinition) -> Result<DynamicObject> {
    let name = crd.name_any();
    let versions = &crd.spec.versions;
    let first = versions
        .first()
        .ok_or_else(|| YaksError::CrdConversion(name.clone(), "no versions defined".to_string()))?;

    let shared_schema = versions.iter().all(|v| v.schema == first.schema);
    let shared_subresources = versions.iter().all(|v| v.subresources == first.subresources);
    let shared_columns = versions
        .iter()
        .all(|v| v.additional_printer_columns == first.additional_printer_columns);

    let mut converted_versions = Vec::with_capacity(versions.len());
    for version in versions {
        let mut entry = json!({
            "name": version.name,
            "served": version.served,
            "storage": version.storage,
        });
        if let Some(deprecated) = version.deprecated {
            entry["deprecated"] = json!(deprecated);
        }
        if let Some(warning) = &version.deprecation_warning {
            entry["deprecationWarning"] = json!(warning);
        }
        if !shared_schema {
            if let Some(schema) = &version.schema {
                entry["schema"] = serde_json::to_value(schema)?;
            }
        }
        if !shared_subresources {
            if let Some(subresources) = &version.subresources {
                entry["subresources"] = serde_json::to_value(subresources)?;
            }
        }
        if !shared_columns {
            if let Some(columns) = &version.additional_printer_columns {
                entry["additionalPrinterColumns"] = printer_columns(columns);
            }
        }
        converted_versions.push(entry);
    }

    let mut spec = json!({
        "group": crd.spec.group,
        "names": crd.spec.names,
        "scope": crd.spec.scope,
        "version": first.name,
        "versions": converted_versions,
        "preserveUnknownFields": crd.spec.preserve_unknown_fields.unwrap_or(false),
    });
    if shared_schema {
        if let Some(schema) = &first.schema {
            spec["validation"] = serde_json::to_value(schema)?;
        }
    }
    if shared_subresources {
        if let Some(subresources) = &first.subresources {
            spec["subresources"] = serde_json::to_value(subresources)?;
        }
    }
    if shared_columns {
        if let Some(columns) = &first.additional_printer_columns {
            spec["additionalPrinterColumns"] = printer_columns(columns);
        }
    }
    if let Some(conversion) = &crd.spec.conversion {
        let mut strategy = json!({ "strategy": conversion.strategy });
        if let Some(webhook) = &conversion.webhook {
            if let Some(client_config) = &webhook.client_config {
                strategy["webhookClientConfig"] = serde_json::to_value(client_config)?;
            }
            strategy["conversionReviewVersions"] = json!(webhook.conversion_review_versions);
        }
        spec["conversion"] = strategy;
    }

    let mut metadata = json!({ "name": name });
    if let Some(labels) = &crd.metadata.labels {
        metadata["labels"] = json!(labels);
    }
    if let Some(annotations) = &crd.metadata.annotations {
        metadata["annotations"] = json!(annotations);
    }

    Ok(serde_json::from_value(json!({
        "apiVersion": CrdApiVersion::V1beta1.api_resource().api_version,
        "kind": "CustomResourceDefinition",
        "metadata": metadata,
        "spec": spec,
    }))?)
}

fn printer_columns(columns: &[CustomResourceColumnDefinition]) -> Value {
    Value::Array(
        columns
            .iter()
            .map(|column| {
                let mut entry = json!({
                    "name": column.name,
                    "type": column.type_,
                    "JSONPath": column.json_path,
                });
                if let Some(format) = &column.format {
                    entry["format"] = json!(format);
                }
                if let Some(description) = &column.description {
                    entry["description"] = json!(description);
                }
                if let Some(priority) = column.priority {
                    entry["priority"] = json!(priority);
                }
                entry
            })
            .collect(),
    )
}
