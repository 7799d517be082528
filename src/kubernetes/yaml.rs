// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! YAML rendering and resource collections

use crate::error::Result;
use kube::api::DynamicObject;
use serde::Serialize;

/// Render an object as YAML with keys sorted alphabetically.
/// The object goes through a generic JSON value first so field order does
/// not depend on the struct layout.
pub fn to_yaml<T: Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_value(value)?;
    Ok(serde_yaml::to_string(&json)?)
}

/// Resources gathered instead of being applied to the cluster
#[derive(Debug, Default, Clone)]
pub struct Collection {
    items: Vec<DynamicObject>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add any serializable Kubernetes object
    pub fn add<T: Serialize>(&mut self, obj: &T) -> Result<()> {
        let obj: DynamicObject = serde_json::from_value(serde_json::to_value(obj)?)?;
        self.items.push(obj);
        Ok(())
    }

    pub fn items(&self) -> &[DynamicObject] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Render all items as a multi-document YAML stream
    pub fn to_yaml(&self) -> Result<String> {
        let mut out = String::new();
        for item in &self.items {
            out.push_str("---\n");
            out.push_str(&to_yaml(item)?);
        }
        Ok(out)
    }
}
