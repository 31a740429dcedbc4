// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The host's compiled template and the fragments merged into it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CompileError;

/// A single resource description keyed by its logical id in the template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceFragment {
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(rename = "DependsOn", default, skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<String>,
    #[serde(rename = "Properties")]
    pub properties: Value,
}

/// Template output recorded on the deployed stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputFragment {
    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "Value")]
    pub value: Value,
}

/// Accumulating template. Entries are only ever added.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompiledTemplate {
    #[serde(rename = "Resources", default)]
    resources: Map<String, Value>,
    #[serde(rename = "Outputs", default, skip_serializing_if = "Map::is_empty")]
    outputs: Map<String, Value>,
    /// Everything else the host put in the template.
    #[serde(flatten)]
    other: Map<String, Value>,
}

impl CompiledTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resources(&self) -> &Map<String, Value> {
        &self.resources
    }

    pub fn outputs(&self) -> &Map<String, Value> {
        &self.outputs
    }

    pub fn resource(&self, logical_id: &str) -> Option<&Value> {
        self.resources.get(logical_id)
    }

    /// Adds a resource. Re-merging an identical definition is a no-op; a
    /// different definition under an existing id is rejected.
    pub fn merge_resource(
        &mut self,
        logical_id: &str,
        fragment: &ResourceFragment,
    ) -> Result<(), CompileError> {
        let value = to_value(fragment)?;
        insert_new(&mut self.resources, logical_id, value)
    }

    pub fn merge_output(
        &mut self,
        key: &str,
        fragment: &OutputFragment,
    ) -> Result<(), CompileError> {
        let value = to_value(fragment)?;
        insert_new(&mut self.outputs, key, value)
    }
}

fn to_value<T: Serialize>(fragment: &T) -> Result<Value, CompileError> {
    Ok(serde_json::to_value(fragment)?)
}

fn insert_new(
    entries: &mut Map<String, Value>,
    key: &str,
    value: Value,
) -> Result<(), CompileError> {
    match entries.get(key) {
        Some(existing) if *existing == value => Ok(()),
        Some(_) => Err(CompileError::DuplicateLogicalId(key.to_string())),
        None => {
            entries.insert(key.to_string(), value);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fragment(kind: &str) -> ResourceFragment {
        ResourceFragment {
            kind: kind.to_string(),
            depends_on: None,
            properties: json!({"Name": "x"}),
        }
    }

    #[test]
    fn test_merge_keeps_unrelated_entries() {
        let mut template: CompiledTemplate = serde_json::from_value(json!({
            "AWSTemplateFormatVersion": "2010-09-09",
            "Resources": {"Existing": {"Type": "AWS::S3::Bucket"}}
        }))
        .unwrap();

        template
            .merge_resource("New", &fragment("AWS::Lambda::Permission"))
            .unwrap();

        assert_eq!(template.resources().len(), 2);
        assert_eq!(
            template.resource("Existing"),
            Some(&json!({"Type": "AWS::S3::Bucket"}))
        );

        let serialized = serde_json::to_value(&template).unwrap();
        assert_eq!(serialized["AWSTemplateFormatVersion"], "2010-09-09");
        assert!(serialized.get("Outputs").is_none());
    }

    #[test]
    fn test_identical_merge_is_idempotent() {
        let mut template = CompiledTemplate::new();
        let permission = fragment("AWS::Lambda::Permission");
        template.merge_resource("Perm", &permission).unwrap();
        template.merge_resource("Perm", &permission).unwrap();
        assert_eq!(template.resources().len(), 1);
    }

    #[test]
    fn test_conflicting_merge_is_rejected() {
        let mut template = CompiledTemplate::new();
        template
            .merge_resource("Perm", &fragment("AWS::Lambda::Permission"))
            .unwrap();
        let err = template
            .merge_resource("Perm", &fragment("AWS::Logs::SubscriptionFilter"))
            .unwrap_err();
        assert!(matches!(err, CompileError::DuplicateLogicalId(id) if id == "Perm"));
    }

    #[test]
    fn test_depends_on_serialization() {
        let mut filter = fragment("AWS::Logs::SubscriptionFilter");
        filter.depends_on = Some("Perm".to_string());
        let value = serde_json::to_value(&filter).unwrap();
        assert_eq!(value["DependsOn"], "Perm");
        assert!(serde_json::to_value(fragment("x")).unwrap().get("DependsOn").is_none());
    }
}
