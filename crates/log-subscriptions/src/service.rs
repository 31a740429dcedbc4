// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Read-only view of the host's service definition.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

const DEFAULT_REGION: &str = "us-east-1";

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceModel {
    pub service: String,
    pub stage: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default)]
    pub functions: BTreeMap<String, FunctionDefinition>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FunctionDefinition {
    /// Deployed name override.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub events: Vec<Value>,
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

impl ServiceModel {
    pub fn new(service: &str, stage: &str, region: &str) -> Self {
        Self {
            service: service.to_string(),
            stage: stage.to_string(),
            region: region.to_string(),
            functions: BTreeMap::new(),
        }
    }

    pub fn with_function(mut self, name: &str, function: FunctionDefinition) -> Self {
        self.functions.insert(name.to_string(), function);
        self
    }

    /// Name of the deployed stack for the current stage.
    pub fn stack_name(&self) -> String {
        format!("{}-{}", self.service, self.stage)
    }

    /// Deployed name of a function, `{service}-{stage}-{function}` unless
    /// overridden.
    pub fn function_qualified_name(&self, function_name: &str) -> String {
        self.functions
            .get(function_name)
            .and_then(|function| function.name.clone())
            .unwrap_or_else(|| format!("{}-{}-{}", self.service, self.stage, function_name))
    }
}

impl FunctionDefinition {
    pub fn with_events(events: Vec<Value>) -> Self {
        Self { name: None, events }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_service() {
        let service: ServiceModel = serde_json::from_value(json!({
            "service": "orders",
            "stage": "dev",
            "functions": {
                "consumer": {"events": [{"logSubscription": {}}]},
                "renamed": {"name": "custom-name"}
            }
        }))
        .unwrap();

        assert_eq!(service.region, "us-east-1");
        assert_eq!(service.stack_name(), "orders-dev");
        assert_eq!(service.functions["consumer"].events.len(), 1);
        assert_eq!(service.function_qualified_name("consumer"), "orders-dev-consumer");
        assert_eq!(service.function_qualified_name("renamed"), "custom-name");
    }
}
