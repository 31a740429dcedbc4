// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Builders for the resources compiled per trigger.
//!
//! Builders are side-effect free. Merging into the template is the caller's
//! job, permission first.

use serde_json::{json, Value};
use std::sync::Arc;

use crate::naming::{destination_output_key, LogicalIds, Naming};
use crate::setting::TriggerSetting;
use crate::template::{OutputFragment, ResourceFragment};

pub const PERMISSION_TYPE: &str = "AWS::Lambda::Permission";
pub const SUBSCRIPTION_FILTER_TYPE: &str = "AWS::Logs::SubscriptionFilter";
pub const INVOKE_FUNCTION_ACTION: &str = "lambda:InvokeFunction";

/// A fragment together with the logical id it is merged under.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalResource {
    pub logical_id: String,
    pub fragment: ResourceFragment,
}

#[derive(Clone)]
pub struct ResourceEmitter {
    naming: Arc<dyn Naming>,
    region: String,
}

impl ResourceEmitter {
    pub fn new(naming: Arc<dyn Naming>, region: &str) -> Self {
        Self {
            naming,
            region: region.to_string(),
        }
    }

    /// Log ingestion service principal of the configured region.
    pub fn logs_principal(&self) -> String {
        format!("logs.{}.amazonaws.com", self.region)
    }

    pub fn logical_ids(&self, setting: &TriggerSetting, function_name: &str, index: usize) -> LogicalIds {
        LogicalIds::new(
            self.naming.as_ref(),
            function_name,
            &setting.log_group_name,
            index,
        )
    }

    fn function_arn(&self, function_name: &str) -> Value {
        json!({ "Fn::GetAtt": [self.naming.lambda_logical_id(function_name), "Arn"] })
    }

    /// Grants the log service permission to invoke the function, scoped to
    /// the resolved log group.
    pub fn build_permission(
        &self,
        setting: &TriggerSetting,
        function_name: &str,
        log_group_arn: &str,
        index: usize,
    ) -> LogicalResource {
        let ids = self.logical_ids(setting, function_name, index);
        LogicalResource {
            logical_id: ids.permission,
            fragment: ResourceFragment {
                kind: PERMISSION_TYPE.to_string(),
                depends_on: None,
                properties: json!({
                    "FunctionName": self.function_arn(function_name),
                    "Action": INVOKE_FUNCTION_ACTION,
                    "Principal": self.logs_principal(),
                    "SourceArn": log_group_arn,
                }),
            },
        }
    }

    /// Streams the log group into the function. Depends on the permission
    /// built for the same trigger.
    ///
    /// The filter pattern is stored verbatim; quotes in it are escaped when
    /// the template is serialized.
    pub fn build_subscription_filter(
        &self,
        setting: &TriggerSetting,
        function_name: &str,
        index: usize,
    ) -> LogicalResource {
        let ids = self.logical_ids(setting, function_name, index);
        LogicalResource {
            logical_id: ids.subscription_filter,
            fragment: ResourceFragment {
                kind: SUBSCRIPTION_FILTER_TYPE.to_string(),
                properties: json!({
                    "DestinationArn": self.function_arn(function_name),
                    "FilterPattern": setting.filter_pattern,
                    "FilterName": format!("{}-{}", ids.permission, setting.display_stage),
                    "LogGroupName": setting.log_group_name,
                }),
                depends_on: Some(ids.permission),
            },
        }
    }

    /// Records the destination of this log group on the stack so the next
    /// deployment recognises the filter as its own.
    pub fn build_destination_output(
        &self,
        setting: &TriggerSetting,
        function_name: &str,
        function_qualified_name: &str,
    ) -> (String, OutputFragment) {
        let key = destination_output_key(&setting.log_group_name, function_qualified_name);
        let output = OutputFragment {
            description: Some(format!(
                "Subscription destination of log group {}",
                setting.log_group_name
            )),
            value: self.function_arn(function_name),
        };
        (key, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::DefaultNaming;

    fn emitter() -> ResourceEmitter {
        ResourceEmitter::new(Arc::new(DefaultNaming), "eu-west-1")
    }

    fn setting() -> TriggerSetting {
        TriggerSetting::new("dev", "/aws/lambda/producer", "ERROR").with_display_suffix("ab12")
    }

    #[test]
    fn test_permission_shape() {
        let permission = emitter().build_permission(
            &setting(),
            "consumer",
            "arn:aws:logs:eu-west-1:123:log-group:/aws/lambda/producer:*",
            0,
        );
        assert_eq!(permission.logical_id, "ConsumerLambdaPermissionawslambdaproducer0");
        assert_eq!(permission.fragment.kind, PERMISSION_TYPE);
        assert_eq!(permission.fragment.depends_on, None);
        assert_eq!(
            permission.fragment.properties,
            json!({
                "FunctionName": {"Fn::GetAtt": ["ConsumerLambdaFunction", "Arn"]},
                "Action": "lambda:InvokeFunction",
                "Principal": "logs.eu-west-1.amazonaws.com",
                "SourceArn": "arn:aws:logs:eu-west-1:123:log-group:/aws/lambda/producer:*",
            })
        );
    }

    #[test]
    fn test_subscription_filter_shape() {
        let emitter = emitter();
        let permission = emitter.build_permission(&setting(), "consumer", "arn:lg", 0);
        let filter = emitter.build_subscription_filter(&setting(), "consumer", 0);

        assert_eq!(filter.logical_id, "ConsumerSubscriptionFilterawslambdaproducer0");
        assert_eq!(filter.fragment.kind, SUBSCRIPTION_FILTER_TYPE);
        assert_eq!(filter.fragment.depends_on.as_deref(), Some(permission.logical_id.as_str()));
        assert_eq!(
            filter.fragment.properties,
            json!({
                "DestinationArn": {"Fn::GetAtt": ["ConsumerLambdaFunction", "Arn"]},
                "FilterPattern": "ERROR",
                "FilterName": "ConsumerLambdaPermissionawslambdaproducer0-dev-ab12",
                "LogGroupName": "/aws/lambda/producer",
            })
        );
    }

    #[test]
    fn test_filter_pattern_quotes_are_escaped() {
        let setting = TriggerSetting::new("dev", "/aws/lambda/producer", r#"{ $.level = "ERROR" }"#);
        let filter = emitter().build_subscription_filter(&setting, "consumer", 0);

        let rendered = serde_json::to_string(&filter.fragment).unwrap();
        assert!(rendered.contains(r#""FilterPattern":"{ $.level = \"ERROR\" }""#));

        let reparsed: ResourceFragment = serde_json::from_str(&rendered).unwrap();
        assert_eq!(
            reparsed.properties["FilterPattern"],
            r#"{ $.level = "ERROR" }"#
        );
    }

    #[test]
    fn test_destination_output() {
        let (key, output) =
            emitter().build_destination_output(&setting(), "consumer", "svc-dev-consumer");
        assert_eq!(key, "awslambdaproducersvcdevconsumer");
        assert_eq!(
            output.value,
            json!({"Fn::GetAtt": ["ConsumerLambdaFunction", "Arn"]})
        );
    }
}
