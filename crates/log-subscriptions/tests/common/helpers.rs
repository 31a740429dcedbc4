// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use log_subscriptions::{
    CompileError, CompileSummary, CompiledTemplate, CompilerOptions, FunctionDefinition,
    LogSubscriptionPlugin, RecordedProvider, ServiceModel,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

pub const SERVICE: &str = "orders";
pub const STAGE: &str = "dev";
pub const REGION: &str = "eu-west-1";

pub fn log_subscription(stage: &str, log_group: &str, pattern: &str) -> Value {
    json!({"logSubscription": {
        "stage": stage,
        "logGroupName": log_group,
        "filterPattern": pattern,
    }})
}

pub fn log_group_arn(name: &str) -> String {
    format!("arn:aws:logs:{REGION}:123456789012:log-group:{name}:*")
}

pub fn service(functions: Vec<(&str, Vec<Value>)>) -> ServiceModel {
    functions
        .into_iter()
        .fold(ServiceModel::new(SERVICE, STAGE, REGION), |service, (name, events)| {
            service.with_function(name, FunctionDefinition::with_events(events))
        })
}

/// Runs the compile hook with a fixed display stage.
pub async fn compile(
    service: ServiceModel,
    provider: Arc<RecordedProvider>,
    template: CompiledTemplate,
) -> (Result<CompileSummary, CompileError>, CompiledTemplate) {
    let template = Arc::new(Mutex::new(template));
    let plugin = LogSubscriptionPlugin::new(
        service,
        provider,
        Arc::clone(&template),
        CompilerOptions {
            display_suffix_len: 0,
        },
    );
    let result = plugin.compile_events().await;
    let template = template.lock().expect("lock poisoned").clone();
    (result, template)
}
