// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Logical id generation for compiled resources.

use rand::distributions::Alphanumeric;
use rand::Rng;

const PERMISSION_TAG: &str = "LambdaPermission";
const SUBSCRIPTION_FILTER_TAG: &str = "SubscriptionFilter";

/// Name normalisation owned by the host framework.
pub trait Naming: Send + Sync {
    fn normalize_function_name(&self, function_name: &str) -> String;

    /// Logical id of the function resource itself.
    fn lambda_logical_id(&self, function_name: &str) -> String {
        format!("{}LambdaFunction", self.normalize_function_name(function_name))
    }

    fn normalize_log_group_name(&self, log_group_name: &str) -> String;
}

/// Framework conventions: capitalised first letter, `-` becomes `Dash`,
/// `_` becomes `Underscore`, log groups keep ASCII alphanumerics only.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNaming;

impl Naming for DefaultNaming {
    fn normalize_function_name(&self, function_name: &str) -> String {
        let replaced = function_name
            .replace('-', "Dash")
            .replace('_', "Underscore");
        capitalize(&replaced)
    }

    fn normalize_log_group_name(&self, log_group_name: &str) -> String {
        alphanumeric(log_group_name)
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Keeps ASCII alphanumerics only.
pub fn alphanumeric(value: &str) -> String {
    value.chars().filter(char::is_ascii_alphanumeric).collect()
}

/// Logical ids of the two resources compiled for one trigger.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LogicalIds {
    pub permission: String,
    pub subscription_filter: String,
}

impl LogicalIds {
    /// `index` is the trigger's position in its function's event list. It keeps
    /// two triggers of one function on the same log group apart.
    pub fn new(naming: &dyn Naming, function_name: &str, log_group_name: &str, index: usize) -> Self {
        let function = naming.normalize_function_name(function_name);
        let log_group = naming.normalize_log_group_name(log_group_name);
        Self {
            permission: format!("{function}{PERMISSION_TAG}{log_group}{index}"),
            subscription_filter: format!("{function}{SUBSCRIPTION_FILTER_TAG}{log_group}{index}"),
        }
    }
}

/// Output key recording which function a log group streams into.
pub fn destination_output_key(log_group_name: &str, function_qualified_name: &str) -> String {
    alphanumeric(&format!("{log_group_name}{function_qualified_name}"))
}

/// Short random suffix for display stages.
pub fn random_suffix(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_normalize_function_name() {
        let naming = DefaultNaming;
        assert_eq!(naming.normalize_function_name("hello"), "Hello");
        assert_eq!(naming.normalize_function_name("my-func_x"), "MyDashfuncUnderscorex");
        assert_eq!(naming.lambda_logical_id("hello"), "HelloLambdaFunction");
    }

    #[test]
    fn test_logical_ids() {
        let ids = LogicalIds::new(&DefaultNaming, "consumer", "/aws/lambda/producer-dev", 1);
        assert_eq!(ids.permission, "ConsumerLambdaPermissionawslambdaproducerdev1");
        assert_eq!(
            ids.subscription_filter,
            "ConsumerSubscriptionFilterawslambdaproducerdev1"
        );
    }

    #[test]
    fn test_same_log_group_differs_by_index() {
        let first = LogicalIds::new(&DefaultNaming, "consumer", "/aws/lambda/a", 0);
        let second = LogicalIds::new(&DefaultNaming, "consumer", "/aws/lambda/a", 1);
        assert_ne!(first.permission, second.permission);
        assert_ne!(first.subscription_filter, second.subscription_filter);
    }

    #[test]
    fn test_destination_output_key() {
        assert_eq!(
            destination_output_key("/aws/lambda/producer", "svc-dev-consumer"),
            "awslambdaproducersvcdevconsumer"
        );
    }

    #[test]
    fn test_random_suffix() {
        let suffix = random_suffix(4);
        assert_eq!(suffix.len(), 4);
        assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric()));
        assert!(random_suffix(0).is_empty());
    }

    proptest! {
        #[test]
        fn prop_ids_unique_per_trigger(
            function in "[a-z][a-z0-9]{0,8}",
            groups in proptest::collection::vec("/aws/lambda/[a-z]{1,6}", 1..6),
        ) {
            let mut seen = HashSet::new();
            for (index, group) in groups.iter().enumerate() {
                let ids = LogicalIds::new(&DefaultNaming, &function, group, index);
                prop_assert!(seen.insert(ids.permission.clone()));
                prop_assert!(seen.insert(ids.subscription_filter.clone()));
            }
        }
    }
}
