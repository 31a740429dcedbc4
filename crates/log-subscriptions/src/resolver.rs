// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Resolution of remote identities: log group ARNs, the destination currently
//! subscribed to a log group, and the destination a previous deployment of
//! this service recorded for it.

use std::sync::Arc;
use tracing::debug;

use crate::error::{CompileError, ProviderError};
use crate::naming::destination_output_key;
use crate::provider::LogsProvider;

#[derive(Clone)]
pub struct IdentityResolver {
    provider: Arc<dyn LogsProvider>,
}

impl IdentityResolver {
    pub fn new(provider: Arc<dyn LogsProvider>) -> Self {
        Self { provider }
    }

    /// Resolves the ARN of the log group named exactly `name`.
    ///
    /// The listing only filters by prefix, so candidates are matched
    /// client-side. Pages are followed until a match or the last page.
    pub async fn resolve_log_group_identity(&self, name: &str) -> Result<String, CompileError> {
        let mut next_token: Option<String> = None;
        loop {
            let page = self
                .provider
                .describe_log_groups(name, next_token.as_deref())
                .await
                .map_err(|e| {
                    CompileError::provider(format!("Failed to describe log group '{name}'"), e)
                })?;

            if page.log_groups.is_empty() {
                return Err(CompileError::LogGroupNotFound(name.to_string()));
            }

            if let Some(group) = page
                .log_groups
                .into_iter()
                .find(|group| group.log_group_name == name)
            {
                debug!("Resolved log group {name} to {}", group.arn);
                return Ok(group.arn);
            }

            match page.next_token {
                Some(token) => next_token = Some(token),
                None => return Err(CompileError::LogGroupNotFound(name.to_string())),
            }
        }
    }

    /// Returns the destination ARN currently subscribed to `log_group_name`.
    pub async fn resolve_existing_destination(
        &self,
        log_group_name: &str,
    ) -> Result<Option<String>, CompileError> {
        let filters = self
            .provider
            .describe_subscription_filters(log_group_name)
            .await
            .map_err(|e| {
                CompileError::provider(
                    format!("Failed to describe subscription filters of '{log_group_name}'"),
                    e,
                )
            })?;
        Ok(filters.into_iter().next().map(|filter| filter.destination_arn))
    }

    /// Returns the destination the previous deployment of `stack_name`
    /// recorded for this log group and function, if any.
    ///
    /// A stack that does not exist yet means there was no previous deployment.
    pub async fn reconstruct_expected_destination(
        &self,
        stack_name: &str,
        log_group_name: &str,
        function_qualified_name: &str,
    ) -> Result<Option<String>, CompileError> {
        let outputs = match self.provider.describe_stack_outputs(stack_name).await {
            Ok(outputs) => outputs,
            Err(ProviderError::StackNotFound { .. }) => {
                debug!("Stack {stack_name} does not exist yet, no previous destination");
                return Ok(None);
            }
            Err(e) => {
                return Err(CompileError::provider(
                    format!("Failed to describe stack '{stack_name}'"),
                    e,
                ))
            }
        };

        let key = destination_output_key(log_group_name, function_qualified_name);
        Ok(outputs
            .into_iter()
            .find(|output| output.output_key == key)
            .map(|output| output.output_value))
    }
}
