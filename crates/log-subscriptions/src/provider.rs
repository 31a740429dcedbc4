// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Remote provider port.
//!
//! The compiler never talks to the cloud directly. Everything it needs to know
//! about deployed state goes through [`LogsProvider`], which keeps the quota
//! checks deterministic under test.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

use crate::error::ProviderError;

const DEFAULT_PAGE_SIZE: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogGroup {
    pub log_group_name: String,
    pub arn: String,
}

/// One page of a prefix-filtered log group listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogGroupPage {
    pub log_groups: Vec<LogGroup>,
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionFilter {
    pub filter_name: String,
    pub log_group_name: String,
    pub destination_arn: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackOutput {
    pub output_key: String,
    pub output_value: String,
}

#[async_trait]
pub trait LogsProvider: Send + Sync {
    /// Lists log groups whose name starts with `prefix`. Exact matching is the
    /// caller's job.
    async fn describe_log_groups(
        &self,
        prefix: &str,
        next_token: Option<&str>,
    ) -> Result<LogGroupPage, ProviderError>;

    /// Lists the subscription filters currently attached to a log group.
    async fn describe_subscription_filters(
        &self,
        log_group_name: &str,
    ) -> Result<Vec<SubscriptionFilter>, ProviderError>;

    /// Reads the outputs of a deployed stack. A missing stack is reported as
    /// [`ProviderError::StackNotFound`].
    async fn describe_stack_outputs(
        &self,
        stack_name: &str,
    ) -> Result<Vec<StackOutput>, ProviderError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    DescribeLogGroups,
    DescribeSubscriptionFilters,
    DescribeStackOutputs,
}

/// Snapshot of remote state that answers provider calls from memory.
///
/// Used by the compat binary to compile against recorded state and by tests
/// as a deterministic fake. Every call is counted per [`Operation`].
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedProvider {
    #[serde(default)]
    log_groups: Vec<LogGroup>,
    #[serde(default)]
    subscription_filters: Vec<SubscriptionFilter>,
    /// Deployed stacks keyed by stack name.
    #[serde(default)]
    stacks: BTreeMap<String, Vec<StackOutput>>,
    #[serde(default = "default_page_size")]
    page_size: usize,
    #[serde(skip)]
    failures: HashMap<Operation, String>,
    #[serde(skip)]
    calls: CallCounters,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

#[derive(Debug, Default)]
struct CallCounters {
    log_groups: AtomicUsize,
    subscription_filters: AtomicUsize,
    stack_outputs: AtomicUsize,
}

impl RecordedProvider {
    pub fn new() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            ..Default::default()
        }
    }

    pub fn with_log_group(mut self, name: &str, arn: &str) -> Self {
        self.log_groups.push(LogGroup {
            log_group_name: name.to_string(),
            arn: arn.to_string(),
        });
        self
    }

    pub fn with_subscription_filter(
        mut self,
        log_group_name: &str,
        filter_name: &str,
        destination_arn: &str,
    ) -> Self {
        self.subscription_filters.push(SubscriptionFilter {
            filter_name: filter_name.to_string(),
            log_group_name: log_group_name.to_string(),
            destination_arn: destination_arn.to_string(),
        });
        self
    }

    pub fn with_stack_output(mut self, stack_name: &str, key: &str, value: &str) -> Self {
        self.stacks
            .entry(stack_name.to_string())
            .or_default()
            .push(StackOutput {
                output_key: key.to_string(),
                output_value: value.to_string(),
            });
        self
    }

    /// Registers a deployed stack without outputs.
    pub fn with_stack(mut self, stack_name: &str) -> Self {
        self.stacks.entry(stack_name.to_string()).or_default();
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Makes every call of `operation` fail with `message`.
    pub fn with_failure(mut self, operation: Operation, message: &str) -> Self {
        self.failures.insert(operation, message.to_string());
        self
    }

    pub fn calls(&self, operation: Operation) -> usize {
        self.counter(operation).load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.calls(Operation::DescribeLogGroups)
            + self.calls(Operation::DescribeSubscriptionFilters)
            + self.calls(Operation::DescribeStackOutputs)
    }

    fn counter(&self, operation: Operation) -> &AtomicUsize {
        match operation {
            Operation::DescribeLogGroups => &self.calls.log_groups,
            Operation::DescribeSubscriptionFilters => &self.calls.subscription_filters,
            Operation::DescribeStackOutputs => &self.calls.stack_outputs,
        }
    }

    fn record(&self, operation: Operation) -> Result<(), ProviderError> {
        self.counter(operation).fetch_add(1, Ordering::SeqCst);
        match self.failures.get(&operation) {
            Some(message) => Err(ProviderError::Request(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl LogsProvider for RecordedProvider {
    async fn describe_log_groups(
        &self,
        prefix: &str,
        next_token: Option<&str>,
    ) -> Result<LogGroupPage, ProviderError> {
        self.record(Operation::DescribeLogGroups)?;

        let start = match next_token {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| ProviderError::Request(format!("Invalid next token: {token}")))?,
            None => 0,
        };

        let mut matching = self
            .log_groups
            .iter()
            .filter(|group| group.log_group_name.starts_with(prefix))
            .collect::<Vec<_>>();
        matching.sort_by(|a, b| a.log_group_name.cmp(&b.log_group_name));

        let page_size = self.page_size.max(1);
        let end = (start + page_size).min(matching.len());
        let log_groups = matching
            .get(start..end)
            .unwrap_or_default()
            .iter()
            .map(|group| (*group).clone())
            .collect::<Vec<_>>();
        let next_token = (end < matching.len()).then(|| end.to_string());

        debug!(
            "describe_log_groups prefix={prefix} returned {} groups, more={}",
            log_groups.len(),
            next_token.is_some()
        );
        Ok(LogGroupPage {
            log_groups,
            next_token,
        })
    }

    async fn describe_subscription_filters(
        &self,
        log_group_name: &str,
    ) -> Result<Vec<SubscriptionFilter>, ProviderError> {
        self.record(Operation::DescribeSubscriptionFilters)?;
        Ok(self
            .subscription_filters
            .iter()
            .filter(|filter| filter.log_group_name == log_group_name)
            .cloned()
            .collect())
    }

    async fn describe_stack_outputs(
        &self,
        stack_name: &str,
    ) -> Result<Vec<StackOutput>, ProviderError> {
        self.record(Operation::DescribeStackOutputs)?;
        self.stacks
            .get(stack_name)
            .cloned()
            .ok_or_else(|| ProviderError::StackNotFound {
                stack: stack_name.to_string(),
            })
    }
}
