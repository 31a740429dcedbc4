// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

/// CloudWatch Logs quota page referenced by every quota error.
pub const SUBSCRIPTION_FILTER_QUOTA_DOC: &str =
    "https://docs.aws.amazon.com/AmazonCloudWatch/latest/logs/cloudwatch_limits_cwl.html";

/// Fatal conditions raised while compiling log subscription triggers.
///
/// A single error aborts the whole compile run; there is no partial output.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("logSubscription trigger of function '{function}' is missing required field '{field}'")]
    MissingSetting {
        function: String,
        field: &'static str,
    },

    #[error("logSubscription trigger of function '{function}': field '{field}' must be a non-empty string")]
    InvalidSetting {
        function: String,
        field: &'static str,
    },

    #[error("Subscription filter quota exceeded for log group '{log_group}': {reason}. See {doc}", doc = SUBSCRIPTION_FILTER_QUOTA_DOC)]
    QuotaExceeded { log_group: String, reason: String },

    #[error("Log group '{0}' was not found")]
    LogGroupNotFound(String),

    #[error("{context}: {source}")]
    Provider {
        context: String,
        #[source]
        source: ProviderError,
    },

    #[error("Logical id '{0}' already exists in the template with a different definition")]
    DuplicateLogicalId(String),

    #[error("Failed to serialize fragment: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Template lock poisoned")]
    TemplatePoisoned,

    #[error("Compile task failed: {0}")]
    TaskJoin(String),
}

impl CompileError {
    pub(crate) fn provider(context: impl Into<String>, source: ProviderError) -> Self {
        Self::Provider {
            context: context.into(),
            source,
        }
    }
}

/// Failures reported by a [`crate::provider::LogsProvider`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("Stack with id {stack} does not exist")]
    StackNotFound { stack: String },

    #[error("{0}")]
    Request(String),
}

/// Invalid environment configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to read {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Failed to write {path}: {reason}")]
    Write { path: String, reason: String },
}
