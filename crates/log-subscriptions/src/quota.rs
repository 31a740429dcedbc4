// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Guards the platform limit of one subscription filter per log group.
//!
//! The static check looks only at declared configuration and runs before any
//! remote call. The dynamic check compares live state with what a previous
//! deployment of this service recorded. It is compare-then-act: a concurrent
//! deployment by someone else can still race it, and the platform stays the
//! final arbiter.

use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::error::CompileError;
use crate::resolver::IdentityResolver;
use crate::setting::FunctionTrigger;

/// Subscription filters the platform allows on a single log group.
pub const MAX_SUBSCRIPTION_FILTERS_PER_LOG_GROUP: usize = 1;

/// Fails when a log group is the target of more declared triggers than the
/// platform allows. Callers pass only the triggers of the current stage.
pub fn check_declared_triggers<'a, I>(triggers: I) -> Result<(), CompileError>
where
    I: IntoIterator<Item = &'a FunctionTrigger>,
{
    let mut by_log_group: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for trigger in triggers {
        by_log_group
            .entry(trigger.setting.log_group_name.as_str())
            .or_default()
            .push(trigger.function_name.as_str());
    }

    for (log_group, functions) in by_log_group {
        if functions.len() > MAX_SUBSCRIPTION_FILTERS_PER_LOG_GROUP {
            warn!(
                "{} triggers declared for log group {log_group}",
                functions.len()
            );
            return Err(CompileError::QuotaExceeded {
                log_group: log_group.to_string(),
                reason: format!(
                    "{} logSubscription triggers are declared for it (functions: {}) but only {} subscription filter is allowed",
                    functions.len(),
                    functions.join(", "),
                    MAX_SUBSCRIPTION_FILTERS_PER_LOG_GROUP
                ),
            });
        }
    }
    Ok(())
}

#[derive(Clone)]
pub struct QuotaGuard {
    resolver: IdentityResolver,
}

impl QuotaGuard {
    pub fn new(resolver: IdentityResolver) -> Self {
        Self { resolver }
    }

    /// Fails when the log group already streams into a destination that this
    /// service did not create for this function on a previous deployment.
    pub async fn check_deployed(
        &self,
        stack_name: &str,
        log_group_name: &str,
        function_qualified_name: &str,
    ) -> Result<(), CompileError> {
        let Some(existing) = self
            .resolver
            .resolve_existing_destination(log_group_name)
            .await?
        else {
            debug!("Log group {log_group_name} has no subscription filter");
            return Ok(());
        };

        let expected = self
            .resolver
            .reconstruct_expected_destination(stack_name, log_group_name, function_qualified_name)
            .await?;

        if expected.as_deref() == Some(existing.as_str()) {
            debug!("Log group {log_group_name} already streams into {existing}, updating");
            return Ok(());
        }

        warn!("Log group {log_group_name} already streams into {existing}");
        Err(CompileError::QuotaExceeded {
            log_group: log_group_name.to_string(),
            reason: format!(
                "it already has a subscription filter with destination {existing} that was not created for {function_qualified_name}"
            ),
        })
    }
}
