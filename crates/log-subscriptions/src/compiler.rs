// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Compilation of every `logSubscription` trigger of a service.
//!
//! Each trigger moves through
//! `Declared -> Validated -> QuotaChecked -> IdentityResolved ->
//! PermissionEmitted -> FilterEmitted -> Done`, or straight to `Skipped` when
//! it is not of this kind or targets another stage. Any failure fails the
//! whole run.
//!
//! Validation and the static quota check run for all triggers before any
//! remote call. The remaining steps run as one task per trigger. When a task
//! fails, the run returns its error and the other tasks are detached, not
//! aborted: they may still call the provider and merge into the template.

use std::sync::{Arc, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::config::CompilerOptions;
use crate::emitter::ResourceEmitter;
use crate::error::CompileError;
use crate::naming::{random_suffix, Naming};
use crate::provider::LogsProvider;
use crate::quota::{check_declared_triggers, QuotaGuard};
use crate::resolver::IdentityResolver;
use crate::service::ServiceModel;
use crate::setting::{parse_setting, trigger_setting, FunctionTrigger};
use crate::template::CompiledTemplate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerState {
    Declared,
    Validated,
    QuotaChecked,
    IdentityResolved,
    PermissionEmitted,
    FilterEmitted,
    Done,
    Skipped,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileSummary {
    pub compiled: usize,
    /// Triggers declared for another stage.
    pub skipped: usize,
}

pub struct SubscriptionCompiler {
    provider: Arc<dyn LogsProvider>,
    naming: Arc<dyn Naming>,
    options: CompilerOptions,
}

impl SubscriptionCompiler {
    pub fn new(
        provider: Arc<dyn LogsProvider>,
        naming: Arc<dyn Naming>,
        options: CompilerOptions,
    ) -> Self {
        Self {
            provider,
            naming,
            options,
        }
    }

    /// Compiles every trigger of `service` into `template`.
    pub async fn compile(
        &self,
        service: &ServiceModel,
        template: Arc<Mutex<CompiledTemplate>>,
    ) -> Result<CompileSummary, CompileError> {
        let (triggers, skipped) = collect_triggers(service)?;
        check_declared_triggers(&triggers)?;

        let suffix = random_suffix(self.options.display_suffix_len);
        let resolver = IdentityResolver::new(Arc::clone(&self.provider));
        let guard = QuotaGuard::new(resolver.clone());
        let emitter = ResourceEmitter::new(Arc::clone(&self.naming), &service.region);
        let stack_name = service.stack_name();

        let mut tasks = JoinSet::new();
        for mut trigger in triggers {
            trigger.setting = trigger.setting.with_display_suffix(&suffix);
            let pipeline = TriggerPipeline {
                function_qualified_name: service.function_qualified_name(&trigger.function_name),
                stack_name: stack_name.clone(),
                trigger,
                resolver: resolver.clone(),
                guard: guard.clone(),
                emitter: emitter.clone(),
                template: Arc::clone(&template),
            };
            tasks.spawn(pipeline.run());
        }

        let mut summary = CompileSummary {
            compiled: 0,
            skipped,
        };
        while let Some(joined) = tasks.join_next().await {
            let failure = match joined {
                Ok(Ok(_)) => {
                    summary.compiled += 1;
                    continue;
                }
                Ok(Err(e)) => e,
                Err(e) => CompileError::TaskJoin(e.to_string()),
            };
            error!("Failed to compile log subscriptions: {failure}");
            tasks.detach_all();
            return Err(failure);
        }

        info!(
            "Compiled {} log subscription triggers, skipped {}",
            summary.compiled, summary.skipped
        );
        Ok(summary)
    }
}

/// Validates every declared trigger and keeps those of the current stage.
///
/// Returns the kept triggers and the number skipped for stage mismatch. No
/// remote call is made.
pub fn collect_triggers(
    service: &ServiceModel,
) -> Result<(Vec<FunctionTrigger>, usize), CompileError> {
    let mut triggers = Vec::new();
    let mut skipped = 0;

    for (function_name, function) in &service.functions {
        for (index, event) in function.events.iter().enumerate() {
            let Some(raw) = trigger_setting(event) else {
                continue;
            };
            debug!("{function_name}[{index}] -> {:?}", TriggerState::Declared);
            let Some(setting) = parse_setting(function_name, Some(raw))? else {
                continue;
            };
            if !setting.matches_stage(&service.stage) {
                debug!(
                    "{function_name}[{index}] -> {:?}: declared for stage {}",
                    TriggerState::Skipped,
                    setting.declared_stage
                );
                skipped += 1;
                continue;
            }
            debug!("{function_name}[{index}] -> {:?}", TriggerState::Validated);
            triggers.push(FunctionTrigger {
                function_name: function_name.clone(),
                setting,
                index,
            });
        }
    }
    Ok((triggers, skipped))
}

struct TriggerPipeline {
    trigger: FunctionTrigger,
    function_qualified_name: String,
    stack_name: String,
    resolver: IdentityResolver,
    guard: QuotaGuard,
    emitter: ResourceEmitter,
    template: Arc<Mutex<CompiledTemplate>>,
}

impl TriggerPipeline {
    async fn run(self) -> Result<TriggerState, CompileError> {
        let FunctionTrigger {
            function_name,
            setting,
            index,
        } = &self.trigger;
        let log_group = setting.log_group_name.as_str();

        self.guard
            .check_deployed(&self.stack_name, log_group, &self.function_qualified_name)
            .await?;
        self.transition(TriggerState::QuotaChecked);

        let log_group_arn = self.resolver.resolve_log_group_identity(log_group).await?;
        self.transition(TriggerState::IdentityResolved);

        let permission = self
            .emitter
            .build_permission(setting, function_name, &log_group_arn, *index);
        self.merge(|template| {
            template.merge_resource(&permission.logical_id, &permission.fragment)
        })?;
        self.transition(TriggerState::PermissionEmitted);

        let filter = self
            .emitter
            .build_subscription_filter(setting, function_name, *index);
        let (output_key, output) = self.emitter.build_destination_output(
            setting,
            function_name,
            &self.function_qualified_name,
        );
        self.merge(|template| {
            template.merge_resource(&filter.logical_id, &filter.fragment)?;
            template.merge_output(&output_key, &output)
        })?;
        self.transition(TriggerState::FilterEmitted);

        self.transition(TriggerState::Done);
        Ok(TriggerState::Done)
    }

    fn merge<F>(&self, apply: F) -> Result<(), CompileError>
    where
        F: FnOnce(&mut CompiledTemplate) -> Result<(), CompileError>,
    {
        let mut template = self
            .template
            .lock()
            .map_err(|_| CompileError::TemplatePoisoned)?;
        apply(&mut *template)
    }

    fn transition(&self, state: TriggerState) {
        debug!(
            "{}[{}] {} -> {:?}",
            self.trigger.function_name,
            self.trigger.index,
            self.trigger.setting.log_group_name,
            state
        );
    }
}
