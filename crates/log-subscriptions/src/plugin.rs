// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Entry point called by the host framework.

use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use crate::compiler::{CompileSummary, SubscriptionCompiler};
use crate::config::CompilerOptions;
use crate::error::CompileError;
use crate::naming::{DefaultNaming, Naming};
use crate::provider::LogsProvider;
use crate::service::ServiceModel;
use crate::template::CompiledTemplate;

/// Lifecycle hook the compile step is bound to.
pub const COMPILE_EVENTS_HOOK: &str = "package:compileEvents";

pub struct LogSubscriptionPlugin {
    service: ServiceModel,
    compiler: SubscriptionCompiler,
    template: Arc<Mutex<CompiledTemplate>>,
}

impl LogSubscriptionPlugin {
    pub fn new(
        service: ServiceModel,
        provider: Arc<dyn LogsProvider>,
        template: Arc<Mutex<CompiledTemplate>>,
        options: CompilerOptions,
    ) -> Self {
        Self::with_naming(service, provider, Arc::new(DefaultNaming), template, options)
    }

    pub fn with_naming(
        service: ServiceModel,
        provider: Arc<dyn LogsProvider>,
        naming: Arc<dyn Naming>,
        template: Arc<Mutex<CompiledTemplate>>,
        options: CompilerOptions,
    ) -> Self {
        Self {
            service,
            compiler: SubscriptionCompiler::new(provider, naming, options),
            template,
        }
    }

    pub fn hooks(&self) -> &'static [&'static str] {
        &[COMPILE_EVENTS_HOOK]
    }

    /// Runs on [`COMPILE_EVENTS_HOOK`]. Returns one outcome for all triggers.
    pub async fn compile_events(&self) -> Result<CompileSummary, CompileError> {
        debug!(
            "Compiling log subscriptions of {} for stage {}",
            self.service.service, self.service.stage
        );
        let summary = self
            .compiler
            .compile(&self.service, Arc::clone(&self.template))
            .await?;
        info!(
            "Log subscriptions of {} compiled: {} compiled, {} skipped",
            self.service.service, summary.compiled, summary.skipped
        );
        Ok(summary)
    }

    pub fn template(&self) -> Arc<Mutex<CompiledTemplate>> {
        Arc::clone(&self.template)
    }
}
