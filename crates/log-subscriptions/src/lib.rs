// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Compiles `logSubscription` function triggers into a permission and a
//! subscription filter per trigger, refusing to put more than one
//! subscription filter on a log group.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod compiler;
pub mod config;
pub mod emitter;
pub mod error;
pub mod naming;
pub mod plugin;
pub mod provider;
pub mod quota;
pub mod resolver;
pub mod service;
pub mod setting;
pub mod template;

pub use compiler::{CompileSummary, SubscriptionCompiler};
pub use config::{CompatConfig, CompilerOptions};
pub use error::{CompileError, ConfigError, ProviderError};
pub use plugin::{LogSubscriptionPlugin, COMPILE_EVENTS_HOOK};
pub use provider::{LogsProvider, RecordedProvider};
pub use service::{FunctionDefinition, ServiceModel};
pub use template::CompiledTemplate;
