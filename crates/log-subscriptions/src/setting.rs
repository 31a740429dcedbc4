// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Validation of `logSubscription` trigger declarations.
//!
//! A function event is a free-form object; only events carrying the
//! [`TRIGGER_KEY`] key are log subscription triggers. Every other event is
//! silently skipped.

use serde_json::Value;

use crate::error::CompileError;

/// Event key that marks a log subscription trigger.
pub const TRIGGER_KEY: &str = "logSubscription";

const STAGE: &str = "stage";
const LOG_GROUP_NAME: &str = "logGroupName";
const FILTER_PATTERN: &str = "filterPattern";

/// A validated trigger declaration.
///
/// `declared_stage` drives every stage comparison. `display_stage` only ever
/// ends up inside generated filter names and may carry a random suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerSetting {
    pub declared_stage: String,
    pub display_stage: String,
    pub log_group_name: String,
    pub filter_pattern: String,
}

impl TriggerSetting {
    pub fn new(stage: &str, log_group_name: &str, filter_pattern: &str) -> Self {
        Self {
            declared_stage: stage.to_string(),
            display_stage: stage.to_string(),
            log_group_name: log_group_name.to_string(),
            filter_pattern: filter_pattern.to_string(),
        }
    }

    /// Appends `suffix` to the display stage. The declared stage is untouched.
    pub fn with_display_suffix(mut self, suffix: &str) -> Self {
        if !suffix.is_empty() {
            self.display_stage = format!("{}-{}", self.declared_stage, suffix);
        }
        self
    }

    pub fn matches_stage(&self, stage: &str) -> bool {
        self.declared_stage == stage
    }
}

/// A validated trigger bound to its function.
///
/// `index` is the trigger's position in the function's event list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionTrigger {
    pub function_name: String,
    pub setting: TriggerSetting,
    pub index: usize,
}

/// Returns the raw trigger setting of an event, if the event is of this kind.
pub fn trigger_setting(event: &Value) -> Option<&Value> {
    event.get(TRIGGER_KEY)
}

/// Returns whether a (possibly absent) setting should be compiled.
///
/// An absent setting is not an error. A present setting with a missing or
/// malformed field is fatal.
pub fn should_compile(function: &str, setting: Option<&Value>) -> Result<bool, CompileError> {
    Ok(parse_setting(function, setting)?.is_some())
}

/// Validates a raw setting and converts it into a [`TriggerSetting`].
///
/// Fields are checked in order: `stage`, `logGroupName`, `filterPattern`.
pub fn parse_setting(
    function: &str,
    setting: Option<&Value>,
) -> Result<Option<TriggerSetting>, CompileError> {
    let Some(setting) = setting else {
        return Ok(None);
    };

    let stage = required_string(function, setting, STAGE)?;
    let log_group_name = required_string(function, setting, LOG_GROUP_NAME)?;
    let filter_pattern = required_string(function, setting, FILTER_PATTERN)?;

    Ok(Some(TriggerSetting::new(
        stage,
        log_group_name,
        filter_pattern,
    )))
}

fn required_string<'a>(
    function: &str,
    setting: &'a Value,
    field: &'static str,
) -> Result<&'a str, CompileError> {
    match setting.get(field) {
        None | Some(Value::Null) => Err(CompileError::MissingSetting {
            function: function.to_string(),
            field,
        }),
        Some(Value::String(value)) if !value.is_empty() => Ok(value.as_str()),
        Some(_) => Err(CompileError::InvalidSetting {
            function: function.to_string(),
            field,
        }),
    }
}
