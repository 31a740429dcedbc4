// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::error::ConfigError;
use std::env;

const DEFAULT_DISPLAY_SUFFIX_LEN: usize = 4;
const DEFAULT_OUTPUT_FILE: &str = "compiled-template.json";
const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Options of a compile run.
#[derive(Debug, Clone)]
pub struct CompilerOptions {
    /// Length of the random suffix appended to display stages. 0 disables it.
    pub display_suffix_len: usize,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            display_suffix_len: DEFAULT_DISPLAY_SUFFIX_LEN,
        }
    }
}

/// Configuration of the compat binary.
#[derive(Debug, Clone)]
pub struct CompatConfig {
    /// Service definition (JSON)
    pub service_file: String,
    /// Recorded provider state (JSON)
    pub state_file: String,
    /// Template to merge into; starts empty when unset
    pub template_file: Option<String>,
    pub output_file: String,
    /// Overrides the stage of the service definition
    pub stage: Option<String>,
    /// Overrides the region of the service definition
    pub region: Option<String>,
    pub log_level: String,
    pub options: CompilerOptions,
}

impl Default for CompatConfig {
    fn default() -> Self {
        Self {
            service_file: String::new(),
            state_file: String::new(),
            template_file: None,
            output_file: DEFAULT_OUTPUT_FILE.to_string(),
            stage: None,
            region: None,
            log_level: "info".to_string(),
            options: CompilerOptions::default(),
        }
    }
}

impl CompatConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let service_file = env::var("LOGSUB_SERVICE_FILE").unwrap_or_default();
        let state_file = env::var("LOGSUB_STATE_FILE").unwrap_or_default();
        let template_file = env::var("LOGSUB_TEMPLATE_FILE").ok();
        let output_file =
            env::var("LOGSUB_OUTPUT_FILE").unwrap_or_else(|_| DEFAULT_OUTPUT_FILE.to_string());
        let stage = env::var("LOGSUB_STAGE").ok();
        let region = env::var("LOGSUB_REGION").ok();
        let log_level = env::var("LOGSUB_LOG_LEVEL")
            .map(|val| val.to_lowercase())
            .unwrap_or_else(|_| "info".to_string());
        let display_suffix_len = match env::var("LOGSUB_DISPLAY_SUFFIX_LEN") {
            Ok(val) => val.parse::<usize>().map_err(|_| {
                ConfigError::Invalid(format!(
                    "LOGSUB_DISPLAY_SUFFIX_LEN must be a non-negative integer, got '{val}'"
                ))
            })?,
            Err(_) => DEFAULT_DISPLAY_SUFFIX_LEN,
        };

        let config = Self {
            service_file,
            state_file,
            template_file,
            output_file,
            stage,
            region,
            log_level,
            options: CompilerOptions { display_suffix_len },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_file.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "LOGSUB_SERVICE_FILE must be set".to_string(),
            ));
        }
        if self.state_file.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "LOGSUB_STATE_FILE must be set".to_string(),
            ));
        }
        if self.output_file.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "LOGSUB_OUTPUT_FILE cannot be empty".to_string(),
            ));
        }
        for (name, value) in [("LOGSUB_STAGE", &self.stage), ("LOGSUB_REGION", &self.region)] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(ConfigError::Invalid(format!("{name} cannot be empty")));
            }
        }
        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.log_level
            )));
        }
        Ok(())
    }
}
