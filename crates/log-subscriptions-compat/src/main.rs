// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use log_subscriptions::{
    CompatConfig, CompiledTemplate, ConfigError, LogSubscriptionPlugin, RecordedProvider,
    ServiceModel,
};

#[tokio::main]
pub async fn main() -> ExitCode {
    let config = match CompatConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let env_filter = config.log_level.clone();

    #[allow(clippy::expect_used)]
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(env_filter).expect("could not parse log level in configuration"),
        )
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .without_time()
        .finish();

    #[allow(clippy::expect_used)]
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    debug!("Logging subsystem enabled");

    match run(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &CompatConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut service: ServiceModel = read_json(&config.service_file)?;
    if let Some(stage) = &config.stage {
        service.stage = stage.clone();
    }
    if let Some(region) = &config.region {
        service.region = region.clone();
    }

    let provider: RecordedProvider = read_json(&config.state_file)?;
    let template: CompiledTemplate = match &config.template_file {
        Some(path) => read_json(path)?,
        None => CompiledTemplate::new(),
    };
    let template = Arc::new(Mutex::new(template));

    info!(
        "Compiling log subscriptions of {} (stage {}, region {})",
        service.service, service.stage, service.region
    );
    let plugin = LogSubscriptionPlugin::new(
        service,
        Arc::new(provider),
        Arc::clone(&template),
        config.options.clone(),
    );
    plugin.compile_events().await?;

    let rendered = {
        let template = template
            .lock()
            .map_err(|_| log_subscriptions::CompileError::TemplatePoisoned)?;
        serde_json::to_string_pretty(&*template)?
    };
    std::fs::write(&config.output_file, rendered).map_err(|e| ConfigError::Write {
        path: config.output_file.clone(),
        reason: e.to_string(),
    })?;
    info!("Template written to {}", config.output_file);
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_string(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&contents).map_err(|e| ConfigError::Read {
        path: path.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::path::Path;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, value: &Value) -> String {
        let path = dir.path().join(name);
        std::fs::write(&path, value.to_string()).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn config(dir: &TempDir, state: Value) -> CompatConfig {
        let service = json!({
            "service": "orders",
            "stage": "dev",
            "region": "eu-west-1",
            "functions": {
                "consumer": {"events": [{"logSubscription": {
                    "stage": "prod",
                    "logGroupName": "/aws/lambda/producer",
                    "filterPattern": "ERROR"
                }}]}
            }
        });
        CompatConfig {
            service_file: write(dir, "service.json", &service),
            state_file: write(dir, "state.json", &state),
            output_file: dir
                .path()
                .join("out.json")
                .to_string_lossy()
                .into_owned(),
            stage: Some("prod".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_run_writes_template() {
        let dir = TempDir::new().unwrap();
        let config = config(
            &dir,
            json!({"logGroups": [{
                "logGroupName": "/aws/lambda/producer",
                "arn": "arn:aws:logs:eu-west-1:123:log-group:/aws/lambda/producer:*"
            }]}),
        );

        run(&config).await.unwrap();

        let output: Value =
            serde_json::from_str(&std::fs::read_to_string(&config.output_file).unwrap()).unwrap();
        let permission = &output["Resources"]["ConsumerLambdaPermissionawslambdaproducer0"];
        assert_eq!(permission["Properties"]["Principal"], "logs.eu-west-1.amazonaws.com");
        assert!(output["Outputs"]["awslambdaproducerordersprodconsumer"].is_object());
    }

    #[tokio::test]
    async fn test_run_fails_without_template_output() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir, json!({"logGroups": []}));

        assert!(run(&config).await.is_err());
        assert!(!Path::new(&config.output_file).exists());
    }

    #[test]
    fn test_read_json_reports_path() {
        let err = read_json::<Value>("/nonexistent/service.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/service.json"));
    }
}
