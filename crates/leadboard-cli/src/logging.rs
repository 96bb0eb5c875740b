// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use std::env;
use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub const LOG_ENV: &str = "LEADBOARD_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget<'a> {
    /// Interactive mode without a log file: the terminal belongs to the UI.
    Disabled,
    Stderr,
    File(&'a Path),
}

/// `LEADBOARD_LOG` wins over the configured level when it is set and
/// non-blank.
pub fn build_filter(configured: &str, env_override: Option<&str>) -> Result<EnvFilter> {
    let directive = env_override
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(configured);
    EnvFilter::try_new(directive).with_context(|| {
        format!(
            "invalid log filter {directive:?}; set [log].level or {LOG_ENV} to a level such as \"info\" or \"leadboard_client=debug\""
        )
    })
}

pub fn filter_override_from_env() -> Option<String> {
    env::var(LOG_ENV).ok()
}

pub fn init(target: LogTarget<'_>, filter: EnvFilter) -> Result<()> {
    match target {
        LogTarget::Disabled => Ok(()),
        LogTarget::Stderr => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .try_init()
            .map_err(|error| anyhow!("install stderr logger: {error}")),
        LogTarget::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| {
                    format!(
                        "open log file {}; fix [log].file or remove it",
                        path.display()
                    )
                })?;
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .try_init()
                .map_err(|error| anyhow!("install file logger: {error}"))
        }
    }
}
