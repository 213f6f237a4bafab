//! Banks ETL runner: run configuration and pipeline orchestration.
//!
//! This crate builds on `banks-core` to provide:
//! - `EtlConfig` with defaults, TOML loading and per-run overrides
//! - `Pipeline`, which sequences the stages and reports progress

pub mod config;
pub mod pipeline;

pub use config::{ConfigError, ConfigOverrides, EtlConfig, CONFIG_ENV_VAR};
pub use pipeline::{Pipeline, PipelineError, RunSummary, Stage};
