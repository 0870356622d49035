// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Layered configuration for the RDS access provider.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Validation of the resolved provider identifiers
//! - Consistent environment variable naming (`RDS_ACCESS_*`)
//!
//! # Usage
//!
//! ```ignore
//! use rds_access_config::load_config;
//!
//! let config = load_config()?;
//! println!("granting against account {}", config.provider.target_account_id);
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::RdsAccessConfigLayer;
pub use sections::*;
pub use sources::{
	ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource, SYSTEM_CONFIG_PATH,
};

use std::path::PathBuf;

use rds_access_core::ProviderConfig;
use tracing::{debug, info};

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct RdsAccessConfig {
	pub provider: ProviderConfig,
	pub logging: LoggingConfig,
	pub sandbox: SandboxConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`RDS_ACCESS_*`)
/// 2. Config file (`/etc/rds-access/provider.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<RdsAccessConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource::new()),
	])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<PathBuf>,
) -> Result<RdsAccessConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource::new()),
	])
}

/// Merge `sources` in precedence order and resolve the result.
pub fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<RdsAccessConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = RdsAccessConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		merged.merge(source.load()?);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
pub fn finalize(layer: RdsAccessConfigLayer) -> Result<RdsAccessConfig, ConfigError> {
	let provider = layer.provider.unwrap_or_default().finalize()?;
	let logging = layer.logging.unwrap_or_default().finalize();
	let sandbox = layer.sandbox.unwrap_or_default().finalize();

	info!(
		instance_id = %provider.instance_id,
		target_account_id = %provider.target_account_id,
		database_region = %provider.database_region,
		parameter_prefix = %provider.parameter_prefix,
		log_format = %logging.format,
		sandbox_state = %sandbox.state_path.display(),
		"provider configuration loaded"
	);

	Ok(RdsAccessConfig {
		provider,
		logging,
		sandbox,
	})
}
