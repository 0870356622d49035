// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: defaults, TOML files and environment variables.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::RdsAccessConfigLayer;
use crate::sections::{LogFormat, LoggingConfigLayer, ProviderConfigLayer, SandboxConfigLayer};

pub const SYSTEM_CONFIG_PATH: &str = "/etc/rds-access/provider.toml";

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<RdsAccessConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<RdsAccessConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(RdsAccessConfigLayer::default())
	}
}

/// TOML file configuration source. A missing file contributes nothing.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new(SYSTEM_CONFIG_PATH)
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<RdsAccessConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(RdsAccessConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: RdsAccessConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: RDS_ACCESS_<SECTION>_<FIELD>
#[derive(Default)]
pub struct EnvSource {
	vars: Option<HashMap<String, String>>,
}

impl EnvSource {
	/// Read from the process environment.
	pub fn new() -> Self {
		Self::default()
	}

	/// Read from a fixed set of variables instead of the process environment.
	pub fn from_vars<K, V>(vars: impl IntoIterator<Item = (K, V)>) -> Self
	where
		K: Into<String>,
		V: Into<String>,
	{
		Self {
			vars: Some(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect()),
		}
	}

	fn var(&self, name: &str) -> Option<String> {
		let value = match &self.vars {
			Some(vars) => vars.get(name).cloned(),
			None => std::env::var(name).ok(),
		};
		value.filter(|s| !s.is_empty())
	}

	fn var_u64(&self, name: &str) -> Result<Option<u64>, ConfigError> {
		match self.var(name) {
			Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
				key: name.to_string(),
				message: format!("invalid u64 value '{v}'"),
			}),
			None => Ok(None),
		}
	}

	fn var_u32(&self, name: &str) -> Result<Option<u32>, ConfigError> {
		match self.var(name) {
			Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
				key: name.to_string(),
				message: format!("invalid u32 value '{v}'"),
			}),
			None => Ok(None),
		}
	}

	fn provider(&self) -> Result<ProviderConfigLayer, ConfigError> {
		Ok(ProviderConfigLayer {
			instance_id: self.var("RDS_ACCESS_PROVIDER_INSTANCE_ID"),
			identity_store_id: self.var("RDS_ACCESS_PROVIDER_IDENTITY_STORE_ID"),
			target_account_id: self.var("RDS_ACCESS_PROVIDER_TARGET_ACCOUNT_ID"),
			database_region: self.var("RDS_ACCESS_PROVIDER_DATABASE_REGION"),
			parameter_prefix: self.var("RDS_ACCESS_PROVIDER_PARAMETER_PREFIX"),
			artifact_name_prefix: self.var("RDS_ACCESS_PROVIDER_ARTIFACT_NAME_PREFIX"),
			callback_delay_secs: self.var_u64("RDS_ACCESS_PROVIDER_CALLBACK_DELAY_SECS")?,
		})
	}

	fn logging(&self) -> Result<LoggingConfigLayer, ConfigError> {
		let format = match self.var("RDS_ACCESS_LOGGING_FORMAT") {
			Some(v) => Some(v.parse::<LogFormat>().map_err(|message| ConfigError::InvalidValue {
				key: "RDS_ACCESS_LOGGING_FORMAT".to_string(),
				message,
			})?),
			None => None,
		};

		Ok(LoggingConfigLayer {
			level: self.var("RDS_ACCESS_LOGGING_LEVEL"),
			format,
		})
	}

	fn sandbox(&self) -> Result<SandboxConfigLayer, ConfigError> {
		Ok(SandboxConfigLayer {
			state_path: self.var("RDS_ACCESS_SANDBOX_STATE_PATH").map(PathBuf::from),
			polls_until_settled: self.var_u32("RDS_ACCESS_SANDBOX_POLLS_UNTIL_SETTLED")?,
		})
	}
}

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<RdsAccessConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(RdsAccessConfigLayer {
			provider: Some(self.provider()?),
			logging: Some(self.logging()?),
			sandbox: Some(self.sandbox()?),
		})
	}
}
