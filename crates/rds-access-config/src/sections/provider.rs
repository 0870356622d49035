// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Provider identifiers and naming conventions.

use rds_access_core::ProviderConfig;
use serde::Deserialize;

use crate::error::ConfigError;

/// Provider configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProviderConfigLayer {
	#[serde(default)]
	pub instance_id: Option<String>,
	#[serde(default)]
	pub identity_store_id: Option<String>,
	#[serde(default)]
	pub target_account_id: Option<String>,
	#[serde(default)]
	pub database_region: Option<String>,
	#[serde(default)]
	pub parameter_prefix: Option<String>,
	#[serde(default)]
	pub artifact_name_prefix: Option<String>,
	#[serde(default)]
	pub callback_delay_secs: Option<u64>,
}

impl ProviderConfigLayer {
	pub fn merge(&mut self, other: ProviderConfigLayer) {
		if other.instance_id.is_some() {
			self.instance_id = other.instance_id;
		}
		if other.identity_store_id.is_some() {
			self.identity_store_id = other.identity_store_id;
		}
		if other.target_account_id.is_some() {
			self.target_account_id = other.target_account_id;
		}
		if other.database_region.is_some() {
			self.database_region = other.database_region;
		}
		if other.parameter_prefix.is_some() {
			self.parameter_prefix = other.parameter_prefix;
		}
		if other.artifact_name_prefix.is_some() {
			self.artifact_name_prefix = other.artifact_name_prefix;
		}
		if other.callback_delay_secs.is_some() {
			self.callback_delay_secs = other.callback_delay_secs;
		}
	}

	/// Resolve against [`ProviderConfig::default`] and validate.
	pub fn finalize(self) -> Result<ProviderConfig, ConfigError> {
		let defaults = ProviderConfig::default();
		let config = ProviderConfig {
			instance_id: self.instance_id.unwrap_or(defaults.instance_id),
			identity_store_id: self.identity_store_id.unwrap_or(defaults.identity_store_id),
			target_account_id: self.target_account_id.unwrap_or(defaults.target_account_id),
			database_region: self.database_region.unwrap_or(defaults.database_region),
			parameter_prefix: self.parameter_prefix.unwrap_or(defaults.parameter_prefix),
			artifact_name_prefix: self
				.artifact_name_prefix
				.unwrap_or(defaults.artifact_name_prefix),
			callback_delay_secs: self.callback_delay_secs.unwrap_or(defaults.callback_delay_secs),
		};
		config.validate()?;
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rds_access_core::ProviderConfigError;

	fn complete() -> ProviderConfigLayer {
		ProviderConfigLayer {
			instance_id: Some("arn:aws:sso:::instance/ssoins-7223b18c2c5ea126".to_string()),
			identity_store_id: Some("d-9667b0ca37".to_string()),
			target_account_id: Some("891376986941".to_string()),
			database_region: Some("ap-southeast-1".to_string()),
			..Default::default()
		}
	}

	#[test]
	fn test_defaults_fill_naming_fields() {
		let config = complete().finalize().unwrap();
		assert_eq!(config.parameter_prefix, "/awx/rds/accessprovider");
		assert_eq!(config.artifact_name_prefix, "DB_Access_For_");
		assert_eq!(config.callback_delay_secs, 2);
	}

	#[test]
	fn test_missing_identifier_is_rejected() {
		let layer = ProviderConfigLayer {
			identity_store_id: None,
			..complete()
		};
		let err = layer.finalize().unwrap_err();
		assert!(matches!(
			err,
			ConfigError::Provider(ProviderConfigError::Missing("identity_store_id"))
		));
	}

	#[test]
	fn test_merge_prefers_other() {
		let mut base = complete();
		base.merge(ProviderConfigLayer {
			callback_delay_secs: Some(5),
			..Default::default()
		});
		assert_eq!(base.callback_delay_secs, Some(5));
		assert_eq!(base.database_region.as_deref(), Some("ap-southeast-1"));
	}
}
