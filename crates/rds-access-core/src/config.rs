// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Provider configuration injected into the orchestrators at construction.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{Result, StepError};

pub const DEFAULT_PARAMETER_PREFIX: &str = "/awx/rds/accessprovider";
pub const DEFAULT_ARTIFACT_NAME_PREFIX: &str = "DB_Access_For_";
pub const DEFAULT_CALLBACK_DELAY_SECS: u64 = 2;

/// Upstream limit on permission set names.
const MAX_ARTIFACT_NAME_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderConfigError {
	#[error("missing required provider setting: {0}")]
	Missing(&'static str),

	#[error("invalid provider setting {field}: {message}")]
	Invalid {
		field: &'static str,
		message: String,
	},
}

/// Identifiers and naming conventions for one deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
	/// Authorization service instance that owns the artifacts.
	pub instance_id: String,
	pub identity_store_id: String,
	/// Account the assignments target and the databases live in.
	pub target_account_id: String,
	pub database_region: String,
	/// Config store key prefix for grant records.
	pub parameter_prefix: String,
	pub artifact_name_prefix: String,
	/// Re-invocation delay suggested to the caller while polling.
	pub callback_delay_secs: u64,
}

impl Default for ProviderConfig {
	fn default() -> Self {
		Self {
			instance_id: String::new(),
			identity_store_id: String::new(),
			target_account_id: String::new(),
			database_region: String::new(),
			parameter_prefix: DEFAULT_PARAMETER_PREFIX.to_string(),
			artifact_name_prefix: DEFAULT_ARTIFACT_NAME_PREFIX.to_string(),
			callback_delay_secs: DEFAULT_CALLBACK_DELAY_SECS,
		}
	}
}

impl ProviderConfig {
	pub fn validate(&self) -> std::result::Result<(), ProviderConfigError> {
		let required = [
			("instance_id", &self.instance_id),
			("identity_store_id", &self.identity_store_id),
			("target_account_id", &self.target_account_id),
			("database_region", &self.database_region),
			("artifact_name_prefix", &self.artifact_name_prefix),
		];
		for (field, value) in required {
			if value.trim().is_empty() {
				return Err(ProviderConfigError::Missing(field));
			}
		}

		if !self.parameter_prefix.starts_with('/') {
			return Err(ProviderConfigError::Invalid {
				field: "parameter_prefix",
				message: format!("must start with '/', got {:?}", self.parameter_prefix),
			});
		}
		if self.parameter_prefix.len() > 1 && self.parameter_prefix.ends_with('/') {
			return Err(ProviderConfigError::Invalid {
				field: "parameter_prefix",
				message: "must not end with '/'".to_string(),
			});
		}
		if !self.target_account_id.chars().all(|c| c.is_ascii_digit()) {
			return Err(ProviderConfigError::Invalid {
				field: "target_account_id",
				message: format!("must be numeric, got {:?}", self.target_account_id),
			});
		}
		if self.artifact_name_prefix.len() >= MAX_ARTIFACT_NAME_LEN {
			return Err(ProviderConfigError::Invalid {
				field: "artifact_name_prefix",
				message: format!(
					"must leave room for a subject within {MAX_ARTIFACT_NAME_LEN} characters"
				),
			});
		}
		Ok(())
	}

	/// Name of the artifact created for `subject`.
	pub fn artifact_name(&self, subject: &str) -> Result<String> {
		let name = format!("{}{}", self.artifact_name_prefix, subject);
		if name.len() > MAX_ARTIFACT_NAME_LEN {
			return Err(StepError::InvalidSubject {
				subject: subject.to_string(),
				reason: format!(
					"artifact name {name:?} exceeds {MAX_ARTIFACT_NAME_LEN} characters"
				),
			});
		}
		Ok(name)
	}

	/// Database user resource the scope document grants `connect` on.
	pub fn db_user_resource(&self, subject: &str) -> String {
		format!(
			"arn:aws:rds-db:{}:{}:dbuser:*/{}",
			self.database_region, self.target_account_id, subject
		)
	}
}
