// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! File-backed stand-in for the three upstream services.
//!
//! The whole sandbox is one JSON document. It is loaded before an invocation
//! and written back afterwards, so consecutive CLI runs observe each other's
//! side effects the way consecutive invocations observe the real services.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use rds_access_config::SandboxConfig;
use rds_access_core::memory::{AuthorizationState, DirectoryState};
use rds_access_core::{
	Adapters, InMemoryAuthorizationService, InMemoryConfigStore, InMemoryIdentityDirectory,
	ProviderConfig,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SandboxState {
	pub authorization: AuthorizationState,
	pub directory: DirectoryState,
	#[serde(default)]
	pub parameters: BTreeMap<String, String>,
}

pub struct Sandbox {
	path: PathBuf,
	pub authorization: InMemoryAuthorizationService,
	pub directory: InMemoryIdentityDirectory,
	pub store: InMemoryConfigStore,
}

impl Sandbox {
	/// Load the sandbox at `config.state_path`, or start an empty one for the
	/// configured instance and identity store.
	pub fn open(config: &SandboxConfig, provider: &ProviderConfig) -> anyhow::Result<Self> {
		let mut state = if config.state_path.exists() {
			let raw = std::fs::read_to_string(&config.state_path)
				.with_context(|| format!("reading sandbox {}", config.state_path.display()))?;
			serde_json::from_str::<SandboxState>(&raw)
				.with_context(|| format!("parsing sandbox {}", config.state_path.display()))?
		} else {
			debug!(path = %config.state_path.display(), "starting empty sandbox");
			SandboxState {
				authorization: AuthorizationState {
					instance_id: provider.instance_id.clone(),
					..Default::default()
				},
				directory: DirectoryState {
					identity_store_id: provider.identity_store_id.clone(),
					..Default::default()
				},
				parameters: BTreeMap::new(),
			}
		};
		state.authorization.polls_until_settled =
			(config.polls_until_settled > 0).then_some(config.polls_until_settled);

		Ok(Self {
			path: config.state_path.clone(),
			authorization: InMemoryAuthorizationService::from_state(state.authorization),
			directory: InMemoryIdentityDirectory::from_state(state.directory),
			store: InMemoryConfigStore::from_values(state.parameters),
		})
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn adapters(&self) -> Adapters {
		Adapters::new(
			Arc::new(self.authorization.clone()),
			Arc::new(self.directory.clone()),
			Arc::new(self.store.clone()),
		)
	}

	pub fn snapshot(&self) -> SandboxState {
		SandboxState {
			authorization: self.authorization.snapshot(),
			directory: self.directory.snapshot(),
			parameters: self.store.snapshot(),
		}
	}

	/// Write the current state back, replacing the file in one rename.
	pub fn save(&self) -> anyhow::Result<()> {
		if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
			std::fs::create_dir_all(parent)
				.with_context(|| format!("creating {}", parent.display()))?;
		}

		let json = serde_json::to_string_pretty(&self.snapshot())?;
		let tmp = self.path.with_extension("json.tmp");
		std::fs::write(&tmp, json).with_context(|| format!("writing {}", tmp.display()))?;
		std::fs::rename(&tmp, &self.path)
			.with_context(|| format!("replacing {}", self.path.display()))?;
		debug!(path = %self.path.display(), "saved sandbox");
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn provider() -> ProviderConfig {
		ProviderConfig {
			instance_id: "arn:aws:sso:::instance/ssoins-test".to_string(),
			identity_store_id: "d-test".to_string(),
			target_account_id: "123456789012".to_string(),
			database_region: "ap-southeast-1".to_string(),
			..Default::default()
		}
	}

	#[test]
	fn fresh_sandbox_uses_provider_identifiers() {
		let dir = tempfile::tempdir().unwrap();
		let config = SandboxConfig {
			state_path: dir.path().join("state.json"),
			polls_until_settled: 0,
		};

		let sandbox = Sandbox::open(&config, &provider()).unwrap();
		let state = sandbox.snapshot();
		assert_eq!(state.authorization.instance_id, "arn:aws:sso:::instance/ssoins-test");
		assert_eq!(state.directory.identity_store_id, "d-test");
		assert_eq!(state.authorization.polls_until_settled, None);
	}

	#[test]
	fn state_survives_save_and_reopen() {
		let dir = tempfile::tempdir().unwrap();
		let config = SandboxConfig {
			state_path: dir.path().join("nested").join("state.json"),
			polls_until_settled: 3,
		};

		let sandbox = Sandbox::open(&config, &provider()).unwrap();
		sandbox.directory.add_user("alice", "user-alice");
		sandbox.store.insert("/awx/rds/accessprovider/alice", "{}");
		sandbox.save().unwrap();

		let reopened = Sandbox::open(&config, &provider()).unwrap();
		let state = reopened.snapshot();
		assert_eq!(state.directory.users.get("alice").map(String::as_str), Some("user-alice"));
		assert!(state.parameters.contains_key("/awx/rds/accessprovider/alice"));
		assert_eq!(state.authorization.polls_until_settled, Some(3));
		assert!(!config.state_path.with_extension("json.tmp").exists());
	}

	#[test]
	fn corrupt_state_file_is_an_error() {
		let dir = tempfile::tempdir().unwrap();
		let config = SandboxConfig {
			state_path: dir.path().join("state.json"),
			polls_until_settled: 1,
		};
		std::fs::write(&config.state_path, "not json").unwrap();

		let err = Sandbox::open(&config, &provider()).err().unwrap();
		assert!(err.to_string().contains("parsing sandbox"));
	}
}
