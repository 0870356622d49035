// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! File-backed sandbox used by the CLI in place of the upstream services.

use std::path::PathBuf;

use serde::Deserialize;

pub const DEFAULT_STATE_PATH: &str = "rds-access-sandbox.json";
pub const DEFAULT_POLLS_UNTIL_SETTLED: u32 = 2;

/// Sandbox configuration (runtime, fully resolved).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxConfig {
	pub state_path: PathBuf,
	/// Polls before a pending assignment settles. Zero leaves operations
	/// pending until settled by hand.
	pub polls_until_settled: u32,
}

impl Default for SandboxConfig {
	fn default() -> Self {
		Self {
			state_path: PathBuf::from(DEFAULT_STATE_PATH),
			polls_until_settled: DEFAULT_POLLS_UNTIL_SETTLED,
		}
	}
}

/// Sandbox configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SandboxConfigLayer {
	#[serde(default)]
	pub state_path: Option<PathBuf>,
	#[serde(default)]
	pub polls_until_settled: Option<u32>,
}

impl SandboxConfigLayer {
	pub fn merge(&mut self, other: SandboxConfigLayer) {
		if other.state_path.is_some() {
			self.state_path = other.state_path;
		}
		if other.polls_until_settled.is_some() {
			self.polls_until_settled = other.polls_until_settled;
		}
	}

	pub fn finalize(self) -> SandboxConfig {
		let defaults = SandboxConfig::default();
		SandboxConfig {
			state_path: self.state_path.unwrap_or(defaults.state_path),
			polls_until_settled: self.polls_until_settled.unwrap_or(defaults.polls_until_settled),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_sandbox() {
		let config = SandboxConfigLayer::default().finalize();
		assert_eq!(config.state_path, PathBuf::from("rds-access-sandbox.json"));
		assert_eq!(config.polls_until_settled, 2);
	}

	#[test]
	fn test_custom_state_path() {
		let layer = SandboxConfigLayer {
			state_path: Some(PathBuf::from("/tmp/sandbox.json")),
			polls_until_settled: Some(0),
		};
		let config = layer.finalize();
		assert_eq!(config.state_path, PathBuf::from("/tmp/sandbox.json"));
		assert_eq!(config.polls_until_settled, 0);
	}
}
