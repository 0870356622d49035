// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Top-level configuration layer.

use serde::Deserialize;

use crate::sections::{LoggingConfigLayer, ProviderConfigLayer, SandboxConfigLayer};

/// One source's view of the configuration. Unset sections and fields defer
/// to lower-precedence sources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RdsAccessConfigLayer {
	#[serde(default)]
	pub provider: Option<ProviderConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
	#[serde(default)]
	pub sandbox: Option<SandboxConfigLayer>,
}

impl RdsAccessConfigLayer {
	/// Merge `other` on top of `self`; fields set in `other` win.
	pub fn merge(&mut self, other: RdsAccessConfigLayer) {
		merge_section(&mut self.provider, other.provider, ProviderConfigLayer::merge);
		merge_section(&mut self.logging, other.logging, LoggingConfigLayer::merge);
		merge_section(&mut self.sandbox, other.sandbox, SandboxConfigLayer::merge);
	}
}

fn merge_section<T>(base: &mut Option<T>, other: Option<T>, merge: fn(&mut T, T)) {
	let Some(other) = other else {
		return;
	};
	match base {
		Some(existing) => merge(existing, other),
		None => *base = Some(other),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	fn logging(level: Option<String>) -> Option<LoggingConfigLayer> {
		Some(LoggingConfigLayer {
			level,
			format: None,
		})
	}

	#[test]
	fn test_merge_fills_missing_sections() {
		let mut base = RdsAccessConfigLayer::default();
		base.merge(RdsAccessConfigLayer {
			logging: logging(Some("debug".to_string())),
			..Default::default()
		});
		assert_eq!(base.logging.unwrap().level.as_deref(), Some("debug"));
		assert!(base.provider.is_none());
	}

	#[test]
	fn test_parses_toml_sections() {
		let layer: RdsAccessConfigLayer = toml::from_str(
			r#"
			[provider]
			instance_id = "arn:aws:sso:::instance/ssoins-test"
			callback_delay_secs = 4

			[logging]
			format = "json"
			"#,
		)
		.unwrap();

		let provider = layer.provider.unwrap();
		assert_eq!(provider.callback_delay_secs, Some(4));
		assert!(provider.database_region.is_none());
		assert_eq!(
			layer.logging.unwrap().format,
			Some(crate::sections::LogFormat::Json)
		);
		assert!(layer.sandbox.is_none());
	}

	proptest! {
		#[test]
		fn merge_keeps_base_unless_overridden(
			base in proptest::option::of("[a-z]{1,8}"),
			over in proptest::option::of("[a-z]{1,8}"),
		) {
			let mut merged = RdsAccessConfigLayer {
				logging: logging(base.clone()),
				..Default::default()
			};
			merged.merge(RdsAccessConfigLayer {
				logging: logging(over.clone()),
				..Default::default()
			});

			let expected = over.or(base);
			prop_assert_eq!(merged.logging.unwrap().level, expected);
		}
	}
}
