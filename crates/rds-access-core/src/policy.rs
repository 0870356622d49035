// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Scope document attached to a subject's authorization artifact.

use serde::{Deserialize, Serialize};

use crate::config::ProviderConfig;

const POLICY_VERSION: &str = "2012-10-17";
const CONNECT_ACTION: &str = "rds-db:connect";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScopeDocument {
	pub version: String,
	pub statement: Vec<ScopeStatement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScopeStatement {
	pub effect: String,
	pub action: Vec<String>,
	pub resource: Vec<String>,
}

impl ScopeDocument {
	/// Allow `subject` to connect as the database user of the same name, on any
	/// instance in the configured account and region.
	pub fn for_subject(config: &ProviderConfig, subject: &str) -> Self {
		Self {
			version: POLICY_VERSION.to_string(),
			statement: vec![ScopeStatement {
				effect: "Allow".to_string(),
				action: vec![CONNECT_ACTION.to_string()],
				resource: vec![config.db_user_resource(subject)],
			}],
		}
	}

	pub fn to_json(&self) -> String {
		serde_json::to_value(self)
			.map(|v| v.to_string())
			.unwrap_or_default()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn scope_grants_connect_on_subject_db_user() {
		let config = ProviderConfig {
			target_account_id: "891376986941".to_string(),
			database_region: "ap-southeast-1".to_string(),
			..Default::default()
		};
		let doc = ScopeDocument::for_subject(&config, "alice");

		let json: serde_json::Value = serde_json::from_str(&doc.to_json()).unwrap();
		assert_eq!(json["Version"], "2012-10-17");
		assert_eq!(json["Statement"][0]["Effect"], "Allow");
		assert_eq!(json["Statement"][0]["Action"][0], "rds-db:connect");
		assert_eq!(
			json["Statement"][0]["Resource"][0],
			"arn:aws:rds-db:ap-southeast-1:891376986941:dbuser:*/alice"
		);
	}
}
