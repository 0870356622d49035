// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Grant data model shared by the orchestrators and adapters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StepError};

const MAX_SUBJECT_LEN: usize = 64;

/// Status of an asynchronous assignment or deassignment, owned by the
/// authorization service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignmentStatus {
	#[serde(rename = "IN_PROGRESS", alias = "PENDING")]
	Pending,
	#[serde(rename = "SUCCEEDED")]
	Succeeded,
	#[serde(rename = "FAILED")]
	Failed,
}

impl AssignmentStatus {
	pub fn is_terminal(&self) -> bool {
		!matches!(self, Self::Pending)
	}
}

impl std::fmt::Display for AssignmentStatus {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Pending => write!(f, "pending"),
			Self::Succeeded => write!(f, "succeeded"),
			Self::Failed => write!(f, "failed"),
		}
	}
}

/// Binding of a principal to an artifact against a target account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentRequest {
	pub artifact_id: String,
	pub principal_id: String,
	pub target_account_id: String,
}

/// Snapshot of an in-flight or settled assignment/deassignment operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentOperation {
	pub request_id: String,
	pub status: AssignmentStatus,
	pub artifact_id: String,
	pub principal_id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub failure_reason: Option<String>,
}

/// Upstream view of an authorization artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactDescription {
	pub artifact_id: String,
	pub name: String,
	pub created_at: DateTime<Utc>,
}

/// Public attributes of a grant, surfaced to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceModel {
	pub subject_id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub authorization_artifact_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub principal_id: Option<String>,
}

impl ResourceModel {
	pub fn new(subject_id: impl Into<String>) -> Self {
		Self {
			subject_id: subject_id.into(),
			authorization_artifact_id: None,
			principal_id: None,
		}
	}
}

/// The resource being managed: one subject's access to the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessGrant {
	pub subject_id: String,
	pub authorization_artifact_id: Option<String>,
	pub principal_id: Option<String>,
	pub assignment_status: Option<AssignmentStatus>,
	pub assignment_request_id: Option<String>,
}

impl AccessGrant {
	pub fn new(subject_id: impl Into<String>) -> Self {
		Self {
			subject_id: subject_id.into(),
			authorization_artifact_id: None,
			principal_id: None,
			assignment_status: None,
			assignment_request_id: None,
		}
	}

	/// A grant whose CREATE has completed, as recorded in the config store.
	pub fn from_record(subject_id: impl Into<String>, record: PersistedGrantRecord) -> Self {
		Self {
			subject_id: subject_id.into(),
			authorization_artifact_id: Some(record.authorization_artifact_id),
			principal_id: Some(record.principal_id),
			assignment_status: Some(AssignmentStatus::Succeeded),
			assignment_request_id: None,
		}
	}

	/// Fold a polled operation into the grant.
	pub fn observe(&mut self, operation: &AssignmentOperation) {
		self.assignment_request_id = Some(operation.request_id.clone());
		self.assignment_status = Some(operation.status);
		self.authorization_artifact_id = Some(operation.artifact_id.clone());
		self.principal_id = Some(operation.principal_id.clone());
	}

	/// The record to persist, once both ids are known.
	pub fn record(&self) -> Option<PersistedGrantRecord> {
		Some(PersistedGrantRecord {
			authorization_artifact_id: self.authorization_artifact_id.clone()?,
			principal_id: self.principal_id.clone()?,
		})
	}

	pub fn resource_model(&self) -> ResourceModel {
		ResourceModel {
			subject_id: self.subject_id.clone(),
			authorization_artifact_id: self.authorization_artifact_id.clone(),
			principal_id: self.principal_id.clone(),
		}
	}
}

/// Durable record of a completed grant, keyed by subject in the config store.
///
/// Older records were written with `PermissionSetArn`/`UserId` keys; both
/// spellings are accepted on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedGrantRecord {
	#[serde(alias = "PermissionSetArn")]
	pub authorization_artifact_id: String,
	#[serde(alias = "UserId")]
	pub principal_id: String,
}

/// Check that a subject can be embedded in artifact names, record keys and
/// scope documents.
pub fn validate_subject(subject: &str) -> Result<()> {
	let invalid = |reason: &str| StepError::InvalidSubject {
		subject: subject.to_string(),
		reason: reason.to_string(),
	};

	if subject.is_empty() {
		return Err(invalid("subject must not be empty"));
	}
	if subject.len() > MAX_SUBJECT_LEN {
		return Err(invalid("subject must be at most 64 characters"));
	}
	if let Some(c) = subject
		.chars()
		.find(|c| !(c.is_ascii_alphanumeric() || "+=,.@_-".contains(*c)))
	{
		return Err(invalid(&format!("character {c:?} is not allowed")));
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn record_reads_legacy_keys() {
		let legacy = r#"{"PermissionSetArn":"arn:ps-1","UserId":"user-1"}"#;
		let record: PersistedGrantRecord = serde_json::from_str(legacy).unwrap();
		assert_eq!(record.authorization_artifact_id, "arn:ps-1");
		assert_eq!(record.principal_id, "user-1");

		let written = serde_json::to_value(&record).unwrap();
		assert_eq!(written["authorizationArtifactId"], "arn:ps-1");
		assert_eq!(written["principalId"], "user-1");
	}

	#[test]
	fn assignment_status_uses_upstream_vocabulary() {
		assert_eq!(
			serde_json::to_string(&AssignmentStatus::Pending).unwrap(),
			r#""IN_PROGRESS""#
		);
		let status: AssignmentStatus = serde_json::from_str(r#""PENDING""#).unwrap();
		assert_eq!(status, AssignmentStatus::Pending);
		assert!(!status.is_terminal());
		assert!(AssignmentStatus::Failed.is_terminal());
	}

	#[test]
	fn grant_record_requires_both_ids() {
		let mut grant = AccessGrant::new("alice");
		assert!(grant.record().is_none());

		grant.observe(&AssignmentOperation {
			request_id: "req-1".to_string(),
			status: AssignmentStatus::Succeeded,
			artifact_id: "ps-1".to_string(),
			principal_id: "user-1".to_string(),
			failure_reason: None,
		});
		let record = grant.record().unwrap();
		assert_eq!(record.authorization_artifact_id, "ps-1");
		assert_eq!(grant.resource_model().principal_id.as_deref(), Some("user-1"));
	}

	#[test]
	fn rejects_empty_and_path_like_subjects() {
		assert!(validate_subject("").is_err());
		assert!(validate_subject("../alice").is_err());
		assert!(validate_subject("alice bob").is_err());
		assert!(validate_subject(&"a".repeat(65)).is_err());
		assert!(validate_subject("alice.smith@example.com").is_ok());
	}

	proptest! {
		#[test]
		fn accepts_every_subject_in_the_allowed_alphabet(subject in "[A-Za-z0-9+=,.@_-]{1,64}") {
			prop_assert!(validate_subject(&subject).is_ok());
		}

		#[test]
		fn rejects_any_slash(prefix in "[a-z]{0,8}", suffix in "[a-z]{0,8}") {
			let subject = format!("{prefix}/{suffix}");
			prop_assert!(validate_subject(&subject).is_err());
		}
	}
}
