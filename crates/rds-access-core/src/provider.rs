// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Entry point that routes a caller's request to the right orchestrator.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::adapter::Adapters;
use crate::config::ProviderConfig;
use crate::context::ContinuationContext;
use crate::error::{AdapterError, Result, StepError};
use crate::event::ProgressEvent;
use crate::grant::GrantOrchestrator;
use crate::model::{validate_subject, AccessGrant};
use crate::reconcile::Reconciler;
use crate::records::GrantRecordRepository;
use crate::revoke::RevokeOrchestrator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
	Create,
	Read,
	Delete,
}

impl fmt::Display for Action {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Create => write!(f, "CREATE"),
			Self::Read => write!(f, "READ"),
			Self::Delete => write!(f, "DELETE"),
		}
	}
}

/// One invocation from the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerRequest {
	pub action: Action,
	pub subject_id: String,
	/// Only consulted by READ. Prefer leaving this unset so the id comes from
	/// the persisted record.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub authorization_artifact_id: Option<String>,
	#[serde(default)]
	pub callback_context: ContinuationContext,
}

impl HandlerRequest {
	pub fn new(action: Action, subject_id: impl Into<String>) -> Self {
		Self {
			action,
			subject_id: subject_id.into(),
			authorization_artifact_id: None,
			callback_context: ContinuationContext::new(),
		}
	}

	pub fn with_context(mut self, context: ContinuationContext) -> Self {
		self.callback_context = context;
		self
	}

	pub fn with_artifact_id(mut self, artifact_id: impl Into<String>) -> Self {
		self.authorization_artifact_id = Some(artifact_id.into());
		self
	}
}

/// CREATE, READ and DELETE for subject database access.
#[derive(Clone)]
pub struct AccessProvider {
	grant: GrantOrchestrator,
	revoke: RevokeOrchestrator,
	records: GrantRecordRepository,
	reconciler: Reconciler,
}

impl AccessProvider {
	pub fn new(config: ProviderConfig, adapters: Adapters) -> Self {
		Self {
			records: GrantRecordRepository::new(
				adapters.store.clone(),
				config.parameter_prefix.clone(),
			),
			reconciler: Reconciler::new(adapters.authorization.clone()),
			grant: GrantOrchestrator::new(config.clone(), adapters.clone()),
			revoke: RevokeOrchestrator::new(config, adapters),
		}
	}

	#[instrument(skip_all, fields(action = %request.action, subject = %request.subject_id))]
	pub async fn handle(&self, request: &HandlerRequest) -> ProgressEvent {
		match request.action {
			Action::Create => {
				self.grant
					.advance_create(&request.subject_id, &request.callback_context)
					.await
			}
			Action::Delete => {
				self.revoke
					.advance_revoke(&request.subject_id, &request.callback_context)
					.await
			}
			Action::Read => self.read(request).await,
		}
	}

	async fn read(&self, request: &HandlerRequest) -> ProgressEvent {
		let mut grant = AccessGrant::new(&request.subject_id);
		match self.describe(&mut grant, request.authorization_artifact_id.as_deref()).await {
			Ok(()) => ProgressEvent::success(
				format!("Read RDS access for user {}", grant.subject_id),
				grant.resource_model(),
			),
			Err(err) => {
				warn!(error = %err, "read failed");
				ProgressEvent::failed(
					format!("Failed to read RDS access for user {}: {err}", grant.subject_id),
					grant.resource_model(),
					&err,
					ContinuationContext::new(),
				)
			}
		}
	}

	async fn describe(&self, grant: &mut AccessGrant, artifact_id: Option<&str>) -> Result<()> {
		validate_subject(&grant.subject_id)?;
		let artifact_id = match artifact_id {
			Some(id) => {
				warn!(artifact_id = id, "reading by caller-supplied artifact id is deprecated");
				grant.authorization_artifact_id = Some(id.to_string());
				id.to_string()
			}
			None => {
				let record = self.records.load(&grant.subject_id).await?;
				let id = record.authorization_artifact_id.clone();
				*grant = AccessGrant::from_record(grant.subject_id.clone(), record);
				id
			}
		};

		let reconciliation = self.reconciler.reconcile(&artifact_id).await?;
		if reconciliation.exists {
			Ok(())
		} else {
			Err(StepError::from(AdapterError::not_found("permission set", artifact_id)))
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn request_accepts_caller_json() {
		let request: HandlerRequest = serde_json::from_str(
			r#"{"action":"CREATE","subjectId":"alice",
				"callbackContext":{"assignmentRequestId":"req-1"}}"#,
		)
		.unwrap();
		assert_eq!(request.action, Action::Create);
		assert_eq!(request.callback_context.get_str("assignmentRequestId"), Some("req-1"));
		assert!(request.authorization_artifact_id.is_none());

		let first: HandlerRequest = serde_json::from_str(
			r#"{"action":"DELETE","subjectId":"alice","callbackContext":null}"#,
		)
		.unwrap();
		assert!(first.callback_context.is_empty());
	}

	#[test]
	fn builder_sets_optional_fields() {
		let request = HandlerRequest::new(Action::Read, "alice").with_artifact_id("ps-1");
		assert_eq!(request.authorization_artifact_id.as_deref(), Some("ps-1"));
		assert_eq!(request.action.to_string(), "READ");
	}
}
