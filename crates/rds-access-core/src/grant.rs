// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Resumable CREATE: artifact, scope, principal, assignment, record.
//!
//! Each call to [`GrantOrchestrator::advance_create`] performs the work of one
//! step and returns. Progress lives entirely in the continuation context:
//!
//! ```text
//! Init ──create/attach/resolve/assign──▶ Polling ──SUCCEEDED──▶ Persist ──▶ Done
//!                                          │  ▲
//!                                          └──┘ pending
//! ```
//!
//! Anything that fails in `Init` after the artifact exists deletes the
//! artifact before reporting. An assignment that settles as failed is rolled
//! back the same way.

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

use crate::adapter::Adapters;
use crate::config::ProviderConfig;
use crate::context::ContinuationContext;
use crate::error::{AdapterError, Result, StepError};
use crate::event::ProgressEvent;
use crate::model::{
	validate_subject, AccessGrant, AssignmentOperation, AssignmentRequest, AssignmentStatus,
};
use crate::policy::ScopeDocument;
use crate::records::GrantRecordRepository;

/// Typed view of a CREATE continuation context.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct GrantCheckpoint {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	assignment_request_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	assignment_status: Option<AssignmentStatus>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	authorization_artifact_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	principal_id: Option<String>,
}

#[derive(Debug)]
enum CreateStep {
	Init,
	Polling {
		request_id: String,
	},
	Persist {
		request_id: Option<String>,
		artifact_id: String,
		principal_id: String,
	},
}

impl CreateStep {
	fn name(&self) -> &'static str {
		match self {
			Self::Init => "Init",
			Self::Polling { .. } => "Polling",
			Self::Persist { .. } => "Persist",
		}
	}

	fn from_checkpoint(checkpoint: GrantCheckpoint) -> Result<Self> {
		match checkpoint {
			GrantCheckpoint {
				assignment_request_id: None,
				assignment_status: None,
				authorization_artifact_id: None,
				principal_id: None,
			} => Ok(Self::Init),
			GrantCheckpoint {
				assignment_request_id,
				assignment_status: Some(AssignmentStatus::Succeeded),
				authorization_artifact_id: Some(artifact_id),
				principal_id: Some(principal_id),
			} => Ok(Self::Persist {
				request_id: assignment_request_id,
				artifact_id,
				principal_id,
			}),
			GrantCheckpoint {
				assignment_request_id: Some(request_id),
				assignment_status: None | Some(AssignmentStatus::Pending),
				..
			} => Ok(Self::Polling { request_id }),
			other => Err(StepError::InvalidContext(format!(
				"unrecognized create progress: {other:?}"
			))),
		}
	}
}

/// Drives CREATE for one subject at a time.
#[derive(Clone)]
pub struct GrantOrchestrator {
	config: ProviderConfig,
	adapters: Adapters,
	records: GrantRecordRepository,
}

impl GrantOrchestrator {
	pub fn new(config: ProviderConfig, adapters: Adapters) -> Self {
		let records =
			GrantRecordRepository::new(adapters.store.clone(), config.parameter_prefix.clone());
		Self {
			config,
			adapters,
			records,
		}
	}

	/// Perform the next CREATE step for `subject`.
	///
	/// An empty `context` starts a new grant. Every failure is reported as a
	/// `FAILED` event; a retryable one carries the context to retry with.
	#[instrument(skip_all, fields(subject = %subject))]
	pub async fn advance_create(
		&self,
		subject: &str,
		context: &ContinuationContext,
	) -> ProgressEvent {
		let mut grant = AccessGrant::new(subject);
		match self.step(&mut grant, context).await {
			Ok(event) => event,
			Err(err) => self.fail(&grant, err, context.clone()),
		}
	}

	async fn step(
		&self,
		grant: &mut AccessGrant,
		context: &ContinuationContext,
	) -> Result<ProgressEvent> {
		validate_subject(&grant.subject_id)?;
		let step = CreateStep::from_checkpoint(context.decode()?)?;
		debug!(step = step.name(), "resuming create");

		match step {
			CreateStep::Init => self.begin(grant).await,
			CreateStep::Polling { request_id } => self.poll(grant, &request_id, context).await,
			CreateStep::Persist {
				request_id,
				artifact_id,
				principal_id,
			} => {
				grant.assignment_request_id = request_id;
				grant.assignment_status = Some(AssignmentStatus::Succeeded);
				grant.authorization_artifact_id = Some(artifact_id);
				grant.principal_id = Some(principal_id);
				Ok(self.persist(grant).await)
			}
		}
	}

	async fn begin(&self, grant: &mut AccessGrant) -> Result<ProgressEvent> {
		let name = self.config.artifact_name(&grant.subject_id)?;
		let artifact_id = self.adapters.authorization.create_artifact(&name).await?;
		info!(artifact_id = %artifact_id, name = %name, "created authorization artifact");
		grant.authorization_artifact_id = Some(artifact_id.clone());

		let operation = match self.bind(grant, &artifact_id).await {
			Ok(operation) => operation,
			Err(cause) => return Err(self.roll_back(grant, &artifact_id, cause).await),
		};
		grant.observe(&operation);
		info!(
			from = "Init",
			to = "Polling",
			request_id = %operation.request_id,
			"state transition"
		);

		let context = ContinuationContext::encode(&GrantCheckpoint {
			assignment_request_id: Some(operation.request_id),
			..Default::default()
		})?;
		Ok(self.in_progress(grant, context))
	}

	/// Attach the scope, resolve the principal and request the assignment.
	async fn bind(
		&self,
		grant: &mut AccessGrant,
		artifact_id: &str,
	) -> Result<AssignmentOperation> {
		let subject = grant.subject_id.clone();
		let scope = ScopeDocument::for_subject(&self.config, &subject);
		self.adapters.authorization.attach_scope(artifact_id, &scope).await?;

		let principal_id = match self.adapters.directory.resolve_principal(&subject).await {
			Ok(id) => id,
			Err(AdapterError::NotFound { .. }) => {
				return Err(StepError::PrincipalNotFound { subject });
			}
			Err(e) => return Err(e.into()),
		};
		grant.principal_id = Some(principal_id.clone());

		let request = AssignmentRequest {
			artifact_id: artifact_id.to_string(),
			principal_id,
			target_account_id: self.config.target_account_id.clone(),
		};
		Ok(self.adapters.authorization.request_assignment(&request).await?)
	}

	async fn poll(
		&self,
		grant: &mut AccessGrant,
		request_id: &str,
		context: &ContinuationContext,
	) -> Result<ProgressEvent> {
		let operation = self.adapters.authorization.poll_assignment_status(request_id).await?;
		grant.observe(&operation);

		match operation.status {
			AssignmentStatus::Pending => {
				debug!(request_id, "assignment still pending");
				Ok(self.in_progress(grant, context.clone()))
			}
			AssignmentStatus::Failed => {
				info!(from = "Polling", to = "Failed", request_id, "state transition");
				let cause = StepError::AssignmentFailed {
					request_id: request_id.to_string(),
					reason: operation
						.failure_reason
						.unwrap_or_else(|| "no reason reported".to_string()),
				};
				Err(self.roll_back(grant, &operation.artifact_id, cause).await)
			}
			AssignmentStatus::Succeeded => {
				info!(from = "Polling", to = "Persist", request_id, "state transition");
				Ok(self.persist(grant).await)
			}
		}
	}

	async fn persist(&self, grant: &AccessGrant) -> ProgressEvent {
		let Some(record) = grant.record() else {
			let err = StepError::InvalidContext(
				"assignment succeeded without artifact and principal ids".to_string(),
			);
			return self.fail(grant, err, ContinuationContext::new());
		};

		match self.records.save(&grant.subject_id, &record).await {
			Ok(()) => {
				info!(from = "Persist", to = "Done", "state transition");
				ProgressEvent::success(
					format!("Created RDS access for user {}", grant.subject_id),
					grant.resource_model(),
				)
			}
			Err(err) => {
				let (err, resume) = ContinuationContext::resume_point(
					err,
					&GrantCheckpoint {
						assignment_request_id: grant.assignment_request_id.clone(),
						assignment_status: Some(AssignmentStatus::Succeeded),
						authorization_artifact_id: Some(record.authorization_artifact_id),
						principal_id: Some(record.principal_id),
					},
				);
				self.fail(grant, err, resume)
			}
		}
	}

	/// Delete an artifact this CREATE made, then hand back the triggering
	/// failure. A failed delete is escalated to `RollbackFailed`.
	async fn roll_back(
		&self,
		grant: &mut AccessGrant,
		artifact_id: &str,
		cause: StepError,
	) -> StepError {
		warn!(artifact_id, error = %cause, "rolling back authorization artifact");
		match self.adapters.authorization.delete_artifact(artifact_id).await {
			Ok(()) | Err(AdapterError::NotFound { .. }) => {
				grant.authorization_artifact_id = None;
				cause
			}
			Err(rollback) => {
				error!(artifact_id, error = %rollback, "rollback failed, artifact left behind");
				StepError::RollbackFailed {
					cause: Box::new(cause),
					artifact_id: artifact_id.to_string(),
					rollback,
				}
			}
		}
	}

	fn in_progress(&self, grant: &AccessGrant, context: ContinuationContext) -> ProgressEvent {
		ProgressEvent::in_progress(
			format!("Creating RDS access for user {}", grant.subject_id),
			grant.resource_model(),
			context,
			self.config.callback_delay_secs,
		)
	}

	fn fail(
		&self,
		grant: &AccessGrant,
		err: StepError,
		resume: ContinuationContext,
	) -> ProgressEvent {
		let resume = if err.is_retryable() {
			resume
		} else {
			ContinuationContext::new()
		};
		warn!(error = %err, retryable = err.is_retryable(), "create failed");
		ProgressEvent::failed(
			format!("Failed to create RDS access for user {}: {err}", grant.subject_id),
			grant.resource_model(),
			&err,
			resume,
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn decode(raw: &str) -> Result<CreateStep> {
		let context = ContinuationContext::from_json_str(raw)?;
		CreateStep::from_checkpoint(context.decode()?)
	}

	#[test]
	fn empty_context_is_init() {
		assert!(matches!(decode("").unwrap(), CreateStep::Init));
		assert!(matches!(decode("{}").unwrap(), CreateStep::Init));
	}

	#[test]
	fn request_id_alone_is_polling() {
		let step = decode(r#"{"assignmentRequestId":"req-1"}"#).unwrap();
		assert!(matches!(step, CreateStep::Polling { request_id } if request_id == "req-1"));
	}

	#[test]
	fn succeeded_status_with_ids_is_persist() {
		let step = decode(
			r#"{"assignmentRequestId":"req-1","assignmentStatus":"SUCCEEDED",
			"authorizationArtifactId":"ps-1","principalId":"user-1"}"#,
		)
		.unwrap();
		assert_eq!(step.name(), "Persist");
	}

	#[test]
	fn foreign_or_partial_contexts_are_rejected() {
		for raw in [
			r#"{"deassignmentRequestId":"req-1"}"#,
			r#"{"assignmentStatus":"SUCCEEDED"}"#,
			r#"{"assignmentRequestId":"req-1","assignmentStatus":"FAILED"}"#,
		] {
			let err = decode(raw).unwrap_err();
			assert!(matches!(err, StepError::InvalidContext(_)), "{raw}");
		}
	}
}
