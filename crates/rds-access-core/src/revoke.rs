// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Resumable DELETE: record lookup, deassignment, artifact and record cleanup.
//!
//! The artifact is only deleted once the deassignment has been confirmed, so
//! no account assignment is ever left pointing at a deleted artifact.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::adapter::Adapters;
use crate::config::ProviderConfig;
use crate::context::ContinuationContext;
use crate::error::{AdapterError, Result, StepError};
use crate::event::ProgressEvent;
use crate::model::{validate_subject, AccessGrant, AssignmentRequest, AssignmentStatus};
use crate::records::GrantRecordRepository;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RevokeCheckpoint {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	deassignment_request_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	deassignment_status: Option<AssignmentStatus>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	authorization_artifact_id: Option<String>,
}

#[derive(Debug)]
enum RevokeStep {
	Lookup,
	Polling { request_id: String },
	Cleanup { artifact_id: String },
}

impl RevokeStep {
	fn name(&self) -> &'static str {
		match self {
			Self::Lookup => "Lookup",
			Self::Polling { .. } => "Polling",
			Self::Cleanup { .. } => "Cleanup",
		}
	}

	fn from_checkpoint(checkpoint: RevokeCheckpoint) -> Result<Self> {
		match checkpoint {
			RevokeCheckpoint {
				deassignment_request_id: None,
				deassignment_status: None,
				authorization_artifact_id: None,
			} => Ok(Self::Lookup),
			RevokeCheckpoint {
				deassignment_status: Some(AssignmentStatus::Succeeded),
				authorization_artifact_id: Some(artifact_id),
				..
			} => Ok(Self::Cleanup { artifact_id }),
			RevokeCheckpoint {
				deassignment_request_id: Some(request_id),
				deassignment_status: None | Some(AssignmentStatus::Pending),
				..
			} => Ok(Self::Polling { request_id }),
			other => Err(StepError::InvalidContext(format!(
				"unrecognized delete progress: {other:?}"
			))),
		}
	}
}

/// Drives DELETE for one subject at a time.
#[derive(Clone)]
pub struct RevokeOrchestrator {
	config: ProviderConfig,
	adapters: Adapters,
	records: GrantRecordRepository,
}

impl RevokeOrchestrator {
	pub fn new(config: ProviderConfig, adapters: Adapters) -> Self {
		let records =
			GrantRecordRepository::new(adapters.store.clone(), config.parameter_prefix.clone());
		Self {
			config,
			adapters,
			records,
		}
	}

	/// Perform the next DELETE step for `subject`.
	///
	/// Fails terminally with `RecordNotFound` if no grant was ever persisted
	/// for the subject.
	#[instrument(skip_all, fields(subject = %subject))]
	pub async fn advance_revoke(
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
		let step = RevokeStep::from_checkpoint(context.decode()?)?;
		debug!(step = step.name(), "resuming delete");

		match step {
			RevokeStep::Lookup => self.begin(grant).await,
			RevokeStep::Polling { request_id } => self.poll(grant, &request_id, context).await,
			RevokeStep::Cleanup { artifact_id } => {
				grant.authorization_artifact_id = Some(artifact_id);
				Ok(self.clean_up(grant).await)
			}
		}
	}

	async fn begin(&self, grant: &mut AccessGrant) -> Result<ProgressEvent> {
		let record = self.records.load(&grant.subject_id).await?;
		*grant = AccessGrant::from_record(grant.subject_id.clone(), record.clone());

		let request = AssignmentRequest {
			artifact_id: record.authorization_artifact_id,
			principal_id: record.principal_id,
			target_account_id: self.config.target_account_id.clone(),
		};
		let operation = match self.adapters.authorization.request_deassignment(&request).await {
			Ok(operation) => operation,
			Err(AdapterError::NotFound { .. }) => {
				warn!(
					artifact_id = %request.artifact_id,
					"artifact already gone, cleaning up record"
				);
				info!(from = "Lookup", to = "Cleanup", "state transition");
				return Ok(self.clean_up(grant).await);
			}
			Err(e) => return Err(e.into()),
		};
		info!(
			from = "Lookup",
			to = "Polling",
			request_id = %operation.request_id,
			"state transition"
		);

		let context = ContinuationContext::encode(&RevokeCheckpoint {
			deassignment_request_id: Some(operation.request_id),
			..Default::default()
		})?;
		Ok(self.in_progress(grant, context))
	}

	async fn poll(
		&self,
		grant: &mut AccessGrant,
		request_id: &str,
		context: &ContinuationContext,
	) -> Result<ProgressEvent> {
		let operation = self.adapters.authorization.poll_deassignment_status(request_id).await?;
		grant.authorization_artifact_id = Some(operation.artifact_id.clone());
		grant.principal_id = Some(operation.principal_id.clone());

		match operation.status {
			AssignmentStatus::Pending => {
				debug!(request_id, "deassignment still pending");
				Ok(self.in_progress(grant, context.clone()))
			}
			AssignmentStatus::Failed => {
				info!(from = "Polling", to = "Failed", request_id, "state transition");
				Err(StepError::DeassignmentFailed {
					request_id: request_id.to_string(),
					reason: operation
						.failure_reason
						.unwrap_or_else(|| "no reason reported".to_string()),
				})
			}
			AssignmentStatus::Succeeded => {
				info!(from = "Polling", to = "Cleanup", request_id, "state transition");
				grant.assignment_request_id = Some(request_id.to_string());
				Ok(self.clean_up(grant).await)
			}
		}
	}

	/// Delete the artifact, then the record. Both tolerate already being gone.
	async fn clean_up(&self, grant: &AccessGrant) -> ProgressEvent {
		let Some(artifact_id) = grant.authorization_artifact_id.clone() else {
			let err = StepError::InvalidContext("cleanup without an artifact id".to_string());
			return self.fail(grant, err, ContinuationContext::new());
		};

		match self.remove(&grant.subject_id, &artifact_id).await {
			Ok(()) => {
				info!(from = "Cleanup", to = "Done", "state transition");
				ProgressEvent::success(
					format!("Deleted RDS access for user {}", grant.subject_id),
					grant.resource_model(),
				)
			}
			Err(err) => {
				let (err, resume) = ContinuationContext::resume_point(
					err,
					&RevokeCheckpoint {
						deassignment_request_id: grant.assignment_request_id.clone(),
						deassignment_status: Some(AssignmentStatus::Succeeded),
						authorization_artifact_id: Some(artifact_id),
					},
				);
				self.fail(grant, err, resume)
			}
		}
	}

	async fn remove(&self, subject: &str, artifact_id: &str) -> Result<()> {
		match self.adapters.authorization.delete_artifact(artifact_id).await {
			Ok(()) => info!(artifact_id, "deleted authorization artifact"),
			Err(AdapterError::NotFound { .. }) => {
				debug!(artifact_id, "authorization artifact already deleted")
			}
			Err(e) => return Err(e.into()),
		}
		self.records.remove(subject).await
	}

	fn in_progress(&self, grant: &AccessGrant, context: ContinuationContext) -> ProgressEvent {
		ProgressEvent::in_progress(
			format!("Deleting RDS access for user {}", grant.subject_id),
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
		warn!(error = %err, retryable = err.is_retryable(), "delete failed");
		ProgressEvent::failed(
			format!("Failed to delete RDS access for user {}: {err}", grant.subject_id),
			grant.resource_model(),
			&err,
			resume,
		)
	}
}
