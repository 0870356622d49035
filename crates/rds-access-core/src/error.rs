// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error taxonomy for adapter calls and orchestrator steps.

use std::fmt;

use thiserror::Error;

use crate::event::HandlerErrorCode;

/// Result type alias for adapter calls.
pub type AdapterResult<T> = std::result::Result<T, AdapterError>;

/// Result type alias for orchestrator steps.
pub type Result<T> = std::result::Result<T, StepError>;

/// Upstream system an adapter talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
	Authorization,
	IdentityDirectory,
	ConfigStore,
}

impl fmt::Display for Service {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Authorization => write!(f, "authorization service"),
			Self::IdentityDirectory => write!(f, "identity directory"),
			Self::ConfigStore => write!(f, "config store"),
		}
	}
}

/// Errors reported by an adapter at the upstream boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterError {
	/// Network or service failure. Retrying the same call may succeed.
	#[error("{service} unavailable: {message}")]
	Unavailable { service: Service, message: String },

	#[error("{resource} not found: {id}")]
	NotFound { resource: &'static str, id: String },

	/// The upstream refused the request (validation, permissions, state).
	#[error("{service} rejected request: {message}")]
	Rejected { service: Service, message: String },

	#[error("{resource} already exists: {id}")]
	Conflict { resource: &'static str, id: String },
}

impl AdapterError {
	pub fn unavailable(service: Service, message: impl Into<String>) -> Self {
		Self::Unavailable {
			service,
			message: message.into(),
		}
	}

	pub fn not_found(resource: &'static str, id: impl Into<String>) -> Self {
		Self::NotFound {
			resource,
			id: id.into(),
		}
	}

	pub fn rejected(service: Service, message: impl Into<String>) -> Self {
		Self::Rejected {
			service,
			message: message.into(),
		}
	}

	pub fn conflict(resource: &'static str, id: impl Into<String>) -> Self {
		Self::Conflict {
			resource,
			id: id.into(),
		}
	}

	pub fn is_not_found(&self) -> bool {
		matches!(self, Self::NotFound { .. })
	}

	pub fn is_transient(&self) -> bool {
		matches!(self, Self::Unavailable { .. })
	}
}

/// Whether a failed step may be retried from the same context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
	Retryable,
	Terminal,
}

/// Failure of a single orchestrator step.
#[derive(Debug, Error)]
pub enum StepError {
	#[error("dependency failure: {0}")]
	Dependency(#[from] AdapterError),

	#[error("no identity directory principal for subject {subject}")]
	PrincipalNotFound { subject: String },

	#[error("no persisted grant record for subject {subject}")]
	RecordNotFound { subject: String },

	#[error("invalid subject {subject:?}: {reason}")]
	InvalidSubject { subject: String, reason: String },

	#[error("invalid continuation context: {0}")]
	InvalidContext(String),

	#[error("persisted grant record {key} is unreadable: {message}")]
	CorruptRecord { key: String, message: String },

	#[error("account assignment {request_id} failed: {reason}")]
	AssignmentFailed { request_id: String, reason: String },

	#[error("account deassignment {request_id} failed: {reason}")]
	DeassignmentFailed { request_id: String, reason: String },

	/// A forward step failed and deleting the artifact it created failed too.
	/// The artifact is left behind and needs manual cleanup.
	#[error("{cause}; rollback of artifact {artifact_id} also failed: {rollback}; manual cleanup required")]
	RollbackFailed {
		cause: Box<StepError>,
		artifact_id: String,
		rollback: AdapterError,
	},
}

impl StepError {
	pub fn disposition(&self) -> Disposition {
		match self {
			Self::Dependency(err) if err.is_transient() => Disposition::Retryable,
			_ => Disposition::Terminal,
		}
	}

	pub fn is_retryable(&self) -> bool {
		self.disposition() == Disposition::Retryable
	}

	pub fn error_code(&self) -> HandlerErrorCode {
		match self {
			Self::Dependency(AdapterError::Unavailable { .. }) => {
				HandlerErrorCode::ServiceInternalError
			}
			Self::Dependency(AdapterError::NotFound { .. }) => HandlerErrorCode::NotFound,
			Self::Dependency(AdapterError::Rejected { .. }) => HandlerErrorCode::InvalidRequest,
			Self::Dependency(AdapterError::Conflict { .. }) => HandlerErrorCode::AlreadyExists,
			Self::PrincipalNotFound { .. } | Self::RecordNotFound { .. } => {
				HandlerErrorCode::NotFound
			}
			Self::InvalidSubject { .. } | Self::InvalidContext(_) => {
				HandlerErrorCode::InvalidRequest
			}
			Self::CorruptRecord { .. }
			| Self::AssignmentFailed { .. }
			| Self::DeassignmentFailed { .. }
			| Self::RollbackFailed { .. } => HandlerErrorCode::InternalFailure,
		}
	}
}
