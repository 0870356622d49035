// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Progress events returned to the caller after every invocation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::context::ContinuationContext;
use crate::error::StepError;
use crate::model::ResourceModel;

/// Outcome of a single invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStatus {
	InProgress,
	Success,
	Failed,
}

impl fmt::Display for OperationStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::InProgress => write!(f, "IN_PROGRESS"),
			Self::Success => write!(f, "SUCCESS"),
			Self::Failed => write!(f, "FAILED"),
		}
	}
}

/// Machine-readable classification of a failed invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandlerErrorCode {
	InvalidRequest,
	NotFound,
	AlreadyExists,
	/// Transient dependency failure; the caller may retry from the same context.
	ServiceInternalError,
	InternalFailure,
}

impl fmt::Display for HandlerErrorCode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Self::InvalidRequest => "InvalidRequest",
			Self::NotFound => "NotFound",
			Self::AlreadyExists => "AlreadyExists",
			Self::ServiceInternalError => "ServiceInternalError",
			Self::InternalFailure => "InternalFailure",
		};
		write!(f, "{name}")
	}
}

/// Result of one invocation: status, the context to replay next time, the
/// public attributes of the grant, and a human-readable message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
	pub status: OperationStatus,
	pub message: String,
	#[serde(default, skip_serializing_if = "ContinuationContext::is_empty")]
	pub callback_context: ContinuationContext,
	pub resource_model: ResourceModel,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error_code: Option<HandlerErrorCode>,
	#[serde(default)]
	pub callback_delay_seconds: u64,
}

impl ProgressEvent {
	/// Non-terminal result. The caller re-invokes after `delay_secs` with
	/// `context`.
	pub fn in_progress(
		message: impl Into<String>,
		resource_model: ResourceModel,
		context: ContinuationContext,
		delay_secs: u64,
	) -> Self {
		Self {
			status: OperationStatus::InProgress,
			message: message.into(),
			callback_context: context,
			resource_model,
			error_code: None,
			callback_delay_seconds: delay_secs,
		}
	}

	pub fn success(message: impl Into<String>, resource_model: ResourceModel) -> Self {
		Self {
			status: OperationStatus::Success,
			message: message.into(),
			callback_context: ContinuationContext::new(),
			resource_model,
			error_code: None,
			callback_delay_seconds: 0,
		}
	}

	/// Failed result. `context` is what a retry should be invoked with; it is
	/// only meaningful when the error is retryable.
	pub fn failed(
		message: impl Into<String>,
		resource_model: ResourceModel,
		error: &StepError,
		context: ContinuationContext,
	) -> Self {
		Self {
			status: OperationStatus::Failed,
			message: message.into(),
			callback_context: context,
			resource_model,
			error_code: Some(error.error_code()),
			callback_delay_seconds: 0,
		}
	}

	pub fn is_terminal(&self) -> bool {
		self.status != OperationStatus::InProgress
	}

	pub fn is_retryable(&self) -> bool {
		self.status == OperationStatus::Failed
			&& self.error_code == Some(HandlerErrorCode::ServiceInternalError)
	}
}
