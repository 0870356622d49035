// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Capability interfaces for the three upstream systems.
//!
//! Each call is a single request/response. Implementations translate their
//! transport's failures into [`AdapterError`](crate::error::AdapterError):
//! transient failures as `Unavailable`, missing resources as `NotFound`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AdapterResult;
use crate::model::{ArtifactDescription, AssignmentOperation, AssignmentRequest};
use crate::policy::ScopeDocument;

/// Permission artifacts and their asynchronous account assignments.
#[async_trait]
pub trait AuthorizationService: Send + Sync {
	/// Create an empty artifact and return its id.
	async fn create_artifact(&self, name: &str) -> AdapterResult<String>;

	/// Attach the access scope to an existing artifact.
	async fn attach_scope(&self, artifact_id: &str, document: &ScopeDocument) -> AdapterResult<()>;

	async fn delete_artifact(&self, artifact_id: &str) -> AdapterResult<()>;

	/// Describe an artifact. Fails with `NotFound` if it does not exist.
	async fn describe_artifact(&self, artifact_id: &str) -> AdapterResult<ArtifactDescription>;

	/// Start binding a principal to an artifact. Completion is observed by
	/// polling the returned request id.
	async fn request_assignment(
		&self,
		request: &AssignmentRequest,
	) -> AdapterResult<AssignmentOperation>;

	async fn poll_assignment_status(&self, request_id: &str) -> AdapterResult<AssignmentOperation>;

	async fn request_deassignment(
		&self,
		request: &AssignmentRequest,
	) -> AdapterResult<AssignmentOperation>;

	async fn poll_deassignment_status(&self, request_id: &str)
		-> AdapterResult<AssignmentOperation>;
}

/// Username to principal resolution.
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
	/// Fails with `NotFound` if no principal has this username.
	async fn resolve_principal(&self, username: &str) -> AdapterResult<String>;
}

/// Durable key-value store for grant records.
#[async_trait]
pub trait ConfigStore: Send + Sync {
	/// Write `value` under `key`, overwriting any previous value.
	async fn put(&self, key: &str, value: &str) -> AdapterResult<()>;

	/// Fails with `NotFound` if `key` is absent.
	async fn get(&self, key: &str) -> AdapterResult<String>;

	/// Fails with `NotFound` if `key` is absent.
	async fn delete(&self, key: &str) -> AdapterResult<()>;
}

/// Handles to the three upstream systems.
#[derive(Clone)]
pub struct Adapters {
	pub authorization: Arc<dyn AuthorizationService>,
	pub directory: Arc<dyn IdentityDirectory>,
	pub store: Arc<dyn ConfigStore>,
}

impl Adapters {
	pub fn new(
		authorization: Arc<dyn AuthorizationService>,
		directory: Arc<dyn IdentityDirectory>,
		store: Arc<dyn ConfigStore>,
	) -> Self {
		Self {
			authorization,
			directory,
			store,
		}
	}
}
