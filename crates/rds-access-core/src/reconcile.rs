// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Read-only check that a provisioned artifact still exists upstream.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::adapter::AuthorizationService;
use crate::error::{AdapterError, AdapterResult};
use crate::model::ArtifactDescription;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
	pub exists: bool,
	pub artifact: Option<ArtifactDescription>,
}

#[derive(Clone)]
pub struct Reconciler {
	authorization: Arc<dyn AuthorizationService>,
}

impl Reconciler {
	pub fn new(authorization: Arc<dyn AuthorizationService>) -> Self {
		Self { authorization }
	}

	/// Describe `artifact_id`. A missing artifact is `exists: false`, not an
	/// error; any other failure is surfaced unchanged.
	#[instrument(skip(self))]
	pub async fn reconcile(&self, artifact_id: &str) -> AdapterResult<Reconciliation> {
		match self.authorization.describe_artifact(artifact_id).await {
			Ok(artifact) => {
				debug!(name = %artifact.name, "artifact present");
				Ok(Reconciliation {
					exists: true,
					artifact: Some(artifact),
				})
			}
			Err(AdapterError::NotFound { .. }) => {
				debug!("artifact missing");
				Ok(Reconciliation {
					exists: false,
					artifact: None,
				})
			}
			Err(e) => Err(e),
		}
	}
}
