// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Persisted grant records in the config store.

use std::sync::Arc;

use tracing::debug;

use crate::adapter::ConfigStore;
use crate::error::{AdapterError, Result, StepError};
use crate::model::PersistedGrantRecord;

/// Reads and writes [`PersistedGrantRecord`]s keyed by subject.
#[derive(Clone)]
pub struct GrantRecordRepository {
	store: Arc<dyn ConfigStore>,
	prefix: String,
}

impl GrantRecordRepository {
	pub fn new(store: Arc<dyn ConfigStore>, prefix: impl Into<String>) -> Self {
		Self {
			store,
			prefix: prefix.into(),
		}
	}

	pub fn key(&self, subject: &str) -> String {
		format!("{}/{}", self.prefix.trim_end_matches('/'), subject)
	}

	/// Load the record for `subject`. A missing record is `RecordNotFound`.
	pub async fn load(&self, subject: &str) -> Result<PersistedGrantRecord> {
		let key = self.key(subject);
		let raw = match self.store.get(&key).await {
			Ok(raw) => raw,
			Err(AdapterError::NotFound { .. }) => {
				return Err(StepError::RecordNotFound {
					subject: subject.to_string(),
				})
			}
			Err(e) => return Err(e.into()),
		};
		debug!(key = %key, "loaded grant record");

		serde_json::from_str(&raw).map_err(|e| StepError::CorruptRecord {
			key,
			message: e.to_string(),
		})
	}

	pub async fn save(&self, subject: &str, record: &PersistedGrantRecord) -> Result<()> {
		let key = self.key(subject);
		let value = serde_json::to_string(record).map_err(|e| StepError::CorruptRecord {
			key: key.clone(),
			message: e.to_string(),
		})?;
		self.store.put(&key, &value).await?;
		debug!(key = %key, "saved grant record");
		Ok(())
	}

	/// Remove the record for `subject`. Removing an absent record succeeds.
	pub async fn remove(&self, subject: &str) -> Result<()> {
		let key = self.key(subject);
		match self.store.delete(&key).await {
			Ok(()) => {
				debug!(key = %key, "removed grant record");
				Ok(())
			}
			Err(AdapterError::NotFound { .. }) => {
				debug!(key = %key, "grant record already absent");
				Ok(())
			}
			Err(e) => Err(e.into()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::Service;
	use crate::memory::{ConfigStoreOp, InMemoryConfigStore};

	fn repository() -> (InMemoryConfigStore, GrantRecordRepository) {
		let store = InMemoryConfigStore::new();
		let repo = GrantRecordRepository::new(Arc::new(store.clone()), "/awx/rds/accessprovider");
		(store, repo)
	}

	fn record() -> PersistedGrantRecord {
		PersistedGrantRecord {
			authorization_artifact_id: "ps-1".to_string(),
			principal_id: "user-1".to_string(),
		}
	}

	#[tokio::test]
	async fn save_then_load() {
		let (store, repo) = repository();
		repo.save("alice", &record()).await.unwrap();

		assert!(store.contains("/awx/rds/accessprovider/alice"));
		assert_eq!(repo.load("alice").await.unwrap(), record());
	}

	#[tokio::test]
	async fn missing_record_is_record_not_found() {
		let (_store, repo) = repository();
		let err = repo.load("bob").await.unwrap_err();
		assert!(matches!(err, StepError::RecordNotFound { subject } if subject == "bob"));
	}

	#[tokio::test]
	async fn unparseable_record_is_corrupt() {
		let (store, repo) = repository();
		store.insert("/awx/rds/accessprovider/alice", "not json");

		let err = repo.load("alice").await.unwrap_err();
		assert!(matches!(err, StepError::CorruptRecord { .. }));
	}

	#[tokio::test]
	async fn remove_is_idempotent() {
		let (store, repo) = repository();
		repo.save("alice", &record()).await.unwrap();

		repo.remove("alice").await.unwrap();
		repo.remove("alice").await.unwrap();
		assert!(!store.contains("/awx/rds/accessprovider/alice"));
	}

	#[tokio::test]
	async fn transient_store_failure_propagates() {
		let (store, repo) = repository();
		store.fail_next(
			ConfigStoreOp::Get,
			AdapterError::unavailable(Service::ConfigStore, "throttled"),
		);

		let err = repo.load("alice").await.unwrap_err();
		assert!(err.is_retryable());
	}
}
