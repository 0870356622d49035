// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! External re-invocation loop.
//!
//! Plays the caller's role: holds the continuation context as an opaque
//! string between invocations, waits the suggested delay, and re-invokes
//! until the provider reports a terminal status. Retryable failures are
//! re-invoked with the context they carry.

use std::time::Duration;

use rds_access_core::{AccessProvider, Action, ContinuationContext, HandlerRequest, ProgressEvent};
use tracing::{info, warn};

#[derive(Debug)]
pub struct DriveOutcome {
	pub event: ProgressEvent,
	pub invocations: u32,
}

impl DriveOutcome {
	/// True if the loop stopped at the invocation cap rather than a terminal
	/// event.
	pub fn exhausted(&self) -> bool {
		!self.event.is_terminal() || self.event.is_retryable()
	}
}

pub async fn drive(
	provider: &AccessProvider,
	action: Action,
	subject: &str,
	max_invocations: u32,
) -> anyhow::Result<DriveOutcome> {
	anyhow::ensure!(max_invocations > 0, "max invocations must be at least 1");

	let mut carried = String::new();
	let mut invocation = 0;
	loop {
		invocation += 1;
		let context = ContinuationContext::from_json_str(&carried)?;
		let request = HandlerRequest::new(action, subject).with_context(context);
		let event = provider.handle(&request).await;
		info!(
			invocation,
			status = %event.status,
			message = %event.message,
			"invocation finished"
		);

		let retry = event.is_retryable();
		if (event.is_terminal() && !retry) || invocation >= max_invocations {
			return Ok(DriveOutcome { event, invocations: invocation });
		}

		let delay = if retry {
			warn!(invocation, "retrying after transient failure");
			Duration::from_secs(retry_delay_secs(&event))
		} else {
			Duration::from_secs(event.callback_delay_seconds)
		};
		carried = event.callback_context.to_json_string();
		tokio::time::sleep(delay).await;
	}
}

/// Failed events carry no delay; back off for one second before a retry.
fn retry_delay_secs(event: &ProgressEvent) -> u64 {
	event.callback_delay_seconds.max(1)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rds_access_core::memory::ConfigStoreOp;
	use rds_access_core::{
		AdapterError, Adapters, InMemoryAuthorizationService, InMemoryConfigStore,
		InMemoryIdentityDirectory, OperationStatus, ProviderConfig, Service,
	};
	use std::sync::Arc;

	struct Fixture {
		authorization: InMemoryAuthorizationService,
		store: InMemoryConfigStore,
		provider: AccessProvider,
	}

	fn fixture(polls_until_settled: u32) -> Fixture {
		let config = ProviderConfig {
			instance_id: "arn:aws:sso:::instance/ssoins-test".to_string(),
			identity_store_id: "d-test".to_string(),
			target_account_id: "123456789012".to_string(),
			database_region: "ap-southeast-1".to_string(),
			callback_delay_secs: 0,
			..Default::default()
		};
		let authorization = InMemoryAuthorizationService::new(&config.instance_id)
			.with_polls_until_settled(polls_until_settled);
		let directory = InMemoryIdentityDirectory::new(&config.identity_store_id)
			.with_user("alice", "user-alice");
		let store = InMemoryConfigStore::new();
		let adapters = Adapters::new(
			Arc::new(authorization.clone()),
			Arc::new(directory),
			Arc::new(store.clone()),
		);
		Fixture {
			provider: AccessProvider::new(config, adapters),
			authorization,
			store,
		}
	}

	#[tokio::test]
	async fn drives_create_and_delete_to_completion() {
		let f = fixture(2);

		let created = drive(&f.provider, Action::Create, "alice", 10).await.unwrap();
		assert_eq!(created.event.status, OperationStatus::Success);
		assert_eq!(created.invocations, 3);
		assert!(!created.exhausted());
		assert!(f.store.contains("/awx/rds/accessprovider/alice"));

		let deleted = drive(&f.provider, Action::Delete, "alice", 10).await.unwrap();
		assert_eq!(deleted.event.status, OperationStatus::Success);
		assert!(f.authorization.artifact_ids().is_empty());
		assert!(!f.store.contains("/awx/rds/accessprovider/alice"));
	}

	#[tokio::test]
	async fn stops_at_the_invocation_cap() {
		let f = fixture(100);

		let outcome = drive(&f.provider, Action::Create, "alice", 3).await.unwrap();
		assert_eq!(outcome.invocations, 3);
		assert_eq!(outcome.event.status, OperationStatus::InProgress);
		assert!(outcome.exhausted());
	}

	#[tokio::test]
	async fn terminal_failure_is_not_retried() {
		let f = fixture(1);

		let outcome = drive(&f.provider, Action::Delete, "alice", 5).await.unwrap();
		assert_eq!(outcome.invocations, 1);
		assert_eq!(outcome.event.status, OperationStatus::Failed);
		assert!(!outcome.exhausted());
	}

	#[tokio::test]
	async fn retryable_failure_is_retried_with_its_context() {
		let f = fixture(1);
		f.store.fail_next(
			ConfigStoreOp::Put,
			AdapterError::unavailable(Service::ConfigStore, "throttled"),
		);

		let outcome = drive(&f.provider, Action::Create, "alice", 5).await.unwrap();
		assert_eq!(outcome.event.status, OperationStatus::Success);
		assert_eq!(outcome.invocations, 3);
		assert_eq!(f.authorization.artifact_ids().len(), 1);
	}
}
