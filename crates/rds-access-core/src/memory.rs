// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-process implementations of the three upstream systems.
//!
//! These back the test suites and the CLI sandbox. Each one records the calls
//! it receives, can be told to fail the next call of a given kind, and can
//! snapshot its state so a sandbox outlives a single process.
//!
//! Asynchronous assignment operations stay pending until settled, either
//! explicitly with [`InMemoryAuthorizationService::set_operation_status`] or
//! automatically after a configured number of polls.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::adapter::{AuthorizationService, ConfigStore, IdentityDirectory};
use crate::error::{AdapterError, AdapterResult, Service};
use crate::model::{
	ArtifactDescription, AssignmentOperation, AssignmentRequest, AssignmentStatus,
};
use crate::policy::ScopeDocument;

const ARTIFACT: &str = "permission set";
const OPERATION: &str = "assignment operation";
const USER: &str = "user";
const PARAMETER: &str = "parameter";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn take_failure<K>(
	failures: &mut HashMap<K, VecDeque<AdapterError>>,
	key: &K,
) -> Option<AdapterError>
where
	K: std::hash::Hash + Eq,
{
	failures.get_mut(key).and_then(VecDeque::pop_front)
}

// ---------------------------------------------------------------------------
// Authorization service
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthorizationOp {
	CreateArtifact,
	AttachScope,
	DeleteArtifact,
	DescribeArtifact,
	RequestAssignment,
	PollAssignment,
	RequestDeassignment,
	PollDeassignment,
}

/// Recorded call to the in-memory authorization service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationCall {
	pub op: AuthorizationOp,
	/// Artifact name, artifact id or request id, depending on `op`.
	pub target: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
	Assignment,
	Deassignment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredArtifact {
	pub name: String,
	pub created_at: DateTime<Utc>,
	#[serde(default)]
	pub scope: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredOperation {
	pub kind: OperationKind,
	pub status: AssignmentStatus,
	pub artifact_id: String,
	pub principal_id: String,
	pub target_account_id: String,
	#[serde(default)]
	pub polls: u32,
	#[serde(default)]
	pub failure_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountAssignment {
	pub artifact_id: String,
	pub principal_id: String,
	pub target_account_id: String,
}

impl From<&StoredOperation> for AccountAssignment {
	fn from(op: &StoredOperation) -> Self {
		Self {
			artifact_id: op.artifact_id.clone(),
			principal_id: op.principal_id.clone(),
			target_account_id: op.target_account_id.clone(),
		}
	}
}

/// Serializable state of the in-memory authorization service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationState {
	pub instance_id: String,
	#[serde(default)]
	pub next_artifact: u64,
	#[serde(default)]
	pub next_request: u64,
	#[serde(default)]
	pub artifacts: BTreeMap<String, StoredArtifact>,
	#[serde(default)]
	pub operations: BTreeMap<String, StoredOperation>,
	#[serde(default)]
	pub assignments: Vec<AccountAssignment>,
	/// Pending operations settle as succeeded once polled this many times.
	/// `None` leaves them pending until settled explicitly.
	#[serde(default)]
	pub polls_until_settled: Option<u32>,
}

impl AuthorizationState {
	fn settle(
		&mut self,
		request_id: &str,
		status: AssignmentStatus,
		failure_reason: Option<String>,
	) -> bool {
		let Some(operation) = self.operations.get_mut(request_id) else {
			return false;
		};
		operation.status = status;
		operation.failure_reason = failure_reason;
		let kind = operation.kind;
		let assignment = AccountAssignment::from(&*operation);

		if status == AssignmentStatus::Succeeded {
			match kind {
				OperationKind::Assignment => {
					if !self.assignments.contains(&assignment) {
						self.assignments.push(assignment);
					}
				}
				OperationKind::Deassignment => self.assignments.retain(|a| a != &assignment),
			}
		}
		true
	}

	fn start_operation(&mut self, kind: OperationKind, request: &AssignmentRequest) -> String {
		self.next_request += 1;
		let request_id = format!("req-{}", self.next_request);
		self.operations.insert(
			request_id.clone(),
			StoredOperation {
				kind,
				status: AssignmentStatus::Pending,
				artifact_id: request.artifact_id.clone(),
				principal_id: request.principal_id.clone(),
				target_account_id: request.target_account_id.clone(),
				polls: 0,
				failure_reason: None,
			},
		);
		request_id
	}

	fn poll(
		&mut self,
		kind: OperationKind,
		request_id: &str,
	) -> AdapterResult<AssignmentOperation> {
		let settle_after = self.polls_until_settled;
		let operation = self
			.operations
			.get_mut(request_id)
			.filter(|op| op.kind == kind)
			.ok_or_else(|| AdapterError::not_found(OPERATION, request_id))?;
		operation.polls += 1;

		let due = settle_after.is_some_and(|n| operation.polls >= n);
		if operation.status == AssignmentStatus::Pending && due {
			self.settle(request_id, AssignmentStatus::Succeeded, None);
		}
		self
			.view(request_id)
			.ok_or_else(|| AdapterError::not_found(OPERATION, request_id))
	}

	fn view(&self, request_id: &str) -> Option<AssignmentOperation> {
		self.operations.get(request_id).map(|op| AssignmentOperation {
			request_id: request_id.to_string(),
			status: op.status,
			artifact_id: op.artifact_id.clone(),
			principal_id: op.principal_id.clone(),
			failure_reason: op.failure_reason.clone(),
		})
	}

	fn artifact_arn(&self, sequence: u64) -> String {
		let instance = self.instance_id.rsplit('/').next().unwrap_or_default();
		format!("arn:aws:sso:::permissionSet/{instance}/ps-{sequence:016x}")
	}
}

#[derive(Default)]
struct AuthorizationInner {
	state: AuthorizationState,
	failures: HashMap<AuthorizationOp, VecDeque<AdapterError>>,
	calls: Vec<AuthorizationCall>,
}

/// In-memory authorization service.
#[derive(Clone, Default)]
pub struct InMemoryAuthorizationService {
	inner: Arc<Mutex<AuthorizationInner>>,
}

impl InMemoryAuthorizationService {
	pub fn new(instance_id: impl Into<String>) -> Self {
		Self::from_state(AuthorizationState {
			instance_id: instance_id.into(),
			..Default::default()
		})
	}

	pub fn from_state(state: AuthorizationState) -> Self {
		Self {
			inner: Arc::new(Mutex::new(AuthorizationInner {
				state,
				..Default::default()
			})),
		}
	}

	pub fn with_polls_until_settled(self, polls: u32) -> Self {
		lock(&self.inner).state.polls_until_settled = Some(polls);
		self
	}

	pub fn snapshot(&self) -> AuthorizationState {
		lock(&self.inner).state.clone()
	}

	/// Make the next call of kind `op` fail with `error`. Failures queue up in
	/// order.
	pub fn fail_next(&self, op: AuthorizationOp, error: AdapterError) {
		lock(&self.inner)
			.failures
			.entry(op)
			.or_default()
			.push_back(error);
	}

	pub fn calls(&self) -> Vec<AuthorizationCall> {
		lock(&self.inner).calls.clone()
	}

	pub fn count_calls(&self, op: AuthorizationOp) -> usize {
		lock(&self.inner)
			.calls
			.iter()
			.filter(|c| c.op == op)
			.count()
	}

	pub fn clear_calls(&self) {
		lock(&self.inner).calls.clear();
	}

	pub fn artifact_ids(&self) -> Vec<String> {
		lock(&self.inner).state.artifacts.keys().cloned().collect()
	}

	pub fn has_artifact(&self, artifact_id: &str) -> bool {
		lock(&self.inner).state.artifacts.contains_key(artifact_id)
	}

	pub fn is_assigned(&self, artifact_id: &str, principal_id: &str) -> bool {
		lock(&self.inner)
			.state
			.assignments
			.iter()
			.any(|a| a.artifact_id == artifact_id && a.principal_id == principal_id)
	}

	/// Settle an operation. Returns false if the request id is unknown.
	pub fn set_operation_status(&self, request_id: &str, status: AssignmentStatus) -> bool {
		let reason = (status == AssignmentStatus::Failed).then(|| "operation failed".to_string());
		lock(&self.inner).state.settle(request_id, status, reason)
	}

	/// Settle an operation as failed with a specific reason.
	pub fn fail_operation(&self, request_id: &str, reason: impl Into<String>) -> bool {
		lock(&self.inner)
			.state
			.settle(request_id, AssignmentStatus::Failed, Some(reason.into()))
	}

	/// Record the call and return the injected failure for it, if any.
	fn begin(
		&self,
		op: AuthorizationOp,
		target: &str,
	) -> AdapterResult<MutexGuard<'_, AuthorizationInner>> {
		let mut inner = lock(&self.inner);
		inner.calls.push(AuthorizationCall {
			op,
			target: target.to_string(),
		});
		debug!(?op, target, "authorization call");
		match take_failure(&mut inner.failures, &op) {
			Some(err) => Err(err),
			None => Ok(inner),
		}
	}
}

#[async_trait]
impl AuthorizationService for InMemoryAuthorizationService {
	async fn create_artifact(&self, name: &str) -> AdapterResult<String> {
		let mut inner = self.begin(AuthorizationOp::CreateArtifact, name)?;
		let state = &mut inner.state;

		if state.artifacts.values().any(|a| a.name == name) {
			return Err(AdapterError::conflict(ARTIFACT, name));
		}
		state.next_artifact += 1;
		let artifact_id = state.artifact_arn(state.next_artifact);
		state.artifacts.insert(
			artifact_id.clone(),
			StoredArtifact {
				name: name.to_string(),
				created_at: Utc::now(),
				scope: None,
			},
		);
		Ok(artifact_id)
	}

	async fn attach_scope(&self, artifact_id: &str, document: &ScopeDocument) -> AdapterResult<()> {
		let mut inner = self.begin(AuthorizationOp::AttachScope, artifact_id)?;
		let artifact = inner
			.state
			.artifacts
			.get_mut(artifact_id)
			.ok_or_else(|| AdapterError::not_found(ARTIFACT, artifact_id))?;
		artifact.scope = Some(document.to_json());
		Ok(())
	}

	async fn delete_artifact(&self, artifact_id: &str) -> AdapterResult<()> {
		let mut inner = self.begin(AuthorizationOp::DeleteArtifact, artifact_id)?;
		let state = &mut inner.state;

		if !state.artifacts.contains_key(artifact_id) {
			return Err(AdapterError::not_found(ARTIFACT, artifact_id));
		}
		if state.assignments.iter().any(|a| a.artifact_id == artifact_id) {
			return Err(AdapterError::rejected(
				Service::Authorization,
				format!("{artifact_id} is still assigned to an account"),
			));
		}
		state.artifacts.remove(artifact_id);
		Ok(())
	}

	async fn describe_artifact(&self, artifact_id: &str) -> AdapterResult<ArtifactDescription> {
		let inner = self.begin(AuthorizationOp::DescribeArtifact, artifact_id)?;
		inner
			.state
			.artifacts
			.get(artifact_id)
			.map(|a| ArtifactDescription {
				artifact_id: artifact_id.to_string(),
				name: a.name.clone(),
				created_at: a.created_at,
			})
			.ok_or_else(|| AdapterError::not_found(ARTIFACT, artifact_id))
	}

	async fn request_assignment(
		&self,
		request: &AssignmentRequest,
	) -> AdapterResult<AssignmentOperation> {
		let mut inner = self.begin(AuthorizationOp::RequestAssignment, &request.artifact_id)?;
		let state = &mut inner.state;

		if !state.artifacts.contains_key(&request.artifact_id) {
			return Err(AdapterError::not_found(ARTIFACT, &request.artifact_id));
		}
		let request_id = state.start_operation(OperationKind::Assignment, request);
		state
			.view(&request_id)
			.ok_or_else(|| AdapterError::not_found(OPERATION, request_id))
	}

	async fn poll_assignment_status(&self, request_id: &str) -> AdapterResult<AssignmentOperation> {
		let mut inner = self.begin(AuthorizationOp::PollAssignment, request_id)?;
		inner.state.poll(OperationKind::Assignment, request_id)
	}

	async fn request_deassignment(
		&self,
		request: &AssignmentRequest,
	) -> AdapterResult<AssignmentOperation> {
		let mut inner = self.begin(AuthorizationOp::RequestDeassignment, &request.artifact_id)?;
		let state = &mut inner.state;

		if !state.artifacts.contains_key(&request.artifact_id) {
			return Err(AdapterError::not_found(ARTIFACT, &request.artifact_id));
		}
		let request_id = state.start_operation(OperationKind::Deassignment, request);
		state
			.view(&request_id)
			.ok_or_else(|| AdapterError::not_found(OPERATION, request_id))
	}

	async fn poll_deassignment_status(
		&self,
		request_id: &str,
	) -> AdapterResult<AssignmentOperation> {
		let mut inner = self.begin(AuthorizationOp::PollDeassignment, request_id)?;
		inner.state.poll(OperationKind::Deassignment, request_id)
	}
}

// ---------------------------------------------------------------------------
// Identity directory
// ---------------------------------------------------------------------------

/// Serializable state of the in-memory identity directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryState {
	pub identity_store_id: String,
	/// Username to principal id.
	#[serde(default)]
	pub users: BTreeMap<String, String>,
}

#[derive(Default)]
struct DirectoryInner {
	state: DirectoryState,
	failures: VecDeque<AdapterError>,
	lookups: Vec<String>,
}

/// In-memory identity directory.
#[derive(Clone, Default)]
pub struct InMemoryIdentityDirectory {
	inner: Arc<Mutex<DirectoryInner>>,
}

impl InMemoryIdentityDirectory {
	pub fn new(identity_store_id: impl Into<String>) -> Self {
		Self::from_state(DirectoryState {
			identity_store_id: identity_store_id.into(),
			users: BTreeMap::new(),
		})
	}

	pub fn from_state(state: DirectoryState) -> Self {
		Self {
			inner: Arc::new(Mutex::new(DirectoryInner {
				state,
				..Default::default()
			})),
		}
	}

	pub fn with_user(self, username: impl Into<String>, principal_id: impl Into<String>) -> Self {
		self.add_user(username, principal_id);
		self
	}

	pub fn add_user(&self, username: impl Into<String>, principal_id: impl Into<String>) {
		lock(&self.inner)
			.state
			.users
			.insert(username.into(), principal_id.into());
	}

	pub fn snapshot(&self) -> DirectoryState {
		lock(&self.inner).state.clone()
	}

	pub fn fail_next(&self, error: AdapterError) {
		lock(&self.inner).failures.push_back(error);
	}

	/// Usernames looked up so far, in order.
	pub fn lookups(&self) -> Vec<String> {
		lock(&self.inner).lookups.clone()
	}
}

#[async_trait]
impl IdentityDirectory for InMemoryIdentityDirectory {
	async fn resolve_principal(&self, username: &str) -> AdapterResult<String> {
		let mut inner = lock(&self.inner);
		inner.lookups.push(username.to_string());
		if let Some(err) = inner.failures.pop_front() {
			return Err(err);
		}
		inner.state.users.get(username).cloned().ok_or_else(|| {
			AdapterError::not_found(
				USER,
				format!("{username} in {}", inner.state.identity_store_id),
			)
		})
	}
}

// ---------------------------------------------------------------------------
// Config store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigStoreOp {
	Put,
	Get,
	Delete,
}

#[derive(Default)]
struct StoreInner {
	values: BTreeMap<String, String>,
	failures: HashMap<ConfigStoreOp, VecDeque<AdapterError>>,
	calls: Vec<(ConfigStoreOp, String)>,
}

/// In-memory config store.
#[derive(Clone, Default)]
pub struct InMemoryConfigStore {
	inner: Arc<Mutex<StoreInner>>,
}

impl InMemoryConfigStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_values(values: BTreeMap<String, String>) -> Self {
		Self {
			inner: Arc::new(Mutex::new(StoreInner {
				values,
				..Default::default()
			})),
		}
	}

	pub fn snapshot(&self) -> BTreeMap<String, String> {
		lock(&self.inner).values.clone()
	}

	pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
		lock(&self.inner).values.insert(key.into(), value.into());
	}

	pub fn contains(&self, key: &str) -> bool {
		lock(&self.inner).values.contains_key(key)
	}

	pub fn value(&self, key: &str) -> Option<String> {
		lock(&self.inner).values.get(key).cloned()
	}

	pub fn fail_next(&self, op: ConfigStoreOp, error: AdapterError) {
		lock(&self.inner)
			.failures
			.entry(op)
			.or_default()
			.push_back(error);
	}

	pub fn calls(&self) -> Vec<(ConfigStoreOp, String)> {
		lock(&self.inner).calls.clone()
	}

	fn begin(&self, op: ConfigStoreOp, key: &str) -> AdapterResult<MutexGuard<'_, StoreInner>> {
		let mut inner = lock(&self.inner);
		inner.calls.push((op, key.to_string()));
		match take_failure(&mut inner.failures, &op) {
			Some(err) => Err(err),
			None => Ok(inner),
		}
	}
}

#[async_trait]
impl ConfigStore for InMemoryConfigStore {
	async fn put(&self, key: &str, value: &str) -> AdapterResult<()> {
		let mut inner = self.begin(ConfigStoreOp::Put, key)?;
		inner.values.insert(key.to_string(), value.to_string());
		Ok(())
	}

	async fn get(&self, key: &str) -> AdapterResult<String> {
		let inner = self.begin(ConfigStoreOp::Get, key)?;
		inner
			.values
			.get(key)
			.cloned()
			.ok_or_else(|| AdapterError::not_found(PARAMETER, key))
	}

	async fn delete(&self, key: &str) -> AdapterResult<()> {
		let mut inner = self.begin(ConfigStoreOp::Delete, key)?;
		inner
			.values
			.remove(key)
			.map(|_| ())
			.ok_or_else(|| AdapterError::not_found(PARAMETER, key))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::ProviderConfig;

	const INSTANCE: &str = "arn:aws:sso:::instance/ssoins-test";

	fn request(artifact_id: &str) -> AssignmentRequest {
		AssignmentRequest {
			artifact_id: artifact_id.to_string(),
			principal_id: "user-1".to_string(),
			target_account_id: "123456789012".to_string(),
		}
	}

	#[tokio::test]
	async fn request_ids_are_sequential() {
		let svc = InMemoryAuthorizationService::new(INSTANCE);
		let artifact = svc.create_artifact("DB_Access_For_alice").await.unwrap();
		assert!(artifact.starts_with("arn:aws:sso:::permissionSet/ssoins-test/ps-"));

		let first = svc.request_assignment(&request(&artifact)).await.unwrap();
		let second = svc.request_deassignment(&request(&artifact)).await.unwrap();
		assert_eq!(first.request_id, "req-1");
		assert_eq!(second.request_id, "req-2");
		assert_eq!(first.status, AssignmentStatus::Pending);
	}

	#[tokio::test]
	async fn operations_stay_pending_until_settled() {
		let svc = InMemoryAuthorizationService::new(INSTANCE);
		let artifact = svc.create_artifact("DB_Access_For_alice").await.unwrap();
		let op = svc.request_assignment(&request(&artifact)).await.unwrap();

		for _ in 0..3 {
			let polled = svc.poll_assignment_status(&op.request_id).await.unwrap();
			assert_eq!(polled.status, AssignmentStatus::Pending);
		}
		assert!(!svc.is_assigned(&artifact, "user-1"));

		assert!(svc.set_operation_status(&op.request_id, AssignmentStatus::Succeeded));
		let polled = svc.poll_assignment_status(&op.request_id).await.unwrap();
		assert_eq!(polled.status, AssignmentStatus::Succeeded);
		assert!(svc.is_assigned(&artifact, "user-1"));
	}

	#[tokio::test]
	async fn auto_settles_after_configured_polls() {
		let svc = InMemoryAuthorizationService::new(INSTANCE).with_polls_until_settled(2);
		let artifact = svc.create_artifact("DB_Access_For_alice").await.unwrap();
		let op = svc.request_assignment(&request(&artifact)).await.unwrap();

		let first = svc.poll_assignment_status(&op.request_id).await.unwrap();
		let second = svc.poll_assignment_status(&op.request_id).await.unwrap();
		assert_eq!(first.status, AssignmentStatus::Pending);
		assert_eq!(second.status, AssignmentStatus::Succeeded);
	}

	#[tokio::test]
	async fn assigned_artifact_cannot_be_deleted() {
		let svc = InMemoryAuthorizationService::new(INSTANCE);
		let artifact = svc.create_artifact("DB_Access_For_alice").await.unwrap();
		let op = svc.request_assignment(&request(&artifact)).await.unwrap();
		svc.set_operation_status(&op.request_id, AssignmentStatus::Succeeded);

		let err = svc.delete_artifact(&artifact).await.unwrap_err();
		assert!(matches!(err, AdapterError::Rejected { .. }));

		let removal = svc.request_deassignment(&request(&artifact)).await.unwrap();
		svc.set_operation_status(&removal.request_id, AssignmentStatus::Succeeded);
		svc.delete_artifact(&artifact).await.unwrap();
		assert!(!svc.has_artifact(&artifact));
	}

	#[tokio::test]
	async fn duplicate_artifact_names_conflict() {
		let svc = InMemoryAuthorizationService::new(INSTANCE);
		svc.create_artifact("DB_Access_For_alice").await.unwrap();
		let err = svc.create_artifact("DB_Access_For_alice").await.unwrap_err();
		assert!(matches!(err, AdapterError::Conflict { .. }));
	}

	#[tokio::test]
	async fn injected_failures_fire_once_and_are_recorded() {
		let svc = InMemoryAuthorizationService::new(INSTANCE);
		svc.fail_next(
			AuthorizationOp::CreateArtifact,
			AdapterError::unavailable(Service::Authorization, "throttled"),
		);

		assert!(svc.create_artifact("DB_Access_For_alice").await.is_err());
		assert!(svc.create_artifact("DB_Access_For_alice").await.is_ok());
		assert_eq!(svc.count_calls(AuthorizationOp::CreateArtifact), 2);
	}

	#[tokio::test]
	async fn snapshot_restores_state() {
		let svc = InMemoryAuthorizationService::new(INSTANCE);
		let artifact = svc.create_artifact("DB_Access_For_alice").await.unwrap();
		let doc = ScopeDocument::for_subject(&ProviderConfig::default(), "alice");
		svc.attach_scope(&artifact, &doc).await.unwrap();

		let raw = serde_json::to_string(&svc.snapshot()).unwrap();
		let restored =
			InMemoryAuthorizationService::from_state(serde_json::from_str(&raw).unwrap());
		assert!(restored.has_artifact(&artifact));
		let next = restored.create_artifact("DB_Access_For_bob").await.unwrap();
		assert_ne!(next, artifact);
	}

	#[tokio::test]
	async fn directory_resolves_known_users_only() {
		let dir = InMemoryIdentityDirectory::new("d-test").with_user("alice", "user-1");
		assert_eq!(dir.resolve_principal("alice").await.unwrap(), "user-1");

		let err = dir.resolve_principal("mallory").await.unwrap_err();
		assert!(err.is_not_found());
		assert_eq!(dir.lookups(), vec!["alice".to_string(), "mallory".to_string()]);
	}

	#[tokio::test]
	async fn store_get_and_delete_report_missing_keys() {
		let store = InMemoryConfigStore::new();
		assert!(store.get("/missing").await.unwrap_err().is_not_found());
		assert!(store.delete("/missing").await.unwrap_err().is_not_found());

		store.put("/k", "v1").await.unwrap();
		store.put("/k", "v2").await.unwrap();
		assert_eq!(store.get("/k").await.unwrap(), "v2");
	}
}
