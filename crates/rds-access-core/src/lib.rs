// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Resumable provisioning of identity-based RDS access grants.
//!
//! A grant binds a directory user to an authorization artifact (a permission
//! set carrying an `rds-db:connect` scope) through an asynchronous account
//! assignment, and records the result in a durable config store. Every
//! operation is a short state machine that advances at most one step per
//! invocation and hands an opaque [`ContinuationContext`] back to the caller,
//! who replays it on the next invocation. Nothing survives in memory between
//! invocations.
//!
//! # Architecture
//!
//! - [`GrantOrchestrator`] drives CREATE: create artifact, attach scope,
//!   resolve principal, request assignment, poll, persist.
//! - [`RevokeOrchestrator`] drives DELETE: load record, request deassignment,
//!   poll, delete artifact and record.
//! - [`Reconciler`] performs the READ existence check.
//! - [`AccessProvider`] routes a [`HandlerRequest`] to the right orchestrator.
//!
//! The three upstream systems are reached through the traits in [`adapter`];
//! [`memory`] provides in-process implementations of all three.

pub mod adapter;
pub mod config;
pub mod context;
pub mod error;
pub mod event;
pub mod grant;
pub mod memory;
pub mod model;
pub mod policy;
pub mod provider;
pub mod reconcile;
pub mod records;
pub mod revoke;

pub use adapter::{Adapters, AuthorizationService, ConfigStore, IdentityDirectory};
pub use config::{ProviderConfig, ProviderConfigError};
pub use context::ContinuationContext;
pub use error::{AdapterError, AdapterResult, Disposition, Service, StepError};
pub use event::{HandlerErrorCode, OperationStatus, ProgressEvent};
pub use grant::GrantOrchestrator;
pub use memory::{InMemoryAuthorizationService, InMemoryConfigStore, InMemoryIdentityDirectory};
pub use model::{
	AccessGrant, ArtifactDescription, AssignmentOperation, AssignmentRequest, AssignmentStatus,
	PersistedGrantRecord, ResourceModel,
};
pub use policy::ScopeDocument;
pub use provider::{AccessProvider, Action, HandlerRequest};
pub use reconcile::{Reconciler, Reconciliation};
pub use records::GrantRecordRepository;
pub use revoke::RevokeOrchestrator;
