// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Continuation context carried between invocations.
//!
//! The context is the only state that survives from one invocation to the
//! next. The caller treats it as opaque JSON and echoes it back unmodified;
//! the orchestrators decode it into a typed checkpoint at the start of each
//! invocation and encode the next checkpoint before returning.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::error;

use crate::error::{Result, StepError};

/// Opaque key/value state handed back to the caller after each invocation.
///
/// An empty context means "first invocation".
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ContinuationContext(Map<String, Value>);

impl ContinuationContext {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn get(&self, key: &str) -> Option<&Value> {
		self.0.get(key)
	}

	pub fn get_str(&self, key: &str) -> Option<&str> {
		self.0.get(key).and_then(Value::as_str)
	}

	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.0.keys().map(String::as_str)
	}

	/// Decode the context into a typed checkpoint.
	///
	/// An empty context decodes to `T::default()`.
	pub fn decode<T>(&self) -> Result<T>
	where
		T: DeserializeOwned + Default,
	{
		if self.0.is_empty() {
			return Ok(T::default());
		}
		serde_json::from_value(Value::Object(self.0.clone()))
			.map_err(|e| StepError::InvalidContext(e.to_string()))
	}

	/// Encode a typed checkpoint. The checkpoint must serialize to a JSON object.
	pub fn encode<T>(checkpoint: &T) -> Result<Self>
	where
		T: Serialize,
	{
		match serde_json::to_value(checkpoint) {
			Ok(Value::Object(map)) => Ok(Self(map)),
			Ok(Value::Null) => Ok(Self::new()),
			Ok(other) => Err(StepError::InvalidContext(format!(
				"checkpoint must encode to an object, got {other}"
			))),
			Err(e) => Err(StepError::InvalidContext(e.to_string())),
		}
	}

	/// Pair a retryable failure with the checkpoint the retry resumes from.
	///
	/// If the checkpoint cannot be encoded the encoding error replaces `err`,
	/// which is terminal, so a retry never restarts from an empty context.
	pub fn resume_point<T>(err: StepError, checkpoint: &T) -> (StepError, Self)
	where
		T: Serialize,
	{
		match Self::encode(checkpoint) {
			Ok(context) => (err, context),
			Err(encode_err) => {
				error!(
					error = %err,
					encode_error = %encode_err,
					"could not encode resume checkpoint"
				);
				(encode_err, Self::new())
			}
		}
	}

	/// Parse a context received from the caller. Blank input and `null` are
	/// both the empty context.
	pub fn from_json_str(raw: &str) -> Result<Self> {
		let raw = raw.trim();
		if raw.is_empty() {
			return Ok(Self::new());
		}
		match serde_json::from_str::<Value>(raw) {
			Ok(Value::Object(map)) => Ok(Self(map)),
			Ok(Value::Null) => Ok(Self::new()),
			Ok(other) => Err(StepError::InvalidContext(format!(
				"expected a JSON object, got {other}"
			))),
			Err(e) => Err(StepError::InvalidContext(e.to_string())),
		}
	}

	pub fn to_json_string(&self) -> String {
		Value::Object(self.0.clone()).to_string()
	}
}

impl<'de> Deserialize<'de> for ContinuationContext {
	fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let map = Option::<Map<String, Value>>::deserialize(deserializer)?;
		Ok(Self(map.unwrap_or_default()))
	}
}

impl From<Map<String, Value>> for ContinuationContext {
	fn from(map: Map<String, Value>) -> Self {
		Self(map)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
	#[serde(rename_all = "camelCase")]
	struct Checkpoint {
		#[serde(default, skip_serializing_if = "Option::is_none")]
		request_id: Option<String>,
	}

	#[test]
	fn empty_context_decodes_to_default() {
		let ctx = ContinuationContext::new();
		let checkpoint: Checkpoint = ctx.decode().unwrap();
		assert_eq!(checkpoint, Checkpoint::default());
	}

	#[test]
	fn blank_and_null_input_are_first_invocation() {
		assert!(ContinuationContext::from_json_str("").unwrap().is_empty());
		assert!(ContinuationContext::from_json_str("  \n").unwrap().is_empty());
		assert!(ContinuationContext::from_json_str("null").unwrap().is_empty());
	}

	#[test]
	fn non_object_input_is_rejected() {
		let err = ContinuationContext::from_json_str("[1, 2]").unwrap_err();
		assert!(matches!(err, StepError::InvalidContext(_)));
		assert!(ContinuationContext::from_json_str("{not json").is_err());
	}

	#[test]
	fn wrong_typed_key_is_invalid_context() {
		let ctx = ContinuationContext::from_json_str(r#"{"requestId": 42}"#).unwrap();
		let err = ctx.decode::<Checkpoint>().unwrap_err();
		assert!(matches!(err, StepError::InvalidContext(_)));
	}

	#[test]
	fn null_deserializes_as_empty_context() {
		let ctx: ContinuationContext = serde_json::from_str("null").unwrap();
		assert!(ctx.is_empty());
	}

	#[test]
	fn encode_skips_unset_fields() {
		let ctx = ContinuationContext::encode(&Checkpoint {
			request_id: Some("req-1".to_string()),
		})
		.unwrap();
		assert_eq!(ctx.len(), 1);
		assert_eq!(ctx.get_str("requestId"), Some("req-1"));
		assert_eq!(ctx.to_json_string(), r#"{"requestId":"req-1"}"#);
	}

	#[test]
	fn resume_point_keeps_retryable_error_with_checkpoint() {
		let err = StepError::from(crate::error::AdapterError::unavailable(
			crate::error::Service::ConfigStore,
			"throttled",
		));
		let (err, ctx) = ContinuationContext::resume_point(
			err,
			&Checkpoint {
				request_id: Some("req-3".to_string()),
			},
		);
		assert!(err.is_retryable());
		assert_eq!(ctx.get_str("requestId"), Some("req-3"));
	}

	#[test]
	fn unencodable_checkpoint_makes_failure_terminal() {
		let err = StepError::from(crate::error::AdapterError::unavailable(
			crate::error::Service::ConfigStore,
			"throttled",
		));
		let mut checkpoint = std::collections::BTreeMap::new();
		checkpoint.insert(vec![1u8], "not a string key");

		let (err, ctx) = ContinuationContext::resume_point(err, &checkpoint);
		assert!(matches!(err, StepError::InvalidContext(_)));
		assert!(!err.is_retryable());
		assert!(ctx.is_empty());
	}

	proptest! {
		#[test]
		fn caller_echo_preserves_context(
			entries in proptest::collection::btree_map("[a-zA-Z]{1,12}", "[ -~]{0,24}", 0..8)
		) {
			let map: Map<String, Value> = entries
				.into_iter()
				.map(|(k, v)| (k, Value::String(v)))
				.collect();
			let ctx = ContinuationContext::from(map);

			let echoed = ContinuationContext::from_json_str(&ctx.to_json_string()).unwrap();
			prop_assert_eq!(echoed, ctx);
		}
	}
}
