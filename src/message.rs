//! Request/response value objects exchanged with the worker service.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Well-known payload key carrying an operation's primary string argument
/// and its primary result.
pub const DATA_KEY: &str = "data";

/// Operation kinds understood by the worker service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationKind {
    /// Reverse the string stored under [`DATA_KEY`].
    ReverseText,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::ReverseText => write!(f, "REVERSE_TEXT"),
        }
    }
}

/// String-keyed bag of JSON values attached to requests and responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(BTreeMap<String, Value>);

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of a string value.
    pub fn with_str(mut self, key: &str, value: impl Into<String>) -> Self {
        self.0.insert(key.to_string(), Value::String(value.into()));
        self
    }

    pub fn insert(&mut self, key: &str, value: Value) {
        self.0.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The string stored under `key`, if present and a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A unit of work submitted to the worker service. Ids are assigned by the
/// dispatcher and stay unique for its lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRequest {
    pub id: u64,
    pub operation: OperationKind,
    #[serde(default)]
    pub payload: Payload,
}

impl ServiceRequest {
    pub fn new(id: u64, operation: OperationKind, payload: Payload) -> Self {
        Self { id, operation, payload }
    }
}

/// The result of processing a [`ServiceRequest`], tagged with the
/// originating id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceResponse {
    pub request_id: u64,
    #[serde(default)]
    pub payload: Payload,
}

impl ServiceResponse {
    pub fn new(request_id: u64, payload: Payload) -> Self {
        Self { request_id, payload }
    }

    /// Response with an empty payload, used when an operation produced no
    /// result.
    pub fn empty(request_id: u64) -> Self {
        Self { request_id, payload: Payload::new() }
    }

    /// True when this response answers the request with the given id.
    /// Observers use this to filter out responses they are not tracking.
    pub fn responds_to(&self, request_id: u64) -> bool {
        self.request_id == request_id
    }
}
