// Copyright (c) 2025 ExtDirect Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Wire types for the Ext.Direct protocol.
//!
//! This module defines the transaction request/response envelopes, the method
//! descriptors embedded in the API descriptor, the form-handler result shape,
//! and the per-request context/request values injected into action instances.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Transaction type marker for remote procedure calls.
pub const TRANSACTION_RPC: &str = "rpc";

/// Transaction type marker for exception responses.
pub const TRANSACTION_EXCEPTION: &str = "exception";

/// A single Ext.Direct transaction request.
///
/// `data` is a positional argument array for RPC calls and a string-to-string
/// object for form handlers. Absent fields default to their zero values, the
/// way the browser client omits them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRequest {
    /// Transaction type, `"rpc"` for calls issued by the client.
    #[serde(rename = "type", default)]
    pub kind: String,

    /// Client-chosen transaction identifier, echoed in the response.
    #[serde(default)]
    pub tid: i64,

    /// Registered action name.
    #[serde(default)]
    pub action: String,

    /// Wire method name.
    #[serde(default)]
    pub method: String,

    /// Upload marker set by form submissions.
    #[serde(default)]
    pub upload: bool,

    /// Method payload, shape depends on the method kind.
    #[serde(default)]
    pub data: Option<Value>,
}

impl TransactionRequest {
    /// Creates an RPC transaction request.
    pub fn rpc(
        tid: i64,
        action: impl Into<String>,
        method: impl Into<String>,
        data: Option<Value>,
    ) -> Self {
        Self {
            kind: TRANSACTION_RPC.to_string(),
            tid,
            action: action.into(),
            method: method.into(),
            upload: false,
            data,
        }
    }
}

/// A single Ext.Direct transaction response.
///
/// Field order is part of the wire contract: `type, tid, action, method,
/// message?, result?`. `message` is present only on exceptions; `result` is
/// omitted when unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionResponse {
    /// `"rpc"` on success (echoing the request type), `"exception"` on failure.
    #[serde(rename = "type", default)]
    pub kind: String,

    /// Transaction identifier from the matching request.
    #[serde(default)]
    pub tid: i64,

    /// Action name from the matching request.
    #[serde(default)]
    pub action: String,

    /// Wire method name from the matching request.
    #[serde(default)]
    pub method: String,

    /// Stringified failure, present only when `kind` is `"exception"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Method result, present on success (may be JSON null).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

impl TransactionResponse {
    /// Creates a response envelope prefilled from the matching request.
    ///
    /// The envelope starts as a success of the request's type with no result;
    /// the dispatcher fills in `result` or rewrites it to an exception.
    pub fn prefilled(request: &TransactionRequest) -> Self {
        Self {
            kind: request.kind.clone(),
            tid: request.tid,
            action: request.action.clone(),
            method: request.method.clone(),
            message: None,
            result: None,
        }
    }

    /// Rewrites this envelope into an exception carrying `message`.
    pub fn set_exception(&mut self, message: impl Into<String>) {
        self.kind = TRANSACTION_EXCEPTION.to_string();
        self.message = Some(message.into());
        self.result = None;
    }

    /// Returns true if this envelope reports an exception.
    pub fn is_exception(&self) -> bool {
        self.kind == TRANSACTION_EXCEPTION
    }
}

/// Serialized descriptor of one exposed method, embedded in the API script.
///
/// Exactly one of `len` and `form_handler` is present. The form-handler key is
/// spelled `formHander` on the wire; existing browser clients depend on the
/// misspelling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectMethodDescriptor {
    /// Wire method name (first code unit lower-cased).
    pub name: String,

    /// Declared parameter count for RPC methods.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub len: Option<usize>,

    /// Form-handler marker.
    #[serde(
        rename = "formHander",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub form_handler: Option<bool>,
}

impl DirectMethodDescriptor {
    /// Descriptor for an RPC method of the given arity.
    pub fn rpc(name: impl Into<String>, len: usize) -> Self {
        Self {
            name: name.into(),
            len: Some(len),
            form_handler: None,
        }
    }

    /// Descriptor for a form handler.
    pub fn form(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            len: None,
            form_handler: Some(true),
        }
    }
}

/// Result envelope returned by form handlers.
///
/// Serializes as `{"success":true}` or
/// `{"errors":{"field":"reason"},"success":false}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormHandlerResult {
    /// Per-field validation failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<HashMap<String, String>>,

    /// Whether the submission was accepted.
    pub success: bool,
}

impl FormHandlerResult {
    /// Successful submission.
    pub fn success() -> Self {
        Self {
            errors: None,
            success: true,
        }
    }

    /// Rejected submission with one or more field errors.
    pub fn failure(errors: HashMap<String, String>) -> Self {
        Self {
            errors: Some(errors),
            success: false,
        }
    }

    /// Adds a field error and marks the submission rejected.
    pub fn with_error(mut self, field: impl Into<String>, reason: impl Into<String>) -> Self {
        self.errors
            .get_or_insert_with(HashMap::new)
            .insert(field.into(), reason.into());
        self.success = false;
        self
    }
}

/// Per-request context injected into action instances that opt in.
///
/// Carries the routing parameters and arbitrary values the host attached to
/// the request.
#[derive(Debug, Clone, Default)]
pub struct DirectContext {
    url_params: HashMap<String, String>,
    values: HashMap<String, Value>,
}

impl DirectContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a routing parameter.
    pub fn with_url_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.url_params.insert(name.into(), value.into());
        self
    }

    /// Adds an arbitrary host value.
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Looks up a routing parameter.
    pub fn url_param(&self, name: &str) -> Option<&str> {
        self.url_params.get(name).map(String::as_str)
    }

    /// Looks up a host value.
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }
}

/// Snapshot of the HTTP request injected into action instances that opt in.
#[derive(Debug, Clone, Default)]
pub struct RequestInfo {
    /// Value of the `Host` header.
    pub host: String,

    /// Request target as sent by the client.
    pub uri: String,

    /// Request headers, first value per name.
    pub headers: HashMap<String, String>,
}

/// Where a decoded batch came from; decides the response wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchSource {
    /// JSON body: the response is always an array.
    Json,
    /// Form-encoded body: the single response envelope is emitted bare.
    Form,
}

/// A decoded batch of transaction requests tagged with its source.
#[derive(Debug, Clone)]
pub struct TransactionBatch {
    /// Wire format the batch was decoded from.
    pub source: BatchSource,
    /// The normalized transaction requests.
    pub requests: Vec<TransactionRequest>,
}
