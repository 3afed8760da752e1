// Copyright (c) 2025 ExtDirect Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Ext.Direct remoting provider.
//!
//! This module implements the server side of the Ext.Direct browser protocol:
//! action registration with a generated API descriptor, and a concurrent
//! transaction pipeline turning JSON or form-encoded requests into method
//! invocations with typed arguments.
//!
//! # Features
//!
//! - Action registration with wire-name derivation and arity introspection
//! - Batch and single transaction decoding, JSON and form-encoded
//! - Typed argument marshalling with numeric narrowing and null substitution
//! - One concurrent task per transaction with panic-to-exception trapping
//! - Per-request context and HTTP request injection into action instances
//! - Optional dispatch narration and per-invocation profiling
//! - Axum handlers for the API script and transaction endpoints
//!
//! # Example
//!
//! ```
//! use extdirect::protocol::direct::{
//!     DirectAction, DirectServiceProvider, MethodCatalog, TransactionRequest,
//! };
//!
//! #[derive(Default)]
//! struct Greeter;
//!
//! impl DirectAction for Greeter {
//!     fn register_methods(catalog: &mut MethodCatalog<Self>) {
//!         catalog.rpc("Hello", |_: Greeter, name: String| async move {
//!             format!("Hello, {name}!")
//!         });
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let mut provider = DirectServiceProvider::new();
//! provider.register_action::<Greeter>();
//!
//! let request = TransactionRequest::rpc(
//!     1,
//!     "Greeter",
//!     "hello",
//!     Some(serde_json::json!(["World"])),
//! );
//! let responses = provider.process_requests(None, None, vec![request]).await;
//!
//! assert_eq!(responses[0].result, Some(serde_json::json!("Hello, World!")));
//! # }
//! ```

pub mod action;
pub mod args;
pub mod decode;
pub mod dispatch;
pub mod encode;
pub mod handlers;
pub mod provider;
pub mod types;

// Re-exports
pub use action::{
    wire_method_name, DirectAction, DirectMethod, FallibleReturn, IntoDirectResult, MethodCatalog,
    PlainReturn,
};
pub use args::convert_arg;
pub use decode::{
    decode_form_transaction, decode_json_transactions, decode_transactions, FORM_CONTENT_TYPE,
    JSON_CONTENT_TYPE,
};
pub use encode::encode_responses;
pub use handlers::{
    actions_handler, actions_handler_ctx, api_handler, router, BoundaryError,
    ACTIONS_CONTENT_TYPE, API_CONTENT_TYPE,
};
pub use provider::DirectServiceProvider;
pub use types::{
    BatchSource, DirectContext, DirectMethodDescriptor, FormHandlerResult, RequestInfo,
    TransactionBatch, TransactionRequest, TransactionResponse, TRANSACTION_EXCEPTION,
    TRANSACTION_RPC,
};

#[cfg(test)]
mod tests;
