//! Ext.Direct Provider Library
//!
//! This library implements the server side of the Ext.Direct browser
//! protocol: user types register as actions, the provider serves a generated
//! API descriptor, and posted transactions dispatch concurrently to typed
//! action methods. It is designed to be embedded in a hosting application
//! that owns the HTTP server and routing.
//!
//! # Architecture
//!
//! The library is designed with the following principles in mind:
//! - Dispatch tables built once at registration, lookups on the hot path
//! - A fresh action instance per transaction, so injected context needs no
//!   synchronization
//! - One task per transaction with panic isolation: every transaction
//!   terminates with exactly one response envelope
//! - Comprehensive error handling and propagation
//! - Wire compatibility with existing Ext.Direct browser clients

// Re-export public modules
pub mod error;
pub mod protocol;

// Internal modules that are not part of the public API
#[cfg(test)]
pub(crate) mod tests;

/// Version information for the Ext.Direct provider.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
