//! Protocol module for the Ext.Direct provider.
//!
//! This module implements the Ext.Direct browser protocol: action
//! registration, the API descriptor, and the concurrent transaction pipeline.

// Ext.Direct remoting implementation
pub mod direct;

// Re-export common protocol components
pub use self::direct::{DirectAction, DirectServiceProvider, MethodCatalog};
