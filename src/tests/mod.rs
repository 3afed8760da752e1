//! Crate-level test modules for the Ext.Direct provider.
//!
//! Component tests live next to their modules; this directory holds the
//! cross-cutting ones (error taxonomy, log sink behavior).
