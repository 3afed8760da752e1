// Copyright (c) 2025 ExtDirect Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! The provider registry: registered actions, their dispatch tables, and the
//! API descriptor served to the browser.
//!
//! A provider is configured and populated during startup, then shared
//! read-only behind an `Arc` for the lifetime of the process. Only the log
//! sink remains swappable afterwards.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::{default_sink, DirectError, DirectResult, LogSink};

use super::action::{DirectAction, ErasedInvoke, MethodCatalog};
use super::types::DirectMethodDescriptor;

/// Provider type advertised in the API descriptor.
const PROVIDER_TYPE: &str = "remoting";

/// Default transaction endpoint.
const DEFAULT_URL: &str = "/directapi";

/// Default client-side namespace.
const DEFAULT_NAMESPACE: &str = "DirectApi";

/// Default client-side timeout hint, in milliseconds.
const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// One registered action: its serialized method descriptors in catalog order
/// and the wire-name dispatch table.
pub(crate) struct ActionDescriptor {
    pub(crate) name: String,
    pub(crate) descriptors: Vec<DirectMethodDescriptor>,
    pub(crate) methods: HashMap<String, ErasedInvoke>,
}

/// The Ext.Direct remoting provider.
///
/// Holds the registered actions and the descriptor fields embedded in the API
/// script. `timeout` is a client-side hint; the server enforces nothing.
pub struct DirectServiceProvider {
    id: Option<String>,
    kind: String,
    url: String,
    namespace: String,
    timeout: u64,
    debug: bool,
    profile: bool,
    actions: Vec<ActionDescriptor>,
    index: HashMap<String, usize>,
    sink: RwLock<Arc<dyn LogSink>>,
}

impl DirectServiceProvider {
    /// Creates a provider with the protocol defaults.
    pub fn new() -> Self {
        Self {
            id: None,
            kind: PROVIDER_TYPE.to_string(),
            url: DEFAULT_URL.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            timeout: DEFAULT_TIMEOUT_MS,
            debug: false,
            profile: false,
            actions: Vec::new(),
            index: HashMap::new(),
            sink: RwLock::new(default_sink()),
        }
    }

    /// Sets the optional provider id advertised in the descriptor.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Overrides the transaction endpoint URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Overrides the client-side namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Overrides the client-side timeout hint, in milliseconds.
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout = timeout_ms;
        self
    }

    /// Toggles dispatch narration through the log sink.
    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    /// Toggles per-invocation duration logging.
    pub fn set_profile(&mut self, profile: bool) {
        self.profile = profile;
    }

    /// Replaces the log sink. Safe to call while transactions are in flight.
    pub fn set_log_sink(&self, sink: Arc<dyn LogSink>) {
        *self.sink.write() = sink;
    }

    /// The transaction endpoint URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The client-side namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The client-side timeout hint, in milliseconds.
    pub fn timeout(&self) -> u64 {
        self.timeout
    }

    /// The optional provider id.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Registers an action under its name.
    ///
    /// Idempotent: a repeat registration of the same action name is a silent
    /// no-op.
    pub fn register_action<A: DirectAction>(&mut self) {
        let name = A::action_name();
        if self.index.contains_key(name) {
            return;
        }

        let mut catalog = MethodCatalog::new();
        A::register_methods(&mut catalog);
        let entries = catalog.into_entries();

        let mut descriptors = Vec::with_capacity(entries.len());
        let mut methods = HashMap::with_capacity(entries.len());
        for entry in entries {
            descriptors.push(entry.descriptor);
            methods.insert(entry.wire_name, entry.invoke);
        }

        self.index.insert(name.to_string(), self.actions.len());
        self.actions.push(ActionDescriptor {
            name: name.to_string(),
            descriptors,
            methods,
        });
    }

    /// Serializes the provider descriptor as canonical JSON.
    ///
    /// Actions appear in registration insertion order, method descriptors in
    /// catalog order.
    pub fn describe_json(&self) -> DirectResult<String> {
        let descriptor = ProviderDescriptor {
            id: self.id.as_deref(),
            kind: &self.kind,
            url: &self.url,
            namespace: &self.namespace,
            timeout: self.timeout,
            actions: ActionsMap(&self.actions),
        };
        serde_json::to_string(&descriptor).map_err(DirectError::Serialization)
    }

    /// Renders the API script the browser loads:
    /// `Ext.ns("<ns>");<ns>.REMOTE_API=<descriptor>`.
    pub fn describe_script(&self) -> DirectResult<String> {
        let descriptor = self.describe_json()?;
        Ok(format!(
            "Ext.ns(\"{ns}\");{ns}.REMOTE_API={descriptor}",
            ns = self.namespace
        ))
    }

    /// Resolves the invoker for a wire `action`/`method` pair.
    pub(crate) fn lookup(&self, action: &str, method: &str) -> DirectResult<ErasedInvoke> {
        let descriptor = self
            .index
            .get(action)
            .map(|&slot| &self.actions[slot])
            .ok_or_else(|| DirectError::Custom(format!("action {action} is not registered")))?;
        descriptor
            .methods
            .get(method)
            .cloned()
            .ok_or_else(|| {
                DirectError::Custom(format!(
                    "method {method} is not registered on action {action}"
                ))
            })
    }

    pub(crate) fn sink(&self) -> Arc<dyn LogSink> {
        Arc::clone(&self.sink.read())
    }

    pub(crate) fn debug_enabled(&self) -> bool {
        self.debug
    }

    pub(crate) fn profile_enabled(&self) -> bool {
        self.profile
    }
}

impl Default for DirectServiceProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DirectServiceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectServiceProvider")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("url", &self.url)
            .field("namespace", &self.namespace)
            .field("timeout", &self.timeout)
            .field("debug", &self.debug)
            .field("profile", &self.profile)
            .field("actions", &self.actions.iter().map(|a| &a.name).collect::<Vec<_>>())
            .finish()
    }
}

/// Borrowed serialization view of the provider descriptor.
///
/// Field order is part of the wire contract.
#[derive(serde::Serialize)]
struct ProviderDescriptor<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    #[serde(rename = "type")]
    kind: &'a str,
    url: &'a str,
    namespace: &'a str,
    timeout: u64,
    actions: ActionsMap<'a>,
}

/// Serializes the registered actions as a map in insertion order.
struct ActionsMap<'a>(&'a [ActionDescriptor]);

impl Serialize for ActionsMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for action in self.0 {
            map.serialize_entry(&action.name, &action.descriptors)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as StdHashMap;

    use crate::protocol::direct::types::FormHandlerResult;

    #[derive(Default)]
    struct Library;

    impl DirectAction for Library {
        fn register_methods(catalog: &mut MethodCatalog<Self>) {
            catalog.rpc("GetTitles", |_: Library, query: String| async move {
                vec![format!("title matching {query}")]
            });
            catalog.rpc("Refresh", |_: Library| async move {});
            catalog.form_handler(
                "UpdateInfo",
                |_: Library, _fields: StdHashMap<String, String>| async move {
                    FormHandlerResult::success()
                },
            );
        }
    }

    #[test]
    fn test_default_descriptor_serialization() {
        let provider = DirectServiceProvider::new();
        assert_eq!(
            provider.describe_json().unwrap(),
            r#"{"type":"remoting","url":"/directapi","namespace":"DirectApi","timeout":30000,"actions":{}}"#
        );
    }

    #[test]
    fn test_registered_descriptor_serialization() {
        let mut provider = DirectServiceProvider::new();
        provider.register_action::<Library>();

        assert_eq!(
            provider.describe_json().unwrap(),
            r#"{"type":"remoting","url":"/directapi","namespace":"DirectApi","timeout":30000,"actions":{"Library":[{"name":"getTitles","len":1},{"name":"refresh","len":0},{"name":"updateInfo","formHander":true}]}}"#
        );
    }

    #[test]
    fn test_api_script_rendering() {
        let provider = DirectServiceProvider::new();
        assert_eq!(
            provider.describe_script().unwrap(),
            r#"Ext.ns("DirectApi");DirectApi.REMOTE_API={"type":"remoting","url":"/directapi","namespace":"DirectApi","timeout":30000,"actions":{}}"#
        );
    }

    #[test]
    fn test_duplicate_registration_is_ignored() {
        let mut provider = DirectServiceProvider::new();
        provider.register_action::<Library>();
        let first = provider.describe_json().unwrap();

        provider.register_action::<Library>();
        assert_eq!(provider.describe_json().unwrap(), first);
    }

    #[test]
    fn test_configured_descriptor_fields() {
        let provider = DirectServiceProvider::new()
            .with_id("main")
            .with_url("/rpc")
            .with_namespace("Remote")
            .with_timeout(5_000);

        assert_eq!(
            provider.describe_json().unwrap(),
            r#"{"id":"main","type":"remoting","url":"/rpc","namespace":"Remote","timeout":5000,"actions":{}}"#
        );
        assert_eq!(provider.url(), "/rpc");
        assert_eq!(provider.namespace(), "Remote");
        assert_eq!(provider.timeout(), 5_000);
        assert_eq!(provider.id(), Some("main"));
    }

    #[test]
    fn test_lookup_misses() {
        let mut provider = DirectServiceProvider::new();
        provider.register_action::<Library>();

        let err = provider.lookup("Nope", "getTitles").err().unwrap();
        assert!(err.to_string().contains("action Nope is not registered"));

        let err = provider.lookup("Library", "nope").err().unwrap();
        assert!(err
            .to_string()
            .contains("method nope is not registered on action Library"));

        assert!(provider.lookup("Library", "getTitles").is_ok());
    }
}
