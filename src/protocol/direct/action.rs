// Copyright (c) 2025 ExtDirect Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Action blueprints and their method catalogs.
//!
//! An action is a plain type whose methods are callable from the browser by
//! wire name. Registration enumerates the methods into a [`MethodCatalog`],
//! which records for each one its wire name (first code unit lower-cased), its
//! declared arity, its form-handler flag, and an invocation closure with the
//! per-parameter wire decoders already resolved. The dispatcher's hot path
//! then performs table lookups and direct calls only.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt::Display;
use std::future::{ready, Future};
use std::marker::PhantomData;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{DirectError, DirectResult};

use super::args::{convert_arg, form_args, rpc_args};
use super::types::{DirectContext, DirectMethodDescriptor, RequestInfo};

/// A blueprint type exposing methods to the Ext.Direct client.
///
/// The dispatcher constructs a fresh instance per transaction via `Default`,
/// offers it the per-request context and HTTP request through the two inject
/// hooks, and hands it to the invoked method by value. Because every
/// transaction gets its own instance, the hooks may store the injected values
/// in plain fields without any synchronization.
pub trait DirectAction: Default + Sized + Send + 'static {
    /// Name the action is registered under; keys the `actions` map of the API
    /// descriptor. Defaults to the bare type name.
    fn action_name() -> &'static str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    /// Enumerates the methods this action exposes.
    fn register_methods(catalog: &mut MethodCatalog<Self>);

    /// Receives the per-request context when the caller supplied one.
    fn inject_context(&mut self, _context: &DirectContext) {}

    /// Receives the HTTP request snapshot when the caller supplied one.
    fn inject_request(&mut self, _request: &RequestInfo) {}
}

/// Derives the wire name of a method: the first code unit lower-cased.
pub fn wire_method_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Marker for methods returning a plain serializable value.
pub struct PlainReturn;

/// Marker for methods returning `Result<T, E>`.
pub struct FallibleReturn;

/// Normalizes a method's return value into a wire result.
///
/// The marker parameter lets the plain-value and `Result` shapes coexist; it
/// is inferred at registration and never named by callers.
pub trait IntoDirectResult<Marker> {
    /// Converts the return value into a serialized result or a failure.
    fn into_direct_result(self) -> DirectResult<Value>;
}

impl<T> IntoDirectResult<PlainReturn> for T
where
    T: Serialize + 'static,
{
    fn into_direct_result(self) -> DirectResult<Value> {
        // A method with nothing to return surfaces an empty string on the wire.
        if TypeId::of::<T>() == TypeId::of::<()>() {
            return Ok(Value::String(String::new()));
        }
        serde_json::to_value(self).map_err(DirectError::Serialization)
    }
}

impl<T, E> IntoDirectResult<FallibleReturn> for Result<T, E>
where
    T: IntoDirectResult<PlainReturn>,
    E: Display,
{
    fn into_direct_result(self) -> DirectResult<Value> {
        match self {
            Ok(value) => value.into_direct_result(),
            Err(error) => Err(DirectError::Custom(error.to_string())),
        }
    }
}

/// An invocable RPC method of action `A`.
///
/// Implemented for async functions and closures `Fn(A, T1, …, Tn) -> Future`
/// where every parameter type carries a wire decoder. The marker parameter
/// captures the parameter tuple and return shape for inference.
pub trait DirectMethod<A, Marker>: Send + Sync + 'static {
    /// Declared parameter count, excluding the action receiver.
    const ARITY: usize;

    /// Decodes the positional arguments and invokes the method.
    fn invoke(&self, action: A, args: Vec<Value>) -> BoxFuture<'static, DirectResult<Value>>;
}

macro_rules! count_params {
    () => { 0 };
    ($head:ident $($tail:ident)*) => { 1 + count_params!($($tail)*) };
}

macro_rules! impl_direct_method {
    ($($param:ident),*) => {
        #[allow(non_snake_case, unused_mut, unused_variables)]
        impl<A, F, Fut, R, M, $($param,)*> DirectMethod<A, (M, $($param,)*)> for F
        where
            A: DirectAction,
            F: Fn(A, $($param,)*) -> Fut + Send + Sync + 'static,
            Fut: Future<Output = R> + Send + 'static,
            R: IntoDirectResult<M> + 'static,
            $($param: DeserializeOwned + Send + 'static,)*
        {
            const ARITY: usize = count_params!($($param)*);

            fn invoke(&self, action: A, args: Vec<Value>) -> BoxFuture<'static, DirectResult<Value>> {
                let mut args = args.into_iter();
                $(
                    let $param: $param = match convert_arg(args.next().unwrap_or(Value::Null)) {
                        Ok(value) => value,
                        Err(error) => return Box::pin(ready(Err(error))),
                    };
                )*
                let invocation = (self)(action, $($param,)*);
                Box::pin(async move { invocation.await.into_direct_result() })
            }
        }
    };
}

impl_direct_method!();
impl_direct_method!(T1);
impl_direct_method!(T1, T2);
impl_direct_method!(T1, T2, T3);
impl_direct_method!(T1, T2, T3, T4);
impl_direct_method!(T1, T2, T3, T4, T5);
impl_direct_method!(T1, T2, T3, T4, T5, T6);
impl_direct_method!(T1, T2, T3, T4, T5, T6, T7);
impl_direct_method!(T1, T2, T3, T4, T5, T6, T7, T8);

/// Type-erased invocation closure stored in the registry.
///
/// Owns instance construction, context/request injection, argument decoding,
/// the user call, and return normalization.
pub(crate) type ErasedInvoke = Arc<
    dyn Fn(
            Option<DirectContext>,
            Option<RequestInfo>,
            Option<Value>,
        ) -> BoxFuture<'static, DirectResult<Value>>
        + Send
        + Sync,
>;

/// One registered method: its wire descriptor plus the erased invoker.
pub(crate) struct CatalogEntry {
    pub(crate) wire_name: String,
    pub(crate) descriptor: DirectMethodDescriptor,
    pub(crate) invoke: ErasedInvoke,
}

/// The method catalog an action fills in during registration.
pub struct MethodCatalog<A: DirectAction> {
    entries: Vec<CatalogEntry>,
    _marker: PhantomData<fn() -> A>,
}

impl<A: DirectAction> MethodCatalog<A> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Registers an RPC method under `name`.
    ///
    /// The descriptor advertises the method's declared arity as `len`.
    pub fn rpc<F, M>(&mut self, name: &str, method: F) -> &mut Self
    where
        F: DirectMethod<A, M>,
    {
        let wire_name = wire_method_name(name);
        let descriptor =
            DirectMethodDescriptor::rpc(wire_name.clone(), <F as DirectMethod<A, M>>::ARITY);
        let invoke = Self::erase_rpc(method);
        self.entries.push(CatalogEntry {
            wire_name,
            descriptor,
            invoke,
        });
        self
    }

    /// Registers a form handler under `name`.
    ///
    /// The method receives the submitted fields as a string-to-string map; the
    /// descriptor advertises the form-handler flag instead of an arity.
    pub fn form_handler<F, Fut, R, M>(&mut self, name: &str, method: F) -> &mut Self
    where
        F: Fn(A, HashMap<String, String>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoDirectResult<M> + 'static,
    {
        let wire_name = wire_method_name(name);
        let descriptor = DirectMethodDescriptor::form(wire_name.clone());
        let invoke: ErasedInvoke = Arc::new(move |context, request, data| {
            let mut action = A::default();
            if let Some(context) = context.as_ref() {
                action.inject_context(context);
            }
            if let Some(request) = request.as_ref() {
                action.inject_request(request);
            }
            match form_args(data) {
                Ok(fields) => {
                    let invocation = method(action, fields);
                    Box::pin(async move { invocation.await.into_direct_result() })
                }
                Err(error) => Box::pin(ready(Err(error))),
            }
        });
        self.entries.push(CatalogEntry {
            wire_name,
            descriptor,
            invoke,
        });
        self
    }

    pub(crate) fn into_entries(self) -> Vec<CatalogEntry> {
        self.entries
    }

    fn erase_rpc<F, M>(method: F) -> ErasedInvoke
    where
        F: DirectMethod<A, M>,
    {
        let arity = <F as DirectMethod<A, M>>::ARITY;
        Arc::new(move |context, request, data| {
            let mut action = A::default();
            if let Some(context) = context.as_ref() {
                action.inject_context(context);
            }
            if let Some(request) = request.as_ref() {
                action.inject_request(request);
            }
            match rpc_args(data, arity) {
                Ok(args) => method.invoke(action, args),
                Err(error) => Box::pin(ready(Err(error))),
            }
        })
    }
}
