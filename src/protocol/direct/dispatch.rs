// Copyright (c) 2025 ExtDirect Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Concurrent transaction dispatch.
//!
//! Every request in a batch runs on its own task: fresh action instance,
//! context/request injection, argument decoding, invocation, and return
//! normalization. A panic or a returned error rewrites the envelope into an
//! exception; either way each task enqueues exactly one envelope on an
//! N-bounded completion channel that the collector drains in completion
//! order. A failing transaction never affects its siblings.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use futures::FutureExt;
use tokio::sync::mpsc;

use crate::error::{DirectError, LogLevel};

use super::provider::DirectServiceProvider;
use super::types::{DirectContext, RequestInfo, TransactionRequest, TransactionResponse};

impl DirectServiceProvider {
    /// Processes a batch of transaction requests, producing one response per
    /// request.
    ///
    /// `context` and `request` are injected into each per-transaction action
    /// instance when supplied. Responses arrive in completion order; clients
    /// correlate by `tid`. In-flight methods are never interrupted: there is
    /// no cancellation path, and the descriptor's `timeout` is a client-side
    /// hint only.
    pub async fn process_requests(
        &self,
        context: Option<DirectContext>,
        request: Option<RequestInfo>,
        requests: Vec<TransactionRequest>,
    ) -> Vec<TransactionResponse> {
        let total = requests.len();
        let (completions, mut collected) = mpsc::channel(total.max(1));

        for transaction in requests {
            // Resolved up front so the spawned task owns only cheap clones.
            let invoke = self.lookup(&transaction.action, &transaction.method);
            let sink = self.sink();
            let debug = self.debug_enabled();
            let profile = self.profile_enabled();
            let context = context.clone();
            let request = request.clone();
            let completions = completions.clone();

            tokio::spawn(async move {
                let mut envelope = TransactionResponse::prefilled(&transaction);
                let action = transaction.action;
                let method = transaction.method;

                let started = profile.then(Instant::now);
                let outcome = match invoke {
                    Ok(invoke) => {
                        if debug {
                            sink.message(
                                LogLevel::Debug,
                                &format!("create instance of action {action}"),
                                &[],
                            );
                            if context.is_some() || request.is_some() {
                                sink.message(LogLevel::Debug, "set action context/request", &[]);
                            }
                            sink.message(
                                LogLevel::Debug,
                                &format!("prepare arguments and call method {action}.{method}"),
                                &[],
                            );
                        }
                        AssertUnwindSafe(invoke(context, request, transaction.data))
                            .catch_unwind()
                            .await
                    }
                    Err(error) => Ok(Err(error)),
                };

                if let Some(started) = started {
                    let duration = started.elapsed();
                    sink.message(
                        LogLevel::Info,
                        &format!("{action}.{method}() {duration:?}"),
                        &[
                            ("action", action.clone()),
                            ("method", method.clone()),
                            ("duration", format!("{duration:?}")),
                        ],
                    );
                }

                match outcome {
                    Ok(Ok(result)) => envelope.result = Some(result),
                    Ok(Err(error)) => {
                        // The envelope carries the inner failure; the wrapped
                        // form goes to the sink.
                        let message = error.to_string();
                        sink.error(&DirectError::action_method(
                            action.as_str(),
                            method.as_str(),
                            false,
                            error,
                        ));
                        envelope.set_exception(message);
                    }
                    Err(payload) => {
                        let message = panic_message(payload);
                        sink.error(&DirectError::action_method(
                            action.as_str(),
                            method.as_str(),
                            true,
                            DirectError::Custom(message.clone()),
                        ));
                        envelope.set_exception(message);
                    }
                }

                // Capacity equals the batch size; the send never blocks.
                let _ = completions.send(envelope).await;
            });
        }
        drop(completions);

        let mut responses = Vec::with_capacity(total);
        while let Some(envelope) = collected.recv().await {
            responses.push(envelope);
        }
        responses
    }
}

/// Renders a recovered panic payload as the exception message.
fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(text) = payload.downcast_ref::<&'static str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "unidentified panic".to_string()
    }
}
