// Copyright (c) 2025 ExtDirect Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! HTTP boundary handlers.
//!
//! Two handlers glue the provider to an axum mux: a GET handler serving the
//! generated API script, and a POST handler running the transaction pipeline.
//! The `_ctx` variant threads a [`DirectContext`] found in the request
//! extensions, for hosts whose middleware attaches per-request context.
//!
//! Boundary failures (content type, parse, form decode, serialization) are
//! logged through the provider's sink and surface as a 500 response; they
//! never produce per-transaction exception envelopes.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::to_bytes;
use axum::extract::{Request, State};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use crate::error::DirectError;

use super::decode::decode_transactions;
use super::encode::encode_responses;
use super::provider::DirectServiceProvider;
use super::types::{DirectContext, RequestInfo};

/// Content type of the API script endpoint.
pub const API_CONTENT_TYPE: &str = "text/javascript; charset=utf-8";

/// Content type of the transaction endpoint.
pub const ACTIONS_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Rejection for failures at the HTTP boundary; renders as a 500.
#[derive(Debug)]
pub struct BoundaryError(DirectError);

impl IntoResponse for BoundaryError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, self.0.to_string()).into_response()
    }
}

/// GET handler serving the generated API script.
pub async fn api_handler(
    State(provider): State<Arc<DirectServiceProvider>>,
) -> Result<impl IntoResponse, BoundaryError> {
    let script = provider
        .describe_script()
        .map_err(|error| reject(&provider, error))?;
    Ok(([(header::CONTENT_TYPE, API_CONTENT_TYPE)], script))
}

/// POST handler running the transaction pipeline without host context.
pub async fn actions_handler(
    State(provider): State<Arc<DirectServiceProvider>>,
    request: Request,
) -> Result<Response, BoundaryError> {
    handle_actions(&provider, None, request).await
}

/// POST handler running the transaction pipeline with the [`DirectContext`]
/// installed in the request extensions, if any.
pub async fn actions_handler_ctx(
    State(provider): State<Arc<DirectServiceProvider>>,
    request: Request,
) -> Result<Response, BoundaryError> {
    let context = request.extensions().get::<DirectContext>().cloned();
    handle_actions(&provider, context, request).await
}

/// Builds a router serving the API script and transactions at the provider's
/// configured URL.
pub fn router(provider: Arc<DirectServiceProvider>) -> Router {
    let path = provider.url().to_string();
    Router::new()
        .route(&path, get(api_handler).post(actions_handler_ctx))
        .with_state(provider)
}

async fn handle_actions(
    provider: &DirectServiceProvider,
    context: Option<DirectContext>,
    request: Request,
) -> Result<Response, BoundaryError> {
    let (parts, body) = request.into_parts();
    let content_type = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let info = request_info(&parts);

    let body = to_bytes(body, usize::MAX).await.map_err(|error| {
        reject(
            provider,
            DirectError::Custom(format!("cannot read request body: {error}")),
        )
    })?;
    let batch =
        decode_transactions(&content_type, &body).map_err(|error| reject(provider, error))?;

    let responses = provider
        .process_requests(context, Some(info), batch.requests)
        .await;

    let payload =
        encode_responses(batch.source, &responses).map_err(|error| reject(provider, error))?;
    Ok(([(header::CONTENT_TYPE, ACTIONS_CONTENT_TYPE)], payload).into_response())
}

/// Snapshots the request parts the dispatcher injects into action instances.
fn request_info(parts: &Parts) -> RequestInfo {
    let mut headers = HashMap::new();
    for (name, value) in parts.headers.iter() {
        if let Ok(text) = value.to_str() {
            headers
                .entry(name.as_str().to_string())
                .or_insert_with(|| text.to_string());
        }
    }

    RequestInfo {
        host: parts
            .headers
            .get(header::HOST)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string(),
        uri: parts.uri.to_string(),
        headers,
    }
}

fn reject(provider: &DirectServiceProvider, error: DirectError) -> BoundaryError {
    provider.sink().error(&error);
    BoundaryError(error)
}
