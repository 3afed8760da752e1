// Copyright (c) 2025 ExtDirect Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Transaction decoding: JSON and form-encoded bodies into normalized
//! transaction requests.
//!
//! A JSON body is either a batch array or a single request object; both
//! normalize to a request sequence. A form-encoded body carries the envelope
//! in the reserved `ext*` keys and the payload in everything else.

use serde_json::{Map, Value};

use crate::error::{DirectError, DirectResult};

use super::types::{BatchSource, TransactionBatch, TransactionRequest};

/// Content-type prefix accepted for JSON transactions.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Content-type prefix accepted for form transactions.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Form keys that make up the transaction envelope rather than the payload.
const RESERVED_FORM_KEYS: [&str; 5] = ["extType", "extTID", "extAction", "extMethod", "extUpload"];

/// Decodes a transaction body according to its content type.
pub fn decode_transactions(content_type: &str, body: &[u8]) -> DirectResult<TransactionBatch> {
    if content_type.starts_with(JSON_CONTENT_TYPE) {
        Ok(TransactionBatch {
            source: BatchSource::Json,
            requests: decode_json_transactions(body)?,
        })
    } else if content_type.starts_with(FORM_CONTENT_TYPE) {
        Ok(TransactionBatch {
            source: BatchSource::Form,
            requests: vec![decode_form_transaction(body)?],
        })
    } else {
        Err(DirectError::ContentType(content_type.to_string()))
    }
}

/// Decodes a JSON body: a batch array, or a single request wrapped into a
/// one-element sequence.
pub fn decode_json_transactions(body: &[u8]) -> DirectResult<Vec<TransactionRequest>> {
    match serde_json::from_slice::<Vec<TransactionRequest>>(body) {
        Ok(requests) => Ok(requests),
        Err(_) => serde_json::from_slice::<TransactionRequest>(body)
            .map(|request| vec![request])
            .map_err(DirectError::Parse),
    }
}

/// Decodes a form-encoded body into one transaction request.
///
/// Reserved keys form the envelope; every non-reserved key contributes its
/// first value to the `data` mapping.
pub fn decode_form_transaction(body: &[u8]) -> DirectResult<TransactionRequest> {
    let mut kind: Option<String> = None;
    let mut tid: Option<String> = None;
    let mut action: Option<String> = None;
    let mut method: Option<String> = None;
    let mut upload: Option<String> = None;
    let mut data = Map::new();

    for (key, value) in form_urlencoded::parse(body) {
        let slot = match key.as_ref() {
            "extType" => &mut kind,
            "extTID" => &mut tid,
            "extAction" => &mut action,
            "extMethod" => &mut method,
            "extUpload" => &mut upload,
            _ => {
                // First value wins for repeated payload keys.
                data.entry(key.into_owned())
                    .or_insert_with(|| Value::String(value.into_owned()));
                continue;
            }
        };
        if slot.is_none() {
            *slot = Some(value.into_owned());
        }
    }
    debug_assert!(RESERVED_FORM_KEYS.iter().all(|key| !data.contains_key(*key)));

    let tid = tid.ok_or_else(|| DirectError::FormDecode("missing extTID".to_string()))?;
    let tid = tid
        .parse::<i64>()
        .map_err(|_| DirectError::FormDecode(format!("invalid extTID: {tid}")))?;

    Ok(TransactionRequest {
        kind: kind.unwrap_or_default(),
        tid,
        action: action.unwrap_or_default(),
        method: method.unwrap_or_default(),
        upload: upload
            .map(|value| value.to_lowercase() == "true")
            .unwrap_or(false),
        data: Some(Value::Object(data)),
    })
}
