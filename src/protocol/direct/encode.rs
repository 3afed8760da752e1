// Copyright (c) 2025 ExtDirect Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Response encoding.
//!
//! JSON-sourced batches always serialize as an array, even for a single
//! request; a form-sourced transaction serializes as the bare envelope. The
//! difference is observable on the wire and existing clients rely on it.

use crate::error::{DirectError, DirectResult};

use super::types::{BatchSource, TransactionResponse};

/// Serializes a response sequence according to the batch source.
pub fn encode_responses(
    source: BatchSource,
    responses: &[TransactionResponse],
) -> DirectResult<String> {
    match (source, responses) {
        (BatchSource::Form, [single]) => serde_json::to_string(single),
        _ => serde_json::to_string(responses),
    }
    .map_err(DirectError::Serialization)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::direct::types::TransactionRequest;
    use serde_json::json;

    fn echo_response(tid: i64) -> TransactionResponse {
        let mut response =
            TransactionResponse::prefilled(&TransactionRequest::rpc(tid, "Db", "testEcho1", None));
        response.result = Some(json!("Hello!"));
        response
    }

    #[test]
    fn test_json_single_response_is_still_an_array() {
        let encoded = encode_responses(BatchSource::Json, &[echo_response(1)]).unwrap();
        assert_eq!(
            encoded,
            r#"[{"type":"rpc","tid":1,"action":"Db","method":"testEcho1","result":"Hello!"}]"#
        );
    }

    #[test]
    fn test_form_single_response_is_bare() {
        let encoded = encode_responses(BatchSource::Form, &[echo_response(1)]).unwrap();
        assert_eq!(
            encoded,
            r#"{"type":"rpc","tid":1,"action":"Db","method":"testEcho1","result":"Hello!"}"#
        );
    }

    #[test]
    fn test_empty_batch_encodes_as_empty_array() {
        assert_eq!(encode_responses(BatchSource::Json, &[]).unwrap(), "[]");
    }
}
