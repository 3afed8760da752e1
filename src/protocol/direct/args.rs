// Copyright (c) 2025 ExtDirect Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Argument marshalling between wire JSON and declared parameter types.
//!
//! RPC arguments arrive as loosely typed JSON and must land in statically
//! declared parameter types. The conversion rules, applied in order:
//!
//! 1. A value whose JSON type already matches the parameter deserializes
//!    directly; JSON objects recurse into record types by field name.
//! 2. A JSON number aimed at a narrower signed integer width truncates toward
//!    zero; aimed at `f32` it narrows.
//! 3. JSON null substitutes the zero value: numeric 0, empty string, `None`.
//! 4. Anything else fails with a type-conversion error naming both sides.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{DirectError, DirectResult};

/// Returns the JSON type name of a value, for conversion diagnostics.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Converts one positional wire argument into the declared parameter type.
pub fn convert_arg<T: DeserializeOwned>(value: Value) -> DirectResult<T> {
    if let Ok(converted) = serde_json::from_value::<T>(value.clone()) {
        return Ok(converted);
    }

    match &value {
        // Truncation toward zero, not rounding: JSON numbers are f64 and the
        // narrower widths take the integral part.
        Value::Number(number) => {
            if let Some(float) = number.as_f64() {
                let truncated = float.trunc() as i64;
                if let Ok(converted) = serde_json::from_value::<T>(Value::from(truncated)) {
                    return Ok(converted);
                }
            }
        }
        // Null substitutes the target's zero value where one exists.
        Value::Null => {
            for zero in [Value::from(0), Value::String(String::new())] {
                if let Ok(converted) = serde_json::from_value::<T>(zero) {
                    return Ok(converted);
                }
            }
        }
        _ => {}
    }

    Err(DirectError::TypeConversion {
        source_type: json_type_name(&value).to_string(),
        target_type: std::any::type_name::<T>().to_string(),
    })
}

/// Normalizes RPC `data` into a positional argument vector of exactly `arity`
/// values.
///
/// Absent data yields an empty vector for nullary methods and null padding
/// otherwise, so the null-substitution rule applies per parameter. More wire
/// arguments than declared parameters fail the transaction.
pub(crate) fn rpc_args(data: Option<Value>, arity: usize) -> DirectResult<Vec<Value>> {
    let mut args = match data {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(values)) => values,
        Some(other) => {
            return Err(DirectError::TypeConversion {
                source_type: json_type_name(&other).to_string(),
                target_type: "positional argument array".to_string(),
            })
        }
    };

    if args.len() > arity {
        return Err(DirectError::Custom(format!(
            "method expects {} arguments, got {}",
            arity,
            args.len()
        )));
    }
    args.resize(arity, Value::Null);
    Ok(args)
}

/// Normalizes form-handler `data` into the string-to-string field map.
pub(crate) fn form_args(data: Option<Value>) -> DirectResult<HashMap<String, String>> {
    match data {
        None | Some(Value::Null) => Ok(HashMap::new()),
        Some(Value::Object(fields)) => Ok(fields
            .into_iter()
            .map(|(name, value)| {
                let text = match value {
                    Value::String(text) => text,
                    other => other.to_string(),
                };
                (name, text)
            })
            .collect()),
        Some(other) => Err(DirectError::TypeConversion {
            source_type: json_type_name(&other).to_string(),
            target_type: "form field map".to_string(),
        }),
    }
}
