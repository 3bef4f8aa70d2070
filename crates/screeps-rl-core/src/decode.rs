//! Defensive decoding of raw remote values.
//!
//! Memory values reach us through a best-effort console/memory channel and can
//! show up as a plain list, a JSON string (sometimes encoded twice), an object
//! keyed `"0".."n"` standing in for an array, an `{ok, data}` envelope, or not
//! at all. Decoding is a chain of total steps; each one is a no-op when its
//! input shape doesn't apply, and the chain ends in a validated value or a
//! fixed default. Nothing here returns an error.

use serde_json::Value;

use crate::observation::{OBS_DIM, Observation};

/// Strategy for turning raw remote values into typed data
pub trait StateDecoder: Send + Sync {
    /// Decode an observation; never fails
    fn decode(&self, raw: &Value) -> Observation;

    /// Decode a non-negative scalar count; never fails
    fn decode_count(&self, raw: &Value) -> u64;
}

/// Default decoder: tolerates every transport shape seen in practice
#[derive(Debug, Clone, Copy, Default)]
pub struct LenientDecoder;

impl StateDecoder for LenientDecoder {
    fn decode(&self, raw: &Value) -> Observation {
        decode_observation(raw)
    }

    fn decode_count(&self, raw: &Value) -> u64 {
        decode_count(raw)
    }
}

/// Decode an observation, falling back to [`Observation::DEFAULT`]
pub fn decode_observation(raw: &Value) -> Observation {
    let value = unwrap_json_strings(unwrap_envelope(raw.clone()));
    let value = mapping_to_sequence(value);
    to_observation(&value).unwrap_or(Observation::DEFAULT)
}

/// Decode a creep count, falling back to 0
pub fn decode_count(raw: &Value) -> u64 {
    match unwrap_json_strings(unwrap_envelope(raw.clone())) {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                u
            } else {
                n.as_f64()
                    .filter(|f| f.is_finite() && *f > 0.0)
                    .map(|f| f.trunc() as u64)
                    .unwrap_or(0)
            }
        }
        Value::Bool(b) => u64::from(b),
        Value::String(s) => s.trim().parse::<u64>().unwrap_or(0),
        _ => 0,
    }
}

/// Replace `{data: X, ..}` with `X`
fn unwrap_envelope(raw: Value) -> Value {
    match raw {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Parse strings as JSON until something that isn't a JSON-encoded value
/// remains. Every successful parse strictly shortens the string, so this
/// terminates.
fn unwrap_json_strings(mut raw: Value) -> Value {
    while let Value::String(s) = &raw {
        match serde_json::from_str::<Value>(s) {
            Ok(inner) => raw = inner,
            Err(_) => break,
        }
    }
    raw
}

/// Rebuild an array from an object whose keys are all integers, ordered
/// numerically; otherwise take the object's values in iteration order.
fn mapping_to_sequence(raw: Value) -> Value {
    match raw {
        Value::Object(map) => {
            let numbered: Option<Vec<(u64, Value)>> = map
                .iter()
                .map(|(k, v)| k.trim().parse::<u64>().ok().map(|i| (i, v.clone())))
                .collect();
            match numbered {
                Some(mut items) => {
                    items.sort_by_key(|(i, _)| *i);
                    Value::Array(items.into_iter().map(|(_, v)| v).collect())
                }
                None => Value::Array(map.into_iter().map(|(_, v)| v).collect()),
            }
        }
        other => other,
    }
}

fn to_observation(value: &Value) -> Option<Observation> {
    let items = value.as_array()?;
    if items.len() != OBS_DIM {
        return None;
    }
    let mut out = [0.0; OBS_DIM];
    for (slot, item) in out.iter_mut().zip(items) {
        *slot = to_f64(item)?;
    }
    Some(Observation(out))
}

fn to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}
