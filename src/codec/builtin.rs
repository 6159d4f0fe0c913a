//! Built-in structured codecs.

use serde_json::Value;

use crate::error;

use super::registry::Codec;

/// JSON, via serde_json.
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn encode(&self, value: &Value) -> crate::Result<Vec<u8>> {
        serde_json::to_vec(value).map_err(error::body)
    }

    fn decode(&self, bytes: &[u8]) -> crate::Result<Value> {
        serde_json::from_slice(bytes).map_err(error::decode)
    }
}

/// CBOR, via ciborium.
pub struct CborCodec;

impl Codec for CborCodec {
    fn content_type(&self) -> &'static str {
        "application/cbor"
    }

    fn encode(&self, value: &Value) -> crate::Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf).map_err(error::body)?;
        Ok(buf)
    }

    fn decode(&self, bytes: &[u8]) -> crate::Result<Value> {
        ciborium::from_reader(bytes).map_err(error::decode)
    }
}

/// URL-encoded form pairs, via serde_urlencoded. Only flat string-valued
/// objects are representable; anything deeper fails encoding.
pub struct FormCodec;

impl Codec for FormCodec {
    fn content_type(&self) -> &'static str {
        "application/x-www-form-urlencoded"
    }

    fn encode(&self, value: &Value) -> crate::Result<Vec<u8>> {
        let Value::Object(map) = value else {
            return Err(error::body("form encoding requires an object value"));
        };
        let pairs: Vec<(String, String)> = map
            .iter()
            .map(|(k, v)| {
                let text = match v {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    Value::Null => String::new(),
                    other => {
                        return Err(error::body(format!(
                            "form value for {k:?} is not a scalar: {other}"
                        )))
                    }
                };
                Ok((k.clone(), text))
            })
            .collect::<crate::Result<_>>()?;
        serde_urlencoded::to_string(pairs)
            .map(String::into_bytes)
            .map_err(error::body)
    }

    fn decode(&self, bytes: &[u8]) -> crate::Result<Value> {
        let text = std::str::from_utf8(bytes).map_err(error::decode)?;
        let pairs: Vec<(String, String)> =
            serde_urlencoded::from_str(text).map_err(error::decode)?;
        Ok(Value::Object(
            pairs.into_iter().map(|(k, v)| (k, Value::String(v))).collect(),
        ))
    }
}
