//! Query-parameter codecs.
//!
//! Every parameter declares its codec up front. Encoding may yield `None`,
//! meaning "leave the key out of the query string".

use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::input::canonical;

/// Tag describing how a parameter is written into the query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecKind {
    Number,
    Boolean,
    Text,
    Optional,
    List,
    Json,
}

impl fmt::Display for CodecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CodecKind::Number => "number",
            CodecKind::Boolean => "boolean",
            CodecKind::Text => "text",
            CodecKind::Optional => "optional",
            CodecKind::List => "list",
            CodecKind::Json => "json",
        };
        f.write_str(name)
    }
}

/// Symmetric string encoding for one parameter.
pub trait Codec {
    type Value;

    fn kind(&self) -> CodecKind;

    /// `None` removes the key from the query string.
    fn encode(&self, value: &Self::Value) -> Option<String>;

    /// `None` signals a decode failure; the cell falls back to its default.
    fn decode(&self, raw: &str) -> Option<Self::Value>;
}

/// Finite floats in their shortest round-tripping form.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberCodec;

impl Codec for NumberCodec {
    type Value = f64;

    fn kind(&self) -> CodecKind {
        CodecKind::Number
    }

    fn encode(&self, value: &f64) -> Option<String> {
        Some(canonical(*value))
    }

    fn decode(&self, raw: &str) -> Option<f64> {
        raw.trim().parse::<f64>().ok().filter(|n| n.is_finite())
    }
}

/// `"true"` is true, anything else is false.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolCodec;

impl Codec for BoolCodec {
    type Value = bool;

    fn kind(&self) -> CodecKind {
        CodecKind::Boolean
    }

    fn encode(&self, value: &bool) -> Option<String> {
        Some(if *value { "true" } else { "false" }.to_string())
    }

    fn decode(&self, raw: &str) -> Option<bool> {
        Some(raw == "true")
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TextCodec;

impl Codec for TextCodec {
    type Value = String;

    fn kind(&self) -> CodecKind {
        CodecKind::Text
    }

    fn encode(&self, value: &String) -> Option<String> {
        Some(value.clone())
    }

    fn decode(&self, raw: &str) -> Option<String> {
        Some(raw.to_string())
    }
}

/// `None` is written as an absent key (or an empty list element).
#[derive(Debug, Clone, Copy, Default)]
pub struct OptionalCodec<C>(pub C);

impl<C: Codec> Codec for OptionalCodec<C> {
    type Value = Option<C::Value>;

    fn kind(&self) -> CodecKind {
        CodecKind::Optional
    }

    fn encode(&self, value: &Option<C::Value>) -> Option<String> {
        value.as_ref().and_then(|inner| self.0.encode(inner))
    }

    fn decode(&self, raw: &str) -> Option<Option<C::Value>> {
        if raw.is_empty() {
            return Some(None);
        }
        self.0.decode(raw).map(Some)
    }
}

/// Comma-joined primitives. Elements must not contain commas.
///
/// The empty string decodes to the empty list.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListCodec<C>(pub C);

impl<C: Codec> Codec for ListCodec<C> {
    type Value = Vec<C::Value>;

    fn kind(&self) -> CodecKind {
        CodecKind::List
    }

    fn encode(&self, value: &Vec<C::Value>) -> Option<String> {
        let parts: Vec<String> = value
            .iter()
            .map(|item| self.0.encode(item).unwrap_or_default())
            .collect();
        Some(parts.join(","))
    }

    fn decode(&self, raw: &str) -> Option<Vec<C::Value>> {
        if raw.is_empty() {
            return Some(Vec::new());
        }
        raw.split(',').map(|part| self.0.decode(part)).collect()
    }
}

/// Arbitrary serde values as JSON text.
pub struct JsonCodec<T>(PhantomData<fn() -> T>);

impl<T> JsonCodec<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonCodec<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for JsonCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("JsonCodec")
    }
}

impl<T: Serialize + DeserializeOwned> Codec for JsonCodec<T> {
    type Value = T;

    fn kind(&self) -> CodecKind {
        CodecKind::Json
    }

    fn encode(&self, value: &T) -> Option<String> {
        serde_json::to_string(value).ok()
    }

    fn decode(&self, raw: &str) -> Option<T> {
        serde_json::from_str(raw).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_codec_rejects_garbage_and_non_finite() {
        assert_eq!(NumberCodec.decode("2.8249"), Some(2.8249));
        assert_eq!(NumberCodec.decode("abc"), None);
        assert_eq!(NumberCodec.decode("NaN"), None);
        assert_eq!(NumberCodec.decode("inf"), None);
        assert_eq!(NumberCodec.encode(&100.0).as_deref(), Some("100"));
    }

    #[test]
    fn bool_codec_is_literal() {
        assert_eq!(BoolCodec.decode("true"), Some(true));
        assert_eq!(BoolCodec.decode("TRUE"), Some(false));
        assert_eq!(BoolCodec.decode("1"), Some(false));
        assert_eq!(BoolCodec.encode(&false).as_deref(), Some("false"));
    }

    #[test]
    fn optional_none_is_absent() {
        let codec = OptionalCodec(NumberCodec);
        assert_eq!(codec.encode(&None), None);
        assert_eq!(codec.encode(&Some(3.5)).as_deref(), Some("3.5"));
        assert_eq!(codec.decode(""), Some(None));
        assert_eq!(codec.decode("x"), None);
    }

    #[test]
    fn list_with_holes() {
        let codec = ListCodec(OptionalCodec(NumberCodec));
        let value = vec![Some(95.0), None, Some(85.5)];
        let encoded = codec.encode(&value).unwrap();
        assert_eq!(encoded, "95,,85.5");
        assert_eq!(codec.decode(&encoded), Some(value));
    }

    #[test]
    fn list_decode_fails_on_any_bad_element() {
        let codec = ListCodec(NumberCodec);
        assert_eq!(codec.decode("1,2,x"), None);
        assert_eq!(codec.decode(""), Some(vec![]));
    }

    #[test]
    fn json_ladder() {
        let codec: JsonCodec<Vec<(f64, f64)>> = JsonCodec::new();
        let encoded = codec.encode(&vec![(2.0, 0.0), (4.0, 1.0)]).unwrap();
        assert_eq!(encoded, "[[2.0,0.0],[4.0,1.0]]");
        assert_eq!(codec.decode("[[2,0],[4,1]]"), Some(vec![(2.0, 0.0), (4.0, 1.0)]));
        assert_eq!(codec.decode("[[2,0"), None);
        assert_eq!(codec.kind(), CodecKind::Json);
    }
}
