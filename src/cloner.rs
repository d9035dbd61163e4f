//! Structural cloning and the reversible text encoding for corpora.
//!
//! In memory, [`deep_copy`] walks the tagged [`Value`] tree and rebuilds every
//! node, so the copy shares nothing with its source. On disk, corpora are
//! JSON (or YAML) where a pattern is written as a sentinel-prefixed string:
//!
//! ```text
//! "__REGEXP /body/flags"
//! ```
//!
//! Plain strings that happen to start with a reserved prefix are escaped with
//! `__STRING ` when encoding, so decoding always yields the original tree.
//! Decoding removes `__STRING ` only when a reserved prefix follows it, so a
//! hand-written `"__STRING literal text"` is read back unchanged.

use serde_json::Value as Json;

use crate::corpus::TestDefinition;
use crate::errors::{SmokeError, SmokeResult};
use crate::pattern::Pattern;
use crate::value::{Map, Value};

/// Prefix marking an encoded pattern value.
pub const PATTERN_SENTINEL: &str = "__REGEXP ";

/// Prefix marking a plain string that would otherwise look reserved.
pub const STRING_ESCAPE: &str = "__STRING ";

/// Returns a value-equal copy of `value` that shares no storage with it.
///
/// Patterns are reconstructed from their body and flags.
pub fn deep_copy(value: &Value) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::Bool(b) => Value::Bool(*b),
        Value::Number(n) => Value::Number(n.clone()),
        Value::String(s) => Value::String(s.as_str().to_owned()),
        Value::List(items) => Value::List(items.iter().map(deep_copy).collect()),
        Value::Map(map) => Value::Map(
            map.iter()
                .map(|(k, v)| (k.as_str().to_owned(), deep_copy(v)))
                .collect(),
        ),
        Value::Pattern(p) => Value::Pattern(p.rebuild()),
    }
}

/// Deep-copies a whole corpus, preserving definition and expectation order.
pub fn clone_corpus(tests: &[TestDefinition]) -> Vec<TestDefinition> {
    tests.iter().map(TestDefinition::deep_copy).collect()
}

/// What to do with a sentinel-prefixed string that lacks the `/body/flags`
/// shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SentinelPolicy {
    /// Keep it as a plain string, prefix included.
    #[default]
    Lenient,
    /// Fail with [`SmokeError::MalformedPattern`].
    Strict,
}

/// Text codec for corpus values.
#[derive(Debug, Clone, Copy, Default)]
pub struct Codec {
    pub policy: SentinelPolicy,
}

impl Codec {
    pub fn new(policy: SentinelPolicy) -> Self {
        Self { policy }
    }

    pub fn strict() -> Self {
        Self::new(SentinelPolicy::Strict)
    }

    /// Converts a value tree to plain JSON, encoding patterns as strings.
    pub fn to_json(&self, value: &Value) -> Json {
        match value {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Number(n) => Json::Number(n.clone()),
            Value::String(s) => Json::String(escape_string(s)),
            Value::List(items) => Json::Array(items.iter().map(|v| self.to_json(v)).collect()),
            Value::Map(map) => Json::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.to_json(v)))
                    .collect(),
            ),
            Value::Pattern(p) => Json::String(format!("{}{}", PATTERN_SENTINEL, p)),
        }
    }

    /// Converts plain JSON back into a value tree, reviving encoded patterns.
    pub fn from_json(&self, json: Json) -> SmokeResult<Value> {
        Ok(match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => Value::Number(n),
            Json::String(s) => self.revive_string(s)?,
            Json::Array(items) => Value::List(
                items
                    .into_iter()
                    .map(|v| self.from_json(v))
                    .collect::<SmokeResult<Vec<_>>>()?,
            ),
            Json::Object(map) => {
                let mut out = Map::new();
                for (k, v) in map {
                    out.insert(k, self.from_json(v)?);
                }
                Value::Map(out)
            }
        })
    }

    pub fn encode(&self, value: &Value) -> SmokeResult<String> {
        serde_json::to_string(&self.to_json(value)).map_err(SmokeError::Serialize)
    }

    pub fn encode_pretty(&self, value: &Value) -> SmokeResult<String> {
        serde_json::to_string_pretty(&self.to_json(value)).map_err(SmokeError::Serialize)
    }

    /// Parses JSON text. `"__REGEXP /body/flags"` strings become patterns, and
    /// a `__STRING ` prefix is dropped only in front of a reserved prefix.
    pub fn decode(&self, text: &str) -> SmokeResult<Value> {
        let json: Json = serde_json::from_str(text).map_err(SmokeError::Deserialize)?;
        self.from_json(json)
    }

    /// Decodes YAML text with the same sentinel rules as JSON.
    pub fn decode_yaml(&self, text: &str) -> SmokeResult<Value> {
        let json: Json = serde_yaml::from_str(text).map_err(SmokeError::Yaml)?;
        self.from_json(json)
    }

    fn revive_string(&self, s: String) -> SmokeResult<Value> {
        // Only the encoder's own escapes are undone; any other text that
        // starts with the escape prefix is kept as written.
        if let Some(plain) = s.strip_prefix(STRING_ESCAPE) {
            if is_reserved(plain) {
                return Ok(Value::String(plain.to_string()));
            }
        }
        let Some(encoded) = s.strip_prefix(PATTERN_SENTINEL) else {
            return Ok(Value::String(s));
        };
        match Pattern::parse_literal(encoded)? {
            Some(pattern) => Ok(Value::Pattern(pattern)),
            None => match self.policy {
                SentinelPolicy::Strict => Err(SmokeError::MalformedPattern { text: s }),
                SentinelPolicy::Lenient => {
                    tracing::warn!(
                        text = %s,
                        "Encoded pattern has no /body/flags shape, keeping it as a string"
                    );
                    Ok(Value::String(s))
                }
            },
        }
    }
}

fn is_reserved(s: &str) -> bool {
    s.starts_with(PATTERN_SENTINEL) || s.starts_with(STRING_ESCAPE)
}

fn escape_string(s: &str) -> String {
    if is_reserved(s) {
        format!("{}{}", STRING_ESCAPE, s)
    } else {
        s.to_string()
    }
}

/// Encodes with the default codec.
pub fn encode(value: &Value) -> SmokeResult<String> {
    Codec::default().encode(value)
}

/// Decodes with the default (lenient) codec.
pub fn decode(text: &str) -> SmokeResult<Value> {
    Codec::default().decode(text)
}
