use serde::Deserialize;
use serde_json::Value;

use crate::models::ContentItem;

/// Maps raw source records onto `ContentItem`s
///
/// This is the only place that knows which raw field carries identity. Endpoints have
/// drifted over time (`channel_id`, `channelId`, `channel`, ...), so field names are
/// configurable rather than guessed inside the engine.
pub trait ItemAdapter: Send + Sync {
    fn adapt(&self, raw: Value) -> ContentItem;
}

/// Adapter that probes an ordered list of candidate field names
#[derive(Debug, Clone, PartialEq)]
pub struct FieldAdapter {
    id_fields: Vec<String>,
    channel_fields: Vec<String>,
}

impl Default for FieldAdapter {
    fn default() -> Self {
        Self::new(
            vec!["id".into(), "video_id".into(), "videoId".into()],
            vec!["channel_id".into(), "channelId".into(), "channel".into()],
        )
    }
}

impl FieldAdapter {
    pub fn new(id_fields: Vec<String>, channel_fields: Vec<String>) -> Self {
        Self {
            id_fields,
            channel_fields,
        }
    }

    fn first_present(raw: &Value, fields: &[String]) -> Option<String> {
        fields
            .iter()
            .filter_map(|field| raw.get(field))
            .find_map(scalar_to_key)
    }
}

impl ItemAdapter for FieldAdapter {
    fn adapt(&self, raw: Value) -> ContentItem {
        ContentItem {
            id: Self::first_present(&raw, &self.id_fields),
            channel: Self::first_present(&raw, &self.channel_fields),
            payload: raw,
        }
    }
}

/// Reads a usable key out of a string, number, or `{ "id": ... }` object
fn scalar_to_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map.get("id").and_then(scalar_to_key),
        _ => None,
    }
}

/// Shapes a candidate endpoint may answer with
///
/// Some endpoints wrap the list (`{"videos": [...]}`), older ones return a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SourceEnvelope {
    Wrapped {
        #[serde(alias = "items", alias = "results")]
        videos: Vec<Value>,
    },
    Bare(Vec<Value>),
}

impl SourceEnvelope {
    pub fn into_records(self) -> Vec<Value> {
        match self {
            SourceEnvelope::Wrapped { videos } => videos,
            SourceEnvelope::Bare(records) => records,
        }
    }
}
