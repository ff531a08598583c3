//! The [`DataEnvelope`]: the universal payload exchanged between nodes.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::DataSchema;

/// A single data record: a mapping from field name to value.
pub type Record = BTreeMap<String, Value>;

/// Metadata attached to a [`DataEnvelope`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EnvelopeMetadata {
  pub schema: DataSchema,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub node_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub node_type: Option<String>,
  pub record_count: usize,
  pub sources: BTreeSet<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub execution_time_ms: Option<u64>,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub custom: BTreeMap<String, Value>,
}

/// The universal inter-node payload: an ordered sequence of records plus
/// propagating schema metadata and lineage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DataEnvelope {
  pub data: Vec<Record>,
  pub metadata: EnvelopeMetadata,
}

impl DataEnvelope {
  pub fn new(data: Vec<Record>, metadata: EnvelopeMetadata) -> Self {
    let mut metadata = metadata;
    metadata.record_count = data.len();
    Self { data, metadata }
  }

  pub fn empty(node_id: impl Into<String>) -> Self {
    Self {
      data: Vec::new(),
      metadata: EnvelopeMetadata {
        node_id: Some(node_id.into()),
        ..Default::default()
      },
    }
  }

  /// Reconstructs an envelope from a loose mapping.
  ///
  /// If `metadata` is absent, `raw` is wrapped as a single record with an
  /// empty schema (legacy compatibility with callers that hand the core a
  /// bare JSON object instead of the envelope shape).
  pub fn from_map(raw: Value) -> Self {
    match raw {
      Value::Object(mut obj) => {
        if let Some(data) = obj.remove("data") {
          let metadata: EnvelopeMetadata = obj
            .remove("metadata")
            .map(serde_json::from_value)
            .transpose()
            .unwrap_or(None)
            .unwrap_or_default();
          let records: Vec<Record> = match data {
            Value::Array(items) => items
              .into_iter()
              .map(|item| match item {
                Value::Object(map) => map.into_iter().collect(),
                other => BTreeMap::from([("value".to_string(), other)]),
              })
              .collect(),
            other => vec![BTreeMap::from([("value".to_string(), other)])],
          };
          DataEnvelope::new(records, metadata)
        } else {
          // Legacy shape: the whole map is a single record.
          let record: Record = obj.into_iter().collect();
          DataEnvelope::new(vec![record], EnvelopeMetadata::default())
        }
      }
      other => DataEnvelope::new(
        vec![BTreeMap::from([("value".to_string(), other)])],
        EnvelopeMetadata::default(),
      ),
    }
  }

  /// The dual of [`from_map`](Self::from_map).
  pub fn to_map(&self) -> Value {
    serde_json::json!({
      "data": self.data,
      "metadata": self.metadata,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn round_trips_through_map() {
    let mut metadata = EnvelopeMetadata {
      node_id: Some("a".into()),
      ..Default::default()
    };
    metadata.sources.insert("a".into());
    let envelope = DataEnvelope::new(
      vec![BTreeMap::from([("x".to_string(), Value::from(1))])],
      metadata,
    );

    let roundtripped = DataEnvelope::from_map(envelope.to_map());
    assert_eq!(roundtripped, envelope);
  }

  #[test]
  fn from_map_wraps_legacy_bare_object_as_single_record() {
    let raw = serde_json::json!({ "foo": "bar" });
    let envelope = DataEnvelope::from_map(raw);
    assert_eq!(envelope.data.len(), 1);
    assert_eq!(envelope.data[0]["foo"], Value::from("bar"));
    assert!(envelope.metadata.schema.is_empty());
  }

  #[test]
  fn record_count_tracks_data_length() {
    let envelope = DataEnvelope::new(
      vec![BTreeMap::new(), BTreeMap::new(), BTreeMap::new()],
      EnvelopeMetadata::default(),
    );
    assert_eq!(envelope.metadata.record_count, 3);
  }
}
