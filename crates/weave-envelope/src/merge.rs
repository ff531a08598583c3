//! Merging multiple upstream envelopes into one aggregated envelope.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use crate::envelope::{DataEnvelope, EnvelopeMetadata, Record};
use crate::schema::{DataSchema, FieldDefinition};

/// A labelled envelope: `label` is the producing node's human-readable name,
/// used to derive the conflict-resolution prefix.
pub struct LabelledEnvelope<'a> {
  pub node_id: &'a str,
  pub label: &'a str,
  pub envelope: &'a DataEnvelope,
}

/// Derives the stable prefix used to disambiguate a colliding field name:
/// the label lowercased, spaces replaced with underscores, truncated to ten
/// characters; falls back to the first eight characters of the node id if
/// the label is empty.
fn prefix_for(node_id: &str, label: &str) -> String {
  let trimmed = label.trim();
  if trimmed.is_empty() {
    return node_id.chars().take(8).collect();
  }
  let normalized: String = trimmed.to_lowercase().replace(' ', "_");
  normalized.chars().take(10).collect()
}

/// Combines several envelopes into one per the merge contract:
/// - `data` is the concatenation in input order.
/// - `schema.fields` is the union of input fields; colliding names are
///   renamed `{prefix}_{name}` for *every* contributing side, never just one.
/// - `nullable` is the logical OR across inputs for any field name.
/// - `sources` is the set union.
/// - `custom` keys that collide become an ordered list of the colliding values.
pub fn merge_envelopes(envelopes: &[LabelledEnvelope<'_>]) -> DataEnvelope {
  if envelopes.is_empty() {
    return DataEnvelope::default();
  }
  if envelopes.len() == 1 {
    return envelopes[0].envelope.clone();
  }

  let mut name_counts: BTreeMap<String, usize> = BTreeMap::new();
  for le in envelopes {
    for field in &le.envelope.metadata.schema.fields {
      *name_counts.entry(field.name.clone()).or_insert(0) += 1;
    }
  }

  let mut merged_schema = DataSchema::empty();
  // final_name -> (nullable, field_type, source_node) already inserted, to OR nullable across dup defs.
  let mut inserted_index: BTreeMap<String, usize> = BTreeMap::new();

  let mut data: Vec<Record> = Vec::new();
  let mut sources: BTreeSet<String> = BTreeSet::new();
  let mut custom: BTreeMap<String, Vec<Value>> = BTreeMap::new();

  for le in envelopes {
    let prefix = prefix_for(le.node_id, le.label);
    data.extend(le.envelope.data.iter().cloned());
    sources.extend(le.envelope.metadata.sources.iter().cloned());

    for field in &le.envelope.metadata.schema.fields {
      let conflicted = name_counts.get(&field.name).copied().unwrap_or(0) > 1;
      let final_name = if conflicted {
        format!("{prefix}_{}", field.name)
      } else {
        field.name.clone()
      };

      if let Some(&idx) = inserted_index.get(&final_name) {
        if field.nullable {
          merged_schema.fields[idx].nullable = true;
        }
      } else {
        let mut renamed = field.clone();
        renamed.name = final_name.clone();
        inserted_index.insert(final_name, merged_schema.fields.len());
        merged_schema.push_field(renamed);
      }
    }

    for (key, value) in &le.envelope.metadata.custom {
      custom.entry(key.clone()).or_default().push(value.clone());
    }
  }

  let custom_final: BTreeMap<String, Value> = custom
    .into_iter()
    .map(|(k, mut vs)| {
      if vs.len() == 1 {
        (k, vs.pop().unwrap())
      } else {
        (k, Value::Array(vs))
      }
    })
    .collect();

  merged_schema.source_nodes = sources.clone();

  DataEnvelope::new(
    data,
    EnvelopeMetadata {
      schema: merged_schema,
      sources,
      custom: custom_final,
      ..Default::default()
    },
  )
}
