//! Data envelope and schema propagation model.
//!
//! This crate is a pure value component: no I/O, no connector or graph
//! concepts. It provides:
//! - [`DataEnvelope`] / [`EnvelopeMetadata`]: the container exchanged between
//!   nodes, with `from_map`/`to_map` as boundary serialisers only.
//! - [`DataSchema`] / [`FieldDefinition`] / [`FieldType`]: the schema
//!   propagated alongside data.
//! - [`merge_envelopes`]: combining several upstream envelopes into one,
//!   with conflict-prefixing on field-name collisions.
//! - [`infer_schema_from_data`]: design-time schema inference from literal
//!   record data.

mod envelope;
mod infer;
mod merge;
mod schema;

pub use envelope::{DataEnvelope, EnvelopeMetadata, Record};
pub use infer::infer_schema_from_data;
pub use merge::{merge_envelopes, LabelledEnvelope};
pub use schema::{DataSchema, FieldDefinition, FieldType};
