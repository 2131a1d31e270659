//! Source-side stages of the import pipeline: tabular reading, field
//! normalization, and per-schema record transformation. Everything here is
//! pure: no I/O, no network, no clock.

pub mod normalize;
pub mod schemas;
pub mod seed;
pub mod tabular;

pub use schemas::{transformer_for_schema, SchemaTransformer, SCHEMA_IDS};
pub use tabular::RecordReader;

pub const CRATE_NAME: &str = "cfod-adapters";
