//! Schema-driven record extraction from listing pages
//!
//! Turns an HTML document plus a declarative selector schema into an ordered
//! list of records:
//! - `schema`: schema documents, validated and compiled up front
//! - `extractors`: CSS selector helpers and the record extractor
//! - `record`: records and their JSON wire format
//! - `source`: HTTP and file document sources
//! - `report`: completeness checks and plain-text panels
//! - `config`: layered configuration
//! - `ffi`: C interface, JSON in and out

pub mod config;
pub mod error;
pub mod extractors;
pub mod ffi;
pub mod record;
pub mod report;
pub mod schema;
pub mod source;

pub use config::{AppConfig, DisplayConfig, ExtractorConfig, FetchConfig};
pub use error::{ConfigError, Error, FetchError, ParseError, Result, SchemaError};
pub use extractors::{decode_document, extract, extract_bytes, SchemaExtractor};
pub use ffi::*;
pub use record::{ExtractionResult, Record};
pub use report::{expected_fields, render_panels, ExtractionReport, RecordCompleteness};
pub use schema::{
    ExtractionSchema, Field, FieldAccessor, FieldDefinition, FieldKind, SchemaDefinition,
};
pub use source::{DocumentSource, FileSource, HttpSource};
