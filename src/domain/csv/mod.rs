// ============================================================
// CSV DOMAIN LAYER
// ============================================================
// Core types and value objects for delimited-text reading
// No I/O, no stream handling

mod dialect;
mod field_kind;
mod reader_config;

pub use dialect::Dialect;
pub use field_kind::FieldKind;
pub use reader_config::ReaderConfig;

/// One parsed row: an ordered sequence of string fields.
///
/// Field counts may differ between records; nothing validates them.
pub type Record = Vec<String>;
