// ============================================================
// CSV INFRASTRUCTURE LAYER
// ============================================================
// Dialect sniffing, encoding detection, and stream-backed reading

mod cyclic_iterator;
mod delimited_reader;
mod encoding;
mod sniffer;

pub use cyclic_iterator::CyclicRecordIterator;
pub use delimited_reader::DelimitedReader;
pub use encoding::TextEncoding;
pub use sniffer::{sniff_stream, CsvSniffer, Detection, DialectDetector, Sniffed};

use csv::ReaderBuilder;

use crate::domain::csv::Dialect;

/// Reader builder configured for a dialect.
///
/// Headers are handled by the caller, and field counts may vary per record.
pub(crate) fn csv_builder(dialect: &Dialect) -> ReaderBuilder {
    let mut builder = ReaderBuilder::new();
    builder
        .delimiter(dialect.delimiter)
        .quote(dialect.quote)
        .double_quote(dialect.double_quote)
        .escape(dialect.escape)
        .has_headers(false)
        .flexible(true);
    builder
}

pub(crate) fn trim_field<'a>(field: &'a str, dialect: &Dialect) -> &'a str {
    if dialect.skip_initial_space {
        field.trim_start_matches(' ')
    } else {
        field
    }
}
