//! Delimited-text reader that sniffs its own dialect.
//!
//! A [`DelimitedReader`] inspects a bounded prefix of a seekable stream to
//! find the delimiter, quoting rules, encoding and whether the first row is a
//! header. It then offers `head`, `tail` and an iterator that can wrap back
//! to the first data record instead of ending.
//!
//! ```
//! use std::io::Cursor;
//! use csvloop_lib::{DelimitedReader, ReaderConfig};
//!
//! let data = Cursor::new(b"a,b\n1,2\n3,4\n".to_vec());
//! let mut reader = DelimitedReader::with_config(data, ReaderConfig::new().with_loop(true))?;
//!
//! assert!(reader.header_presented());
//! assert_eq!(reader.tail()?, vec!["3", "4"]);
//!
//! let records = reader.iterate()?.take(3).collect::<Result<Vec<_>, _>>()?;
//! assert_eq!(records[2], vec!["1", "2"]);
//! # Ok::<(), csvloop_lib::ReaderError>(())
//! ```

pub mod app;
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;

pub use app::run;
pub use domain::csv::{Dialect, FieldKind, ReaderConfig, Record};
pub use domain::error::{ReaderError, Result};
pub use infrastructure::csv::{
    CsvSniffer, CyclicRecordIterator, DelimitedReader, Detection, DialectDetector,
};
