// ============================================================
// CSV PREVIEW USE CASE
// ============================================================
// Summarise a delimited source: dialect, header, first/last record,
// and the first N records of an iteration

use std::io::{Cursor, Read, Seek};
use std::path::Path;
use std::time::Instant;

use serde::Serialize;

use crate::domain::csv::{ReaderConfig, Record};
use crate::domain::error::{ReaderError, Result};
use crate::infrastructure::csv::DelimitedReader;

/// Serializable summary of a delimited source
#[derive(Debug, Clone, Serialize)]
pub struct CsvPreview {
    /// Delimiter, `tab` / `space` spelled out
    pub delimiter: String,

    pub quote: char,

    /// Encoding name, e.g. `UTF-8`
    pub encoding: String,

    pub header_presented: bool,

    pub header: Option<Record>,

    /// First data record; absent for an empty dataset
    pub head: Option<Record>,

    /// Last data record; absent for an empty dataset
    pub tail: Option<Record>,

    /// Records from one iteration, wrapping when the reader is cyclic
    pub records: Vec<Record>,

    pub cyclic: bool,

    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

/// Builds previews of at most `limit` iterated records
pub struct CsvPreviewUseCase {
    limit: usize,
}

impl Default for CsvPreviewUseCase {
    fn default() -> Self {
        Self::new(10)
    }
}

impl CsvPreviewUseCase {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    /// Preview a file on disk
    pub fn preview_path(&self, path: &Path, config: ReaderConfig) -> Result<CsvPreview> {
        let mut reader = DelimitedReader::from_path(path, config)?;
        self.preview(&mut reader)
    }

    /// Preview in-memory content (for testing or pasted data)
    pub fn preview_content(&self, content: &str, config: ReaderConfig) -> Result<CsvPreview> {
        let stream = Cursor::new(content.as_bytes().to_vec());
        let mut reader = DelimitedReader::with_config(stream, config)?;
        self.preview(&mut reader)
    }

    /// Preview an already constructed reader. Moves its cursor.
    pub fn preview<R: Read + Seek>(&self, reader: &mut DelimitedReader<R>) -> Result<CsvPreview> {
        let start = Instant::now();

        let head = empty_as_none(reader.head())?;
        let tail = empty_as_none(reader.tail())?;
        let records = reader
            .iterate()?
            .take(self.limit)
            .collect::<Result<Vec<_>>>()?;

        let dialect = reader.dialect();

        Ok(CsvPreview {
            delimiter: dialect.delimiter_name(),
            quote: dialect.quote as char,
            encoding: reader.encoding_name().to_string(),
            header_presented: reader.header_presented(),
            header: reader.header().cloned(),
            head,
            tail,
            records,
            cyclic: reader.is_cyclic(),
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}

/// An empty dataset is not an error for a preview
fn empty_as_none(result: Result<Record>) -> Result<Option<Record>> {
    match result {
        Ok(record) => Ok(Some(record)),
        Err(ReaderError::EndOfStream) => Ok(None),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(fields: &[&str]) -> Record {
        fields.iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn test_preview_cyclic_content() {
        let preview = CsvPreviewUseCase::new(3)
            .preview_content("a,b\n1,2\n3,4\n", ReaderConfig::new().with_loop(true))
            .unwrap();

        assert_eq!(preview.delimiter, ",");
        assert!(preview.header_presented);
        assert_eq!(preview.header, Some(row(&["a", "b"])));
        assert_eq!(preview.head, Some(row(&["1", "2"])));
        assert_eq!(preview.tail, Some(row(&["3", "4"])));
        assert_eq!(
            preview.records,
            vec![row(&["1", "2"]), row(&["3", "4"]), row(&["1", "2"])]
        );
    }

    #[test]
    fn test_preview_non_cyclic_stops_at_end() {
        let preview = CsvPreviewUseCase::default()
            .preview_content("1\t2\n3\t4\n", ReaderConfig::default())
            .unwrap();

        assert_eq!(preview.delimiter, "tab");
        assert!(!preview.cyclic);
        assert_eq!(preview.records.len(), 2);
    }

    #[test]
    fn test_preview_serializes() {
        let preview = CsvPreviewUseCase::new(1)
            .preview_content("x;y\n1;2\n", ReaderConfig::default())
            .unwrap();
        let json = serde_json::to_value(&preview).unwrap();

        assert_eq!(json["delimiter"], ";");
        assert_eq!(json["records"][0][0], "1");
    }

    #[test]
    fn test_empty_as_none() {
        assert_eq!(empty_as_none(Err(ReaderError::EndOfStream)).unwrap(), None);
        assert!(empty_as_none(Err(ReaderError::HeaderVanished)).is_err());
    }
}
