// ============================================================
// DELIMITED READER
// ============================================================
// Seekable reader with sniffed dialect, header bookkeeping,
// head/tail convenience reads and iterator construction

use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use csv::{ByteRecord, Position};
use tracing::{debug, trace};
use validator::Validate;

use super::{
    csv_builder, sniff_stream, trim_field, CsvSniffer, CyclicRecordIterator, DialectDetector,
    TextEncoding,
};
use crate::domain::csv::{Dialect, ReaderConfig, Record};
use crate::domain::error::{ReaderError, Result};
use crate::infrastructure::storage::open_csv_file;

/// Reader over a seekable delimited-text stream.
///
/// Dialect, encoding and header are fixed at construction. Every read
/// moves the one shared stream cursor, so `head`, `tail` and `iterate` take
/// `&mut self`: a live iterator blocks any other use of the reader.
///
/// "Start of data" is the first byte after any BOM, advanced past the header
/// record when one was detected.
#[derive(Debug)]
pub struct DelimitedReader<R> {
    reader: csv::Reader<R>,
    dialect: Dialect,
    encoding: TextEncoding,
    header: Option<Record>,
    cyclic: bool,
}

impl DelimitedReader<File> {
    /// Open a file and sniff it
    pub fn from_path(path: &Path, config: ReaderConfig) -> Result<Self> {
        let file = open_csv_file(path)?;
        Self::with_config(file, config)
    }
}

impl<R: Read + Seek> DelimitedReader<R> {
    /// Build a reader with default options (no cyclic iteration)
    pub fn new(stream: R) -> Result<Self> {
        Self::with_config(stream, ReaderConfig::default())
    }

    /// Build a reader with the default sniffer
    pub fn with_config(stream: R, config: ReaderConfig) -> Result<Self> {
        let sniffer = CsvSniffer::from_config(&config);
        Self::with_detector(stream, config, &sniffer)
    }

    /// Build a reader with a custom detection strategy.
    ///
    /// Sniffs once, seeks to offset 0 and, when a header was detected, reads
    /// it exactly once. The cursor is left at the first data record.
    pub fn with_detector(
        mut stream: R,
        config: ReaderConfig,
        detector: &dyn DialectDetector,
    ) -> Result<Self> {
        config.validate()?;

        let sniffed = sniff_stream(&mut stream, detector, config.sample_size)?;
        let dialect = sniffed.detection.dialect;

        let mut this = Self {
            reader: csv_builder(&dialect).from_reader(stream),
            dialect,
            encoding: sniffed.encoding,
            header: None,
            cyclic: config.cyclic,
        };

        this.rewind(false)?;
        if sniffed.detection.has_header {
            let header = this.read_record()?.ok_or_else(|| {
                ReaderError::DialectDetection(
                    "detector reported a header but the stream has no records".to_string(),
                )
            })?;
            this.header = Some(header);
        }

        debug!(
            dialect = %this.dialect,
            header = this.header.is_some(),
            cyclic = this.cyclic,
            "Delimited reader ready"
        );

        Ok(this)
    }

    /// Whether the first record was detected as a header
    pub fn header_presented(&self) -> bool {
        self.header.is_some()
    }

    /// The header record, if one was detected
    pub fn header(&self) -> Option<&Record> {
        self.header.as_ref()
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    pub fn encoding_name(&self) -> &'static str {
        self.encoding.name()
    }

    /// Whether iterators from this reader rewind instead of ending
    pub fn is_cyclic(&self) -> bool {
        self.cyclic
    }

    /// First data record.
    ///
    /// Leaves the cursor right after it.
    pub fn head(&mut self) -> Result<Record> {
        self.seek_to_start()?;
        self.read_record()?.ok_or(ReaderError::EndOfStream)
    }

    /// Last data record.
    ///
    /// Record boundaries are not indexed, so this scans every record from the
    /// start of data. Only the last one is decoded.
    pub fn tail(&mut self) -> Result<Record> {
        self.seek_to_start()?;

        let mut current = ByteRecord::new();
        let mut last = ByteRecord::new();
        let mut seen = false;
        while self.reader.read_byte_record(&mut current)? {
            std::mem::swap(&mut current, &mut last);
            seen = true;
        }

        if seen {
            Ok(self.decode(&last))
        } else {
            Err(ReaderError::EndOfStream)
        }
    }

    /// Iterate data records from the start of data.
    ///
    /// The iterator snapshots the header flag and the cyclic option.
    pub fn iterate(&mut self) -> Result<CyclicRecordIterator<'_, R>> {
        self.seek_to_start()?;
        let skip_header = self.header_presented();
        let cyclic = self.cyclic;
        Ok(CyclicRecordIterator::new(self, skip_header, cyclic))
    }

    /// Give the stream back. Its position is wherever the last read left it.
    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }

    fn seek_to_start(&mut self) -> Result<()> {
        let skip_header = self.header_presented();
        self.rewind(skip_header)
    }

    /// Seek to the text origin and optionally discard one record.
    ///
    /// A missing record to discard means the stream lost its header after
    /// construction; that is reported as `HeaderVanished`.
    pub(crate) fn rewind(&mut self, skip_header: bool) -> Result<()> {
        let mut origin = Position::new();
        origin.set_byte(self.encoding.origin());
        self.reader.seek(origin)?;
        trace!(offset = self.encoding.origin(), skip_header, "Rewound stream");

        if skip_header {
            let mut discarded = ByteRecord::new();
            if !self.reader.read_byte_record(&mut discarded)? {
                return Err(ReaderError::HeaderVanished);
            }
        }
        Ok(())
    }

    /// Read the next record at the cursor; `None` at end of stream
    pub(crate) fn read_record(&mut self) -> Result<Option<Record>> {
        let mut record = ByteRecord::new();
        if self.reader.read_byte_record(&mut record)? {
            Ok(Some(self.decode(&record)))
        } else {
            Ok(None)
        }
    }

    fn decode(&self, record: &ByteRecord) -> Record {
        record
            .iter()
            .map(|field| {
                let text = self.encoding.decode(field);
                trim_field(&text, &self.dialect).to_string()
            })
            .collect()
    }
}
