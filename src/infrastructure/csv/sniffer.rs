// ============================================================
// DIALECT SNIFFER
// ============================================================
// Infer delimiter, quoting and header presence from a bounded prefix

use std::io::{Read, Seek, SeekFrom};

use tracing::{debug, warn};

use super::{csv_builder, trim_field, TextEncoding};
use crate::domain::csv::{Dialect, FieldKind, ReaderConfig, Record};
use crate::domain::error::{ReaderError, Result};

/// Delimiters tried, most preferred first
const DELIMITER_CANDIDATES: [u8; 6] = [b',', b'\t', b';', b'|', b':', b' '];

const QUOTE_CANDIDATES: [u8; 2] = [b'"', b'\''];

/// Consistency thresholds walked from 1.00 down to 0.90
const CONSISTENCY_STEPS: usize = 10;

/// What a detector infers from a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    pub dialect: Dialect,
    pub has_header: bool,
}

/// Pluggable detection strategy.
///
/// `sample` is the decoded stream prefix, already cut back to whole lines.
pub trait DialectDetector {
    fn detect(&self, sample: &str) -> Result<Detection>;
}

/// Detection result together with the encoding found in the prefix
#[derive(Debug, Clone, Copy)]
pub struct Sniffed {
    pub detection: Detection,
    pub encoding: TextEncoding,
}

/// Default detector: delimiter consistency plus a column-kind header heuristic
#[derive(Debug, Clone)]
pub struct CsvSniffer {
    header_probe_rows: usize,
}

impl Default for CsvSniffer {
    fn default() -> Self {
        Self::from_config(&ReaderConfig::default())
    }
}

impl CsvSniffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ReaderConfig) -> Self {
        Self {
            header_probe_rows: config.header_probe_rows,
        }
    }

    /// Set how many rows after the first are compared against it
    pub fn with_header_probe_rows(mut self, rows: usize) -> Self {
        self.header_probe_rows = rows;
        self
    }

    /// Infer the dialect of a sample
    pub fn sniff_dialect(&self, sample: &str) -> Result<Dialect> {
        if sample.trim().is_empty() {
            return Err(ReaderError::DialectDetection("sample is empty".to_string()));
        }

        let quote = Self::detect_quote(sample);
        let delimiter = Self::detect_delimiter(sample, quote).ok_or_else(|| {
            ReaderError::DialectDetection("could not determine delimiter".to_string())
        })?;

        let escaped = sample
            .as_bytes()
            .windows(2)
            .any(|pair| pair[0] == b'\\' && pair[1] == quote);

        Ok(Dialect {
            delimiter,
            quote,
            double_quote: !escaped,
            escape: escaped.then_some(b'\\'),
            skip_initial_space: Self::detect_skip_initial_space(sample, delimiter, quote),
        })
    }

    /// Decide whether the first row of `sample` is a header.
    ///
    /// Each column is classified over the probe rows. Columns whose kind is
    /// stable vote: a header cell that does not fit the column kind (or, for
    /// text, differs in length) votes for a header, one that fits votes
    /// against. Columns with mixed kinds abstain. Columns no probe row reached
    /// (a lone first row, or every later row of another width) vote for a
    /// header, so a header-only file reads as exactly that.
    pub fn has_header(&self, sample: &str, dialect: &Dialect) -> bool {
        let rows = parse_sample(sample, dialect);
        let Some((header, rest)) = rows.split_first() else {
            return false;
        };

        let mut columns = vec![ColumnKind::Unseen; header.len()];
        for row in rest
            .iter()
            .filter(|row| row.len() == header.len())
            .take(self.header_probe_rows)
        {
            for (column, value) in columns.iter_mut().zip(row) {
                column.observe(FieldKind::classify(value));
            }
        }

        let score: i32 = columns
            .iter()
            .zip(header)
            .map(|(column, cell)| match column {
                ColumnKind::Consistent(FieldKind::Text(len)) => {
                    if cell.chars().count() != *len {
                        1
                    } else {
                        -1
                    }
                }
                ColumnKind::Consistent(kind) => {
                    if kind.matches(cell) {
                        -1
                    } else {
                        1
                    }
                }
                ColumnKind::Unseen => 1,
                ColumnKind::Mixed => 0,
            })
            .sum();

        score > 0
    }

    /// Pick the quote character that opens more fields; `"` on ties
    fn detect_quote(sample: &str) -> u8 {
        let bytes = sample.as_bytes();
        let mut best = (b'"', 0usize);

        for &quote in &QUOTE_CANDIDATES {
            let opens = bytes
                .iter()
                .enumerate()
                .filter(|&(i, &b)| b == quote && Self::opens_field(bytes, i))
                .count();
            if opens > best.1 {
                best = (quote, opens);
            }
        }

        best.0
    }

    fn opens_field(bytes: &[u8], i: usize) -> bool {
        i == 0
            || matches!(bytes[i - 1], b'\n' | b'\r')
            || DELIMITER_CANDIDATES.contains(&bytes[i - 1])
    }

    /// Choose the most consistent delimiter, preferring earlier candidates.
    ///
    /// Falls back to frequency / (1 + stddev) when no candidate is at least
    /// 90% consistent.
    fn detect_delimiter(sample: &str, quote: u8) -> Option<u8> {
        let stats: Vec<(u8, DelimiterStats)> = DELIMITER_CANDIDATES
            .iter()
            .filter_map(|&delimiter| {
                let dialect = Dialect {
                    delimiter,
                    quote,
                    ..Default::default()
                };
                DelimiterStats::measure(sample, &dialect).map(|stats| (delimiter, stats))
            })
            .collect();

        for step in 0..=CONSISTENCY_STEPS {
            let threshold = 1.0 - step as f32 * 0.01;
            if let Some((delimiter, _)) = stats
                .iter()
                .find(|(_, s)| s.consistency + f32::EPSILON >= threshold)
            {
                return Some(*delimiter);
            }
        }

        let mut best: Option<(u8, f32)> = None;
        for (delimiter, s) in &stats {
            if best.map_or(true, |(_, score)| s.score > score) {
                best = Some((*delimiter, s.score));
            }
        }
        best.map(|(delimiter, _)| delimiter)
    }

    /// True when every unquoted delimiter is followed by a space
    fn detect_skip_initial_space(sample: &str, delimiter: u8, quote: u8) -> bool {
        if delimiter == b' ' {
            return false;
        }

        let bytes = sample.as_bytes();
        let mut in_quotes = false;
        let mut seen = 0usize;

        for (i, &b) in bytes.iter().enumerate() {
            if b == quote {
                in_quotes = !in_quotes;
                continue;
            }
            if in_quotes || b != delimiter {
                continue;
            }
            seen += 1;
            if bytes.get(i + 1) != Some(&b' ') {
                return false;
            }
        }

        seen > 0
    }
}

impl DialectDetector for CsvSniffer {
    fn detect(&self, sample: &str) -> Result<Detection> {
        let dialect = self.sniff_dialect(sample)?;
        let has_header = self.has_header(sample, &dialect);
        Ok(Detection {
            dialect,
            has_header,
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum ColumnKind {
    Unseen,
    Consistent(FieldKind),
    Mixed,
}

impl ColumnKind {
    fn observe(&mut self, kind: FieldKind) {
        *self = match *self {
            ColumnKind::Unseen => ColumnKind::Consistent(kind),
            ColumnKind::Consistent(seen) if seen == kind => ColumnKind::Consistent(seen),
            _ => ColumnKind::Mixed,
        };
    }
}

#[derive(Debug, Clone, Copy)]
struct DelimiterStats {
    /// Share of records whose delimiter count equals the modal count
    consistency: f32,
    score: f32,
}

impl DelimiterStats {
    /// `None` when the delimiter never splits a record
    fn measure(sample: &str, dialect: &Dialect) -> Option<Self> {
        let counts: Vec<usize> = parse_sample(sample, dialect)
            .iter()
            .map(|record| record.len().saturating_sub(1))
            .collect();
        if counts.is_empty() {
            return None;
        }

        let mut frequencies = std::collections::BTreeMap::new();
        for &count in &counts {
            *frequencies.entry(count).or_insert(0usize) += 1;
        }
        let (&mode, &mode_frequency) = frequencies
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then(a.0.cmp(b.0)))?;
        if mode == 0 {
            return None;
        }

        let n = counts.len() as f32;
        let avg = counts.iter().sum::<usize>() as f32 / n;
        let variance = counts
            .iter()
            .map(|&x| (x as f32 - avg).powi(2))
            .sum::<f32>()
            / n;

        Some(Self {
            consistency: mode_frequency as f32 / n,
            score: avg / (1.0 + variance.sqrt()),
        })
    }
}

/// Parse a sample leniently, stopping at the first malformed record
fn parse_sample(sample: &str, dialect: &Dialect) -> Vec<Record> {
    let mut reader = csv_builder(dialect).from_reader(sample.as_bytes());
    reader
        .records()
        .map_while(|record| record.ok())
        .map(|record| {
            record
                .iter()
                .map(|field| trim_field(field, dialect).to_string())
                .collect()
        })
        .collect()
}

/// Drop a trailing partial line left by the sample budget
fn complete_lines(body: &[u8]) -> &[u8] {
    match body.iter().rposition(|&b| b == b'\n' || b == b'\r') {
        Some(end) if end + 1 < body.len() => {
            warn!(dropped = body.len() - end - 1, "Dropping partial trailing line from sample");
            &body[..=end]
        }
        _ => body,
    }
}

/// Sniff a stream from offset 0.
///
/// Reads at most `sample_size` bytes and leaves the stream at offset 0.
pub fn sniff_stream<R: Read + Seek>(
    stream: &mut R,
    detector: &dyn DialectDetector,
    sample_size: usize,
) -> Result<Sniffed> {
    stream.seek(SeekFrom::Start(0))?;
    let mut prefix = Vec::new();
    (&mut *stream)
        .take(sample_size as u64)
        .read_to_end(&mut prefix)?;
    stream.seek(SeekFrom::Start(0))?;

    let encoding = TextEncoding::detect(&prefix)?;
    let mut body = &prefix[encoding.origin() as usize..];
    if prefix.len() == sample_size {
        body = complete_lines(body);
    }

    let sample = encoding.decode(body);
    if sample.contains('\u{FFFD}') {
        warn!(encoding = encoding.name(), "Sample decoded lossily");
    }
    if sample.trim().is_empty() {
        return Err(ReaderError::DialectDetection("stream is empty".to_string()));
    }

    let detection = detector.detect(&sample)?;
    debug!(
        dialect = %detection.dialect,
        has_header = detection.has_header,
        encoding = encoding.name(),
        sample_bytes = body.len(),
        "Sniffed delimited stream"
    );

    Ok(Sniffed {
        detection,
        encoding,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use test_case::test_case;

    #[test_case("a,b,c\nd,e,f\n", b','; "comma")]
    #[test_case("a;b;c\nd;e;f\n", b';'; "semicolon")]
    #[test_case("a\tb\tc\nd\te\tf\n", b'\t'; "tab")]
    #[test_case("a|b\n1|2\n3|4\n", b'|'; "pipe")]
    #[test_case("name;note\n\"x;y\";1\n\"z\";2\n", b';'; "quoted delimiter")]
    #[test_case("id,text\n1,the quick brown fox jumps\n2,the lazy dog sat down here\n", b','; "spaces in values")]
    fn test_detect_delimiter(sample: &str, expected: u8) {
        let dialect = CsvSniffer::new().sniff_dialect(sample).unwrap();
        assert_eq!(dialect.delimiter, expected);
    }

    #[test]
    fn test_comma_in_value_does_not_win_over_consistent_semicolon() {
        let dialect = CsvSniffer::new()
            .sniff_dialect("a;b;c\n1;2,5;3\n4;5,5;6\n")
            .unwrap();
        assert_eq!(dialect.delimiter, b';');
    }

    #[test]
    fn test_single_quote_detection() {
        let dialect = CsvSniffer::new()
            .sniff_dialect("'a,x','b'\n'c,y','d'\n")
            .unwrap();
        assert_eq!(dialect.quote, b'\'');
        assert_eq!(dialect.delimiter, b',');
    }

    #[test]
    fn test_escape_detection() {
        let dialect = CsvSniffer::new()
            .sniff_dialect("a,b\n\"say \\\"hi\\\"\",2\n")
            .unwrap();
        assert_eq!(dialect.escape, Some(b'\\'));
        assert!(!dialect.double_quote);
    }

    #[test]
    fn test_skip_initial_space() {
        let sniffer = CsvSniffer::new();
        assert!(sniffer.sniff_dialect("a, b\n1, 2\n").unwrap().skip_initial_space);
        assert!(!sniffer.sniff_dialect("a,b\n1, 2\n").unwrap().skip_initial_space);
    }

    #[test]
    fn test_single_column_fails() {
        let err = CsvSniffer::new().sniff_dialect("a\nb\nc\n").unwrap_err();
        assert!(matches!(err, ReaderError::DialectDetection(_)));
    }

    #[test]
    fn test_delimiter_missing_from_most_rows_fails() {
        let err = CsvSniffer::new().sniff_dialect("a,b\nc\nd\n").unwrap_err();
        assert!(matches!(err, ReaderError::DialectDetection(_)));
    }

    #[test]
    fn test_sniff_stream_tolerates_oversized_budget() {
        let mut stream = Cursor::new(b"a,b\n1,2\n".to_vec());
        let sniffed = sniff_stream(&mut stream, &CsvSniffer::new(), usize::MAX).unwrap();
        assert_eq!(sniffed.detection.dialect.delimiter, b',');
    }

    #[test]
    fn test_empty_sample_fails() {
        let err = CsvSniffer::new().sniff_dialect("  \n").unwrap_err();
        assert!(matches!(err, ReaderError::DialectDetection(_)));
    }

    #[test_case("a,b\n1,2\n3,4\n", true; "text over numbers")]
    #[test_case("1,2\n3,4\n", false; "uniform numbers")]
    #[test_case("name,born\nada,1815-12-10\nalan,1912-06-23\n", true; "text over dates")]
    #[test_case("ab,cd\nef,gh\n", false; "same length text")]
    #[test_case("ab,title\ncd,x\nef,yy\n", false; "mixed text lengths abstain")]
    #[test_case("name,age\n", true; "single row")]
    fn test_has_header(sample: &str, expected: bool) {
        let sniffer = CsvSniffer::new();
        let dialect = sniffer.sniff_dialect(sample).unwrap();
        assert_eq!(sniffer.has_header(sample, &dialect), expected);
    }

    #[test]
    fn test_probe_rows_limit() {
        // The third row turns column kinds mixed, unless it is never probed
        let sample = "a,b\n1,2\nc,d\n";
        let dialect = CsvSniffer::new().sniff_dialect(sample).unwrap();

        assert!(!CsvSniffer::new().has_header(sample, &dialect));
        assert!(CsvSniffer::new()
            .with_header_probe_rows(1)
            .has_header(sample, &dialect));
    }

    #[test]
    fn test_sniff_stream_rewinds_and_trims_partial_line() {
        // 4 + 8 * 7 bytes of whole lines, then a cut-off "10,2"
        let data = format!("a,b\n{}", "10,200\n".repeat(40));
        let mut stream = Cursor::new(data.into_bytes());
        stream.set_position(7);

        let sniffed = sniff_stream(&mut stream, &CsvSniffer::new(), 64).unwrap();

        assert_eq!(stream.position(), 0);
        assert_eq!(sniffed.detection.dialect.delimiter, b',');
        assert!(sniffed.detection.has_header);
        assert_eq!(sniffed.encoding.name(), "UTF-8");
    }

    #[test]
    fn test_sniff_stream_empty() {
        let mut stream = Cursor::new(Vec::new());
        let err = sniff_stream(&mut stream, &CsvSniffer::new(), 1024).unwrap_err();
        assert!(matches!(err, ReaderError::DialectDetection(_)));
    }

    #[test]
    fn test_complete_lines() {
        assert_eq!(complete_lines(b"a,b\n1,"), b"a,b\n");
        assert_eq!(complete_lines(b"a,b\n"), b"a,b\n");
        assert_eq!(complete_lines(b"a,b"), b"a,b");
    }
}
