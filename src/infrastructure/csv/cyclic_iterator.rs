// ============================================================
// CYCLIC RECORD ITERATOR
// ============================================================
// Sequence of data records that optionally wraps to the start of data

use std::io::{Read, Seek};
use std::iter::FusedIterator;

use tracing::trace;

use super::DelimitedReader;
use crate::domain::csv::Record;
use crate::domain::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IterState {
    /// Cursor sits on a record boundary
    Positioned,
    /// Only reached on exhaustion of a cyclic iterator
    Rewinding,
    /// Terminal: end of a finite sequence, or a failed read
    Exhausted,
}

/// Iterator over the data records of a [`DelimitedReader`].
///
/// Yields `Ok(record)` in file order. A non-cyclic iterator ends after the
/// last record. A cyclic one seeks back to the text origin, discards the
/// header when the reader had one, and carries on from the first data record.
/// The header is never yielded.
///
/// Errors are yielded once; the iterator is fused afterwards. A cyclic
/// iterator over a stream without data records ends instead of spinning.
#[derive(Debug)]
pub struct CyclicRecordIterator<'a, R> {
    reader: &'a mut DelimitedReader<R>,
    skip_header: bool,
    cyclic: bool,
    state: IterState,
}

impl<'a, R: Read + Seek> CyclicRecordIterator<'a, R> {
    pub(crate) fn new(
        reader: &'a mut DelimitedReader<R>,
        skip_header: bool,
        cyclic: bool,
    ) -> Self {
        Self {
            reader,
            skip_header,
            cyclic,
            state: IterState::Positioned,
        }
    }

    pub fn is_cyclic(&self) -> bool {
        self.cyclic
    }

    /// True once the iterator has stopped for good
    pub fn is_exhausted(&self) -> bool {
        self.state == IterState::Exhausted
    }

    fn rewind_and_read(&mut self) -> Option<Result<Record>> {
        self.state = IterState::Rewinding;
        trace!(skip_header = self.skip_header, "Wrapping to start of data");

        let next = self
            .reader
            .rewind(self.skip_header)
            .and_then(|_| self.reader.read_record());

        match next {
            Ok(Some(record)) => {
                self.state = IterState::Positioned;
                Some(Ok(record))
            }
            Ok(None) => {
                self.state = IterState::Exhausted;
                None
            }
            Err(err) => {
                self.state = IterState::Exhausted;
                Some(Err(err))
            }
        }
    }
}

impl<R: Read + Seek> Iterator for CyclicRecordIterator<'_, R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state == IterState::Exhausted {
            return None;
        }

        match self.reader.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) if self.cyclic => self.rewind_and_read(),
            Ok(None) => {
                self.state = IterState::Exhausted;
                None
            }
            Err(err) => {
                self.state = IterState::Exhausted;
                Some(Err(err))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.state {
            IterState::Exhausted => (0, Some(0)),
            _ => (0, None),
        }
    }
}

impl<R: Read + Seek> FusedIterator for CyclicRecordIterator<'_, R> {}
