// ============================================================
// TEXT ENCODING
// ============================================================
// Detect the byte encoding of a stream prefix and decode fields

use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use tracing::warn;

use crate::domain::error::{ReaderError, Result};

/// Encoding of a delimited stream plus the length of its byte-order mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextEncoding {
    encoding: &'static Encoding,
    bom_len: usize,
}

impl TextEncoding {
    /// Detect the encoding from the first bytes of a stream.
    ///
    /// A UTF-8 BOM is honoured and skipped. UTF-16 is rejected because the
    /// sniffer works on single-byte delimiters. Without a BOM, valid UTF-8 wins
    /// (a multi-byte sequence cut off by the sample budget still counts) and
    /// anything else falls back to Windows-1252.
    pub fn detect(prefix: &[u8]) -> Result<Self> {
        if let Some((encoding, bom_len)) = Encoding::for_bom(prefix) {
            if encoding != UTF_8 {
                return Err(ReaderError::DialectDetection(format!(
                    "{} input is not supported",
                    encoding.name()
                )));
            }
            return Ok(Self { encoding, bom_len });
        }

        match std::str::from_utf8(prefix) {
            Ok(_) => Ok(Self::utf8()),
            // Truncated trailing sequence, not invalid data
            Err(e) if e.error_len().is_none() => Ok(Self::utf8()),
            Err(e) => {
                warn!(
                    valid_up_to = e.valid_up_to(),
                    "Sample is not valid UTF-8, falling back to windows-1252"
                );
                Ok(Self {
                    encoding: WINDOWS_1252,
                    bom_len: 0,
                })
            }
        }
    }

    pub fn utf8() -> Self {
        Self {
            encoding: UTF_8,
            bom_len: 0,
        }
    }

    /// Canonical encoding name, e.g. `UTF-8`
    pub fn name(&self) -> &'static str {
        self.encoding.name()
    }

    /// Byte offset where the text starts (after any BOM)
    pub fn origin(&self) -> u64 {
        self.bom_len as u64
    }

    /// Decode one field. Malformed sequences become U+FFFD.
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Cow<'a, str> {
        if self.encoding == UTF_8 {
            String::from_utf8_lossy(bytes)
        } else {
            self.encoding.decode_without_bom_handling(bytes).0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_utf8() {
        let encoding = TextEncoding::detect("a,b\nü,2\n".as_bytes()).unwrap();
        assert_eq!(encoding.name(), "UTF-8");
        assert_eq!(encoding.origin(), 0);
    }

    #[test]
    fn test_utf8_bom_is_skipped() {
        let encoding = TextEncoding::detect(b"\xEF\xBB\xBFa,b\n").unwrap();
        assert_eq!(encoding.name(), "UTF-8");
        assert_eq!(encoding.origin(), 3);
    }

    #[test]
    fn test_truncated_multibyte_tail_is_still_utf8() {
        // "ü" is C3 BC; the sample budget cut it in half
        let encoding = TextEncoding::detect(b"a,b\n\xC3").unwrap();
        assert_eq!(encoding.name(), "UTF-8");
    }

    #[test]
    fn test_latin1_falls_back_to_windows_1252() {
        let encoding = TextEncoding::detect(b"name,city\nJos\xE9,M\xE1laga\n").unwrap();
        assert_eq!(encoding.name(), "windows-1252");
        assert_eq!(encoding.decode(b"Jos\xE9"), "José");
    }

    #[test]
    fn test_utf16_is_rejected() {
        let err = TextEncoding::detect(b"\xFF\xFEa\x00,\x00").unwrap_err();
        assert!(matches!(err, ReaderError::DialectDetection(_)));
    }
}
