// ============================================================
// DIALECT
// ============================================================
// Lexical rules needed to split a line into fields

use std::fmt;

/// Delimiter and quoting rules inferred from a sample.
///
/// Immutable once detected: a reader keeps the same dialect for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    /// Field separator
    pub delimiter: u8,

    /// Character wrapping fields that contain the delimiter or line breaks
    pub quote: u8,

    /// Whether a doubled quote inside a quoted field stands for one quote
    pub double_quote: bool,

    /// Escape character for quotes, when the data uses one instead of doubling
    pub escape: Option<u8>,

    /// Strip spaces that directly follow a delimiter
    pub skip_initial_space: bool,
}

impl Default for Dialect {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            double_quote: true,
            escape: None,
            skip_initial_space: false,
        }
    }
}

impl Dialect {
    /// Create a dialect with the given delimiter and default quoting
    pub fn with_delimiter(delimiter: u8) -> Self {
        Self {
            delimiter,
            ..Default::default()
        }
    }

    /// Printable name of the delimiter (`\t` and space are spelled out)
    pub fn delimiter_name(&self) -> String {
        match self.delimiter {
            b'\t' => "tab".to_string(),
            b' ' => "space".to_string(),
            other => (other as char).to_string(),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "delimiter={} quote={} double_quote={}",
            self.delimiter_name(),
            self.quote as char,
            self.double_quote
        )?;
        if let Some(escape) = self.escape {
            write!(f, " escape={}", escape as char)?;
        }
        if self.skip_initial_space {
            write!(f, " skip_initial_space")?;
        }
        Ok(())
    }
}
