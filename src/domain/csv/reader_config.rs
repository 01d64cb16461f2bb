// ============================================================
// READER CONFIGURATION
// ============================================================
// Construction options for a delimited reader

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Default sniffing budget in bytes
pub const DEFAULT_SAMPLE_SIZE: usize = 1024;

/// Largest sniffing budget accepted, 1 MiB
pub const MAX_SAMPLE_SIZE: usize = 1_048_576;

/// Default number of rows compared against the candidate header
pub const DEFAULT_HEADER_PROBE_ROWS: usize = 20;

/// Options for building a `DelimitedReader`.
///
/// Dialect and header presence are always sniffed; they cannot be set here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ReaderConfig {
    /// Rewind to the first data record instead of ending iteration
    #[serde(rename = "loop")]
    pub cyclic: bool,

    /// Bytes of the stream prefix inspected by the sniffer
    #[validate(range(min = 64, max = 1_048_576))]
    pub sample_size: usize,

    /// Rows after the first compared when looking for a header
    #[validate(range(min = 1, max = 1000))]
    pub header_probe_rows: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            cyclic: false,
            sample_size: DEFAULT_SAMPLE_SIZE,
            header_probe_rows: DEFAULT_HEADER_PROBE_ROWS,
        }
    }
}

impl ReaderConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable cyclic iteration
    pub fn with_loop(mut self, cyclic: bool) -> Self {
        self.cyclic = cyclic;
        self
    }

    /// Set the sniffing budget
    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = sample_size;
        self
    }

    /// Set how many rows the header heuristic compares
    pub fn with_header_probe_rows(mut self, rows: usize) -> Self {
        self.header_probe_rows = rows;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ReaderConfig::default();
        assert!(!config.cyclic);
        assert_eq!(config.sample_size, 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_tiny_sample() {
        let config = ReaderConfig::new().with_sample_size(8);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sample_size_is_bounded() {
        assert!(ReaderConfig::new().with_sample_size(MAX_SAMPLE_SIZE).validate().is_ok());
        assert!(ReaderConfig::new().with_sample_size(MAX_SAMPLE_SIZE + 1).validate().is_err());
        assert!(ReaderConfig::new().with_sample_size(usize::MAX).validate().is_err());
    }

    #[test]
    fn test_rejects_zero_probe_rows() {
        let config = ReaderConfig::new().with_header_probe_rows(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_loop_key_is_serialized_as_loop() {
        let json = serde_json::to_value(ReaderConfig::new().with_loop(true)).unwrap();
        assert_eq!(json["loop"], serde_json::Value::Bool(true));

        let parsed: ReaderConfig = serde_json::from_str(r#"{"loop": true}"#).unwrap();
        assert!(parsed.cyclic);
        assert_eq!(parsed.sample_size, DEFAULT_SAMPLE_SIZE);
    }
}
