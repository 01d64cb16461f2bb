use thiserror::Error;

/// Errors raised while sniffing, reading or iterating delimited text.
#[derive(Debug, Error)]
pub enum ReaderError {
    /// The sample was empty or too ambiguous to infer a delimiter.
    #[error("Dialect detection error: {0}")]
    DialectDetection(String),

    /// `head()` / `tail()` found no data records. Treat as an empty dataset.
    #[error("End of stream: no data records")]
    EndOfStream,

    /// The header seen at construction could not be re-read on rewind.
    #[error("Header record missing on rewind; the stream changed underneath the reader")]
    HeaderVanished,

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl ReaderError {
    /// True for the recoverable "no data records" condition.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, ReaderError::EndOfStream)
    }
}

impl From<validator::ValidationErrors> for ReaderError {
    fn from(err: validator::ValidationErrors) -> Self {
        ReaderError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ReaderError>;
