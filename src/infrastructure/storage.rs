use std::fs::{self, File};
use std::io;
use std::path::Path;

/// Open a delimited-text file for reading.
///
/// Directories are rejected up front; on some platforms `File::open` accepts
/// them and only the first read fails.
pub fn open_csv_file(path: &Path) -> io::Result<File> {
    let metadata = fs::metadata(path)?;
    if !metadata.is_file() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is not a regular file", path.display()),
        ));
    }
    File::open(path)
}
