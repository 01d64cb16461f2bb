use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use crate::application::CsvPreviewUseCase;
use crate::domain::csv::{ReaderConfig, Record};
use crate::infrastructure::config::ConfigService;
use crate::infrastructure::csv::DelimitedReader;

#[derive(Parser, Debug)]
#[command(name = "csvloop", about = "Sniff and read delimited text files")]
pub struct Cli {
    /// TOML config file (`loop`, `sample_size`, `header_probe_rows`)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Print records as JSON arrays
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the sniffed dialect, encoding and header.
    Inspect { path: PathBuf },
    /// Print the first data record.
    Head { path: PathBuf },
    /// Print the last data record.
    Tail { path: PathBuf },
    /// Print records in file order.
    Iter {
        path: PathBuf,
        /// Maximum number of records to print.
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Wrap to the first data record at end of file.
        #[arg(long = "loop")]
        cyclic: bool,
    },
    /// Print a JSON summary of the file.
    Preview {
        path: PathBuf,
        /// Number of iterated records to include.
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

/// Run one command, writing its output to `out`
pub fn execute<W: Write>(cli: Cli, out: &mut W) -> Result<()> {
    let Cli {
        config: config_path,
        json,
        command,
    } = cli;

    let mut config = ConfigService::new()
        .load(config_path.as_deref())
        .context("failed to load config")?;

    match command {
        Commands::Inspect { path } => {
            let reader = open(&path, config)?;
            writeln!(out, "dialect: {}", reader.dialect())?;
            writeln!(out, "encoding: {}", reader.encoding_name())?;
            writeln!(out, "header: {}", reader.header_presented())?;
            if let Some(header) = reader.header() {
                write_record(out, header, json)?;
            }
        }
        Commands::Head { path } => {
            let mut reader = open(&path, config)?;
            match reader.head() {
                Ok(record) => write_record(out, &record, json)?,
                Err(err) if err.is_end_of_stream() => write_empty(out, &path)?,
                Err(err) => return Err(err).context("failed to read first record"),
            }
        }
        Commands::Tail { path } => {
            let mut reader = open(&path, config)?;
            match reader.tail() {
                Ok(record) => write_record(out, &record, json)?,
                Err(err) if err.is_end_of_stream() => write_empty(out, &path)?,
                Err(err) => return Err(err).context("failed to read last record"),
            }
        }
        Commands::Iter {
            path,
            limit,
            cyclic,
        } => {
            config.cyclic |= cyclic;
            let mut reader = open(&path, config)?;
            for (idx, record) in reader.iterate()?.take(limit).enumerate() {
                let record =
                    record.with_context(|| format!("failed to read record {}", idx + 1))?;
                write_record(out, &record, json)?;
            }
        }
        Commands::Preview { path, limit } => {
            let preview = CsvPreviewUseCase::new(limit)
                .preview_path(&path, config)
                .with_context(|| format!("failed to preview {}", path.display()))?;
            serde_json::to_writer_pretty(&mut *out, &preview)?;
            writeln!(out)?;
        }
    }

    Ok(())
}

fn open(path: &Path, config: ReaderConfig) -> Result<DelimitedReader<File>> {
    DelimitedReader::from_path(path, config)
        .with_context(|| format!("failed to open {}", path.display()))
}

fn write_record<W: Write>(out: &mut W, record: &Record, json: bool) -> Result<()> {
    if json {
        serde_json::to_writer(&mut *out, record)?;
        writeln!(out)?;
    } else {
        writeln!(out, "{}", record.join("\t"))?;
    }
    Ok(())
}

fn write_empty<W: Write>(out: &mut W, path: &Path) -> Result<()> {
    info!(path = %path.display(), "No data records");
    writeln!(out, "(no data records)")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TempCsv(PathBuf);

    impl TempCsv {
        fn new(name: &str, content: &str) -> Self {
            let path = std::env::temp_dir().join(format!(
                "csvloop-cli-{}-{}.csv",
                std::process::id(),
                name
            ));
            std::fs::write(&path, content).unwrap();
            Self(path)
        }
    }

    impl Drop for TempCsv {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.0);
        }
    }

    fn run(args: &[&str]) -> String {
        let cli = Cli::try_parse_from(args).unwrap();
        let mut out = Vec::new();
        execute(cli, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_head_and_tail() {
        let file = TempCsv::new("head", "a,b\n1,2\n3,4\n");
        let path = file.0.to_str().unwrap();

        assert_eq!(run(&["csvloop", "head", path]), "1\t2\n");
        assert_eq!(run(&["csvloop", "tail", "--json", path]), "[\"3\",\"4\"]\n");
    }

    #[test]
    fn test_iter_loop_wraps() {
        let file = TempCsv::new("iter", "a,b\n1,2\n3,4\n");
        let path = file.0.to_str().unwrap();

        let output = run(&["csvloop", "iter", "--loop", "--limit", "3", path]);
        assert_eq!(output, "1\t2\n3\t4\n1\t2\n");

        let output = run(&["csvloop", "iter", "--limit", "3", path]);
        assert_eq!(output, "1\t2\n3\t4\n");
    }

    #[test]
    fn test_inspect() {
        let file = TempCsv::new("inspect", "name;age\nann;31\nbob;42\n");
        let output = run(&["csvloop", "inspect", file.0.to_str().unwrap()]);

        assert!(output.contains("delimiter=;"));
        assert!(output.contains("encoding: UTF-8"));
        assert!(output.contains("header: true"));
        assert!(output.ends_with("name\tage\n"));
    }

    #[test]
    fn test_preview_is_json() {
        let file = TempCsv::new("preview", "1,2\n3,4\n");
        let output = run(&["csvloop", "preview", file.0.to_str().unwrap()]);
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(json["header_presented"], false);
        assert_eq!(json["tail"][1], "4");
    }

    #[test]
    fn test_missing_file_fails() {
        let cli = Cli::try_parse_from(["csvloop", "head", "/no/such/file.csv"]).unwrap();
        let err = execute(cli, &mut Vec::<u8>::new()).unwrap_err();
        assert!(err.to_string().contains("failed to open"));
    }
}
