use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::records::Entry;

/// One destination for produced records. Sinks receive every row in
/// encounter order; `flush` is the durable commit point.
pub trait RecordSink {
    fn write(&mut self, entry: &Entry) -> anyhow::Result<()>;
    fn flush(&mut self) -> anyhow::Result<()>;
}

/// The primary sink: a CSV file in the 3-column export format.
#[derive(Debug)]
pub struct CsvFile {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl CsvFile {
    pub fn create(path: &Path, overwrite: bool) -> anyhow::Result<Self> {
        if !overwrite && path.exists() {
            anyhow::bail!("output already exists: {}", path.display());
        }

        let mut options = OpenOptions::new();
        options.write(true);
        if overwrite {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }
        let file = options
            .open(path)
            .with_context(|| format!("create output: {}", path.display()))?;

        Ok(Self {
            path: path.to_owned(),
            writer: csv::Writer::from_writer(file),
        })
    }
}

impl RecordSink for CsvFile {
    fn write(&mut self, entry: &Entry) -> anyhow::Result<()> {
        self.writer
            .write_record(entry.fields())
            .with_context(|| format!("write row: {}", self.path.display()))
    }

    fn flush(&mut self) -> anyhow::Result<()> {
        self.writer
            .flush()
            .with_context(|| format!("flush output: {}", self.path.display()))
    }
}

/// Mirrors rows to stdout so a long scan shows progress live.
pub struct Console {
    writer: csv::Writer<std::io::Stdout>,
}

impl Console {
    pub fn new() -> Self {
        Self {
            writer: csv::Writer::from_writer(std::io::stdout()),
        }
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordSink for Console {
    fn write(&mut self, entry: &Entry) -> anyhow::Result<()> {
        self.writer
            .write_record(entry.fields())
            .context("write row to stdout")?;
        // Rows should appear as they are produced, not at the end.
        self.writer.flush().context("flush stdout")
    }

    fn flush(&mut self) -> anyhow::Result<()> {
        self.writer.flush().context("flush stdout")
    }
}

/// Fan-out over the configured sinks. A failure in one sink is logged and
/// must not keep the row from reaching the others.
#[derive(Default)]
pub struct Exporter {
    sinks: Vec<Box<dyn RecordSink>>,
}

impl Exporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sink: Box<dyn RecordSink>) {
        self.sinks.push(sink);
    }

    pub fn write(&mut self, entry: &Entry) {
        for sink in &mut self.sinks {
            if let Err(err) = sink.write(entry) {
                tracing::error!(?err, title = %entry.name, "sink write failed");
            }
        }
    }

    pub fn flush(&mut self) {
        for sink in &mut self.sinks {
            if let Err(err) = sink.flush() {
                tracing::error!(?err, "sink flush failed");
            }
        }
    }
}
