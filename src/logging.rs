//! Run-log sink
//!
//! Progress and summary lines are pushed through an explicit sink owned by the
//! caller rather than a global stdout override. The default sink tees every
//! line to stdout and a log file and flushes the file after each line, so an
//! interrupted run keeps the lines already emitted.

use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Destination for run progress/summary lines
pub trait ProgressSink {
    /// Append one line, flushing deterministically
    fn append_line(&mut self, line: &str) -> Result<()>;
}

/// Default sink: duplicate every line to stdout and a log file
pub struct RunLog {
    file: File,
    echo: bool,
}

impl RunLog {
    /// Open (appending) the log file at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open run log {:?}", path))?;
        Ok(Self { file, echo: true })
    }

    /// Disable the stdout copy (log file only)
    pub fn quiet(mut self) -> Self {
        self.echo = false;
        self
    }
}

impl ProgressSink for RunLog {
    fn append_line(&mut self, line: &str) -> Result<()> {
        if self.echo {
            println!("{}", line);
        }
        writeln!(self.file, "{}", line).context("Failed to write run log line")?;
        self.file.flush().context("Failed to flush run log")?;
        Ok(())
    }
}

/// In-memory sink, handy for tests
impl ProgressSink for Vec<String> {
    fn append_line(&mut self, line: &str) -> Result<()> {
        self.push(line.to_string());
        Ok(())
    }
}
