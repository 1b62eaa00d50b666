use csv::WriterBuilder;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{ProcessingError, Result};
use crate::models::JoinedRecord;
use crate::writers::RecordSink;

pub const OUTPUT_COLUMNS: [&str; 7] = [
    "timestamp",
    "latitude",
    "longitude",
    "no2",
    "voc",
    "pm10",
    "pm25",
];

/// Delimited writer for joined records.
pub struct JoinedCsvWriter<W: Write> {
    writer: csv::Writer<W>,
    records_written: u64,
}

impl<W: Write> JoinedCsvWriter<W> {
    pub fn new(inner: W, delimiter: u8, write_header: bool) -> Result<Self> {
        let mut writer = WriterBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .from_writer(inner);

        if write_header {
            writer.write_record(OUTPUT_COLUMNS)?;
        }

        Ok(Self {
            writer,
            records_written: 0,
        })
    }

    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Flush and hand back the underlying writer.
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| {
                let err = e.error();
                ProcessingError::Io(std::io::Error::new(err.kind(), err.to_string()))
            })
    }
}

impl<W: Write> RecordSink for JoinedCsvWriter<W> {
    fn emit(&mut self, record: &JoinedRecord) -> Result<()> {
        self.writer.serialize(record)?;
        self.records_written += 1;
        Ok(())
    }
}

/// Output file that only appears at its final path once committed.
///
/// Records go to a temporary file next to the target; dropping the writer
/// without calling [`AtomicOutput::commit`] removes it.
pub struct AtomicOutput {
    target: PathBuf,
    writer: JoinedCsvWriter<NamedTempFile>,
}

impl AtomicOutput {
    pub fn create(target: &Path, delimiter: u8, write_header: bool) -> Result<Self> {
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let temp =
            NamedTempFile::new_in(dir).map_err(|e| ProcessingError::open_write(target, e))?;
        debug!(temp = %temp.path().display(), target = %target.display(), "opened output");

        Ok(Self {
            target: target.to_path_buf(),
            writer: JoinedCsvWriter::new(temp, delimiter, write_header)?,
        })
    }

    /// Flush and move the file into place.
    pub fn commit(self) -> Result<PathBuf> {
        let temp = self.writer.into_inner()?;
        temp.persist(&self.target)
            .map_err(|e| ProcessingError::open_write(&self.target, e.error))?;
        Ok(self.target)
    }
}

impl RecordSink for AtomicOutput {
    fn emit(&mut self, record: &JoinedRecord) -> Result<()> {
        self.writer.emit(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> JoinedRecord {
        JoinedRecord {
            timestamp: 110,
            latitude: 45.0,
            longitude: 9.0,
            no2: 5.0,
            voc: 5.0,
            pm10: 5.0,
            pm25: 5.0,
        }
    }

    #[test]
    fn test_writes_header_and_records() -> Result<()> {
        let mut writer = JoinedCsvWriter::new(Vec::new(), b',', true)?;
        writer.emit(&sample())?;

        let output = String::from_utf8(writer.into_inner()?).unwrap();
        assert_eq!(
            output,
            "timestamp,latitude,longitude,no2,voc,pm10,pm25\n110,45.0,9.0,5.0,5.0,5.0,5.0\n"
        );

        Ok(())
    }

    #[test]
    fn test_without_header_and_custom_delimiter() -> Result<()> {
        let mut writer = JoinedCsvWriter::new(Vec::new(), b';', false)?;
        writer.emit(&sample())?;
        assert_eq!(writer.records_written(), 1);

        let output = String::from_utf8(writer.into_inner()?).unwrap();
        assert_eq!(output, "110;45.0;9.0;5.0;5.0;5.0;5.0\n");

        Ok(())
    }

    #[test]
    fn test_atomic_output_only_appears_on_commit() -> Result<()> {
        let dir = TempDir::new()?;
        let target = dir.path().join("out.csv");

        let mut output = AtomicOutput::create(&target, b',', true)?;
        output.emit(&sample())?;
        assert!(!target.exists());

        let written = output.commit()?;
        assert_eq!(written, target);
        let content = std::fs::read_to_string(&target)?;
        assert_eq!(content.lines().count(), 2);

        Ok(())
    }

    #[test]
    fn test_atomic_output_dropped_leaves_nothing() -> Result<()> {
        let dir = TempDir::new()?;
        let target = dir.path().join("out.csv");

        {
            let mut output = AtomicOutput::create(&target, b',', true)?;
            output.emit(&sample())?;
        }

        assert!(!target.exists());
        assert_eq!(std::fs::read_dir(dir.path())?.count(), 0);

        Ok(())
    }

    #[test]
    fn test_unwritable_directory_names_target() {
        let target = Path::new("/nonexistent-dir/out.csv");

        match AtomicOutput::create(target, b',', true) {
            Err(ProcessingError::FileAccess { path, mode, .. }) => {
                assert_eq!(path, target);
                assert_eq!(mode, "writing");
            }
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("creating output in a missing directory should fail"),
        }
    }
}
