use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::marker::PhantomData;
use std::path::Path;
use tracing::debug;

use crate::error::{ProcessingError, Result};
use crate::readers::field::{parse_fields, FieldSpec, FieldValue};
use crate::utils::constants::DEFAULT_BUFFER_SIZE;

/// Result of asking a source for its next record.
///
/// End of input and a corrupt line are different outcomes. I/O failures are
/// reported through the surrounding `Result` instead.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome<T> {
    Record(T),
    EndOfSource,
    Malformed(MalformedLine),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MalformedLine {
    pub line: u64,
    pub reason: String,
}

/// A record type with a fixed column layout.
pub trait DelimitedRecord: Sized {
    fn layout() -> &'static [FieldSpec];

    /// Build the record from the extracted values, in layout order.
    fn from_fields(fields: &[FieldValue]) -> Option<Self>;

    fn timestamp(&self) -> u64;
}

/// Pull-based source of typed records.
pub trait RecordStream {
    type Record;

    fn source_name(&self) -> &str;

    fn next_record(&mut self) -> Result<ReadOutcome<Self::Record>>;
}

impl<S: RecordStream + ?Sized> RecordStream for &mut S {
    type Record = S::Record;

    fn source_name(&self) -> &str {
        (**self).source_name()
    }

    fn next_record(&mut self) -> Result<ReadOutcome<Self::Record>> {
        (**self).next_record()
    }
}

/// Line-at-a-time delimited reader that converts columns by `FieldSpec`.
pub struct FieldReader<R: Read> {
    reader: csv::Reader<R>,
    record: StringRecord,
    name: String,
    header_skipped: bool,
    last_line: u64,
}

impl FieldReader<BufReader<File>> {
    pub fn open(path: &Path, delimiter: u8, name: &str) -> Result<Self> {
        let file = File::open(path).map_err(|e| ProcessingError::open_read(path, e))?;
        let reader = BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file);
        Ok(Self::from_reader(reader, delimiter, name))
    }
}

impl<R: Read> FieldReader<R> {
    pub fn from_reader(reader: R, delimiter: u8, name: &str) -> Self {
        let reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .trim(Trim::All)
            .from_reader(reader);

        Self {
            reader,
            record: StringRecord::new(),
            name: name.to_string(),
            header_skipped: false,
            last_line: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Line number of the last line consumed (1-based, 0 before any read).
    pub fn line(&self) -> u64 {
        self.last_line
    }

    /// Consume the header row. Only the first call reads anything; it
    /// returns whether a line was consumed.
    pub fn skip_header(&mut self) -> Result<bool> {
        if self.header_skipped {
            return Ok(false);
        }
        self.header_skipped = true;

        match self.read_raw()? {
            ReadOutcome::Record(()) => {
                debug!(source = %self.name, line = self.last_line, "skipped header");
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Read and convert the next line.
    pub fn next_fields(&mut self, specs: &[FieldSpec]) -> Result<ReadOutcome<Vec<FieldValue>>> {
        match self.read_raw()? {
            ReadOutcome::Record(()) => match parse_fields(specs, &self.record) {
                Ok(values) => Ok(ReadOutcome::Record(values)),
                Err(reason) => Ok(ReadOutcome::Malformed(MalformedLine {
                    line: self.last_line,
                    reason,
                })),
            },
            ReadOutcome::EndOfSource => Ok(ReadOutcome::EndOfSource),
            ReadOutcome::Malformed(line) => Ok(ReadOutcome::Malformed(line)),
        }
    }

    fn read_raw(&mut self) -> Result<ReadOutcome<()>> {
        match self.reader.read_record(&mut self.record) {
            Ok(true) => {
                self.last_line = self
                    .record
                    .position()
                    .map(|p| p.line())
                    .unwrap_or(self.last_line + 1);
                Ok(ReadOutcome::Record(()))
            }
            Ok(false) => Ok(ReadOutcome::EndOfSource),
            Err(e) if e.is_io_error() => Err(e.into()),
            Err(e) => {
                self.last_line = e
                    .position()
                    .map(|p| p.line())
                    .unwrap_or(self.last_line + 1);
                Ok(ReadOutcome::Malformed(MalformedLine {
                    line: self.last_line,
                    reason: e.to_string(),
                }))
            }
        }
    }
}

/// Typed reader for one record layout.
pub struct RecordReader<R: Read, T> {
    fields: FieldReader<R>,
    records_read: u64,
    _record: PhantomData<T>,
}

impl<T: DelimitedRecord> RecordReader<BufReader<File>, T> {
    pub fn open(path: &Path, delimiter: u8, name: &str) -> Result<Self> {
        Ok(Self::new(FieldReader::open(path, delimiter, name)?))
    }
}

impl<R: Read, T: DelimitedRecord> RecordReader<R, T> {
    pub fn new(fields: FieldReader<R>) -> Self {
        Self {
            fields,
            records_read: 0,
            _record: PhantomData,
        }
    }

    pub fn from_reader(reader: R, delimiter: u8, name: &str) -> Self {
        Self::new(FieldReader::from_reader(reader, delimiter, name))
    }

    pub fn skip_header(&mut self) -> Result<bool> {
        self.fields.skip_header()
    }

    pub fn records_read(&self) -> u64 {
        self.records_read
    }
}

impl<R: Read, T: DelimitedRecord> RecordStream for RecordReader<R, T> {
    type Record = T;

    fn source_name(&self) -> &str {
        self.fields.name()
    }

    fn next_record(&mut self) -> Result<ReadOutcome<T>> {
        let line = match self.fields.next_fields(T::layout())? {
            ReadOutcome::Record(values) => match T::from_fields(&values) {
                Some(record) => {
                    self.records_read += 1;
                    return Ok(ReadOutcome::Record(record));
                }
                None => MalformedLine {
                    line: self.fields.line(),
                    reason: "extracted fields do not match the record layout".to_string(),
                },
            },
            ReadOutcome::EndOfSource => return Ok(ReadOutcome::EndOfSource),
            ReadOutcome::Malformed(line) => line,
        };

        Ok(ReadOutcome::Malformed(line))
    }
}
