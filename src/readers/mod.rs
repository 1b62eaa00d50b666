pub mod field;
pub mod record_reader;

pub use field::{FieldKind, FieldSpec, FieldValue};
pub use record_reader::{
    DelimitedRecord, FieldReader, MalformedLine, ReadOutcome, RecordReader, RecordStream,
};
