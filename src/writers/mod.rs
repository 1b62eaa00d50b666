pub mod csv_writer;
pub mod sink;

pub use csv_writer::{AtomicOutput, JoinedCsvWriter, OUTPUT_COLUMNS};
pub use sink::RecordSink;
