use crate::error::Result;
use crate::models::JoinedRecord;

/// Downstream consumer of accepted pairings. Output is append-only.
pub trait RecordSink {
    fn emit(&mut self, record: &JoinedRecord) -> Result<()>;
}

impl RecordSink for Vec<JoinedRecord> {
    fn emit(&mut self, record: &JoinedRecord) -> Result<()> {
        self.push(*record);
        Ok(())
    }
}

impl<S: RecordSink + ?Sized> RecordSink for &mut S {
    fn emit(&mut self, record: &JoinedRecord) -> Result<()> {
        (**self).emit(record)
    }
}

/// Feeds every record to both sinks, first `A` then `B`.
impl<A: RecordSink, B: RecordSink> RecordSink for (A, B) {
    fn emit(&mut self, record: &JoinedRecord) -> Result<()> {
        self.0.emit(record)?;
        self.1.emit(record)
    }
}
