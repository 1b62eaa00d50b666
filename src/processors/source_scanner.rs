use serde::Serialize;

use crate::error::Result;
use crate::readers::{DelimitedRecord, MalformedLine, ReadOutcome, RecordStream};
use crate::utils::timestamp::describe_timestamp;

/// Findings from reading a whole input without joining it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceScan {
    pub source: String,
    pub records: u64,
    pub malformed_lines: u64,
    pub first_malformed: Option<MalformedLine>,
    /// Records whose timestamp is older than the one before it
    pub out_of_order: u64,
    pub first_timestamp: Option<u64>,
    pub last_timestamp: Option<u64>,
}

impl SourceScan {
    /// A join over this source would read every record.
    pub fn is_clean(&self) -> bool {
        self.malformed_lines == 0 && self.out_of_order == 0
    }

    pub fn summary(&self) -> String {
        let mut summary = format!("{}: {} records", self.source, self.records);

        if let (Some(first), Some(last)) = (self.first_timestamp, self.last_timestamp) {
            summary.push_str(&format!(
                ", {} .. {}",
                describe_timestamp(first),
                describe_timestamp(last)
            ));
        }
        if self.out_of_order > 0 {
            summary.push_str(&format!(
                "\n  {} records out of timestamp order",
                self.out_of_order
            ));
        }
        if let Some(malformed) = &self.first_malformed {
            summary.push_str(&format!(
                "\n  {} malformed lines, first at line {}: {}",
                self.malformed_lines, malformed.line, malformed.reason
            ));
        }

        summary
    }
}

/// Read `stream` to the end, counting good and bad lines.
///
/// Unlike the join, a malformed line does not stop the scan.
pub fn scan_source<S>(stream: &mut S) -> Result<SourceScan>
where
    S: RecordStream,
    S::Record: DelimitedRecord,
{
    let mut scan = SourceScan {
        source: stream.source_name().to_string(),
        ..SourceScan::default()
    };

    loop {
        match stream.next_record()? {
            ReadOutcome::Record(record) => {
                let timestamp = record.timestamp();
                if scan.last_timestamp.is_some_and(|last| timestamp < last) {
                    scan.out_of_order += 1;
                }
                scan.records += 1;
                scan.first_timestamp.get_or_insert(timestamp);
                scan.last_timestamp = Some(timestamp);
            }
            ReadOutcome::Malformed(malformed) => {
                scan.malformed_lines += 1;
                scan.first_malformed.get_or_insert(malformed);
            }
            ReadOutcome::EndOfSource => break,
        }
    }

    Ok(scan)
}
