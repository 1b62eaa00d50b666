pub mod join_summary;
pub mod source_scanner;
pub mod temporal_join;
pub mod threshold_checker;

pub use join_summary::{JoinSummary, Side, Termination};
pub use source_scanner::{scan_source, SourceScan};
pub use temporal_join::{Cursors, JoinConfig, MalformedPolicy, StepOutcome, TemporalJoin};
pub use threshold_checker::{Exceedance, ThresholdChecker, ThresholdReport};
