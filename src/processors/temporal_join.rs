//! Streaming join of the position track with the measurement stream.
//!
//! Both inputs are read one record at a time in timestamp order. The engine
//! keeps exactly one current record per side and, on each step, advances the
//! side whose current timestamp is older. After every advance the gap between
//! the two current timestamps is compared with the configured spread, and the
//! pair is emitted when the gap is strictly smaller.
//!
//! The loop stops as soon as either side runs out, even if the other still
//! has records. A malformed line also stops it, but is reported as its own
//! [`Termination`] so that corruption can be told apart from a clean end.

use serde::{Deserialize, Serialize};
use std::ops::ControlFlow;
use tracing::{debug, info, warn};

use crate::error::{ProcessingError, Result};
use crate::models::{JoinedRecord, MeasurementRecord, PositionRecord};
use crate::processors::join_summary::{JoinSummary, Side, Termination};
use crate::readers::{ReadOutcome, RecordStream};
use crate::utils::constants::DEFAULT_MAX_SPREAD;
use crate::utils::progress::ProgressReporter;
use crate::writers::RecordSink;

/// What to do when an input line cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    /// Stop the join and report the line in the summary.
    #[default]
    Halt,
    /// Stop the join with [`ProcessingError::MalformedRecord`].
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinConfig {
    pub max_spread: u64,
    pub malformed_policy: MalformedPolicy,
}

impl Default for JoinConfig {
    fn default() -> Self {
        Self {
            max_spread: DEFAULT_MAX_SPREAD,
            malformed_policy: MalformedPolicy::Halt,
        }
    }
}

impl JoinConfig {
    pub fn with_max_spread(mut self, max_spread: u64) -> Self {
        self.max_spread = max_spread;
        self
    }

    pub fn with_malformed_policy(mut self, policy: MalformedPolicy) -> Self {
        self.malformed_policy = policy;
        self
    }
}

/// The current record of each side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cursors {
    pub position: PositionRecord,
    pub measurement: MeasurementRecord,
}

impl Cursors {
    /// The side to read next. Ties advance the measurement side.
    pub fn stale_side(&self) -> Side {
        if self.position.timestamp < self.measurement.timestamp {
            Side::Position
        } else {
            Side::Measurement
        }
    }

    pub fn gap(&self) -> u64 {
        self.position.timestamp.abs_diff(self.measurement.timestamp)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum JoinState {
    /// No record read yet on either side.
    Unprimed,
    Running(Cursors),
    Terminated(Termination),
}

/// Result of a single [`TemporalJoin::step`].
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// A pairing was evaluated. `advanced` is `None` for the priming step,
    /// which reads both sides once.
    Evaluated {
        advanced: Option<Side>,
        gap: u64,
        emitted: Option<JoinedRecord>,
    },
    Finished(Termination),
}

pub struct TemporalJoin<P, M> {
    positions: P,
    measurements: M,
    config: JoinConfig,
    state: JoinState,
    summary: JoinSummary,
}

impl<P, M> TemporalJoin<P, M>
where
    P: RecordStream<Record = PositionRecord>,
    M: RecordStream<Record = MeasurementRecord>,
{
    pub fn new(positions: P, measurements: M, config: JoinConfig) -> Self {
        Self {
            positions,
            measurements,
            config,
            state: JoinState::Unprimed,
            summary: JoinSummary::new(config.max_spread),
        }
    }

    pub fn summary(&self) -> &JoinSummary {
        &self.summary
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, JoinState::Terminated(_))
    }

    /// Advance the join by one read and evaluate the resulting pair.
    ///
    /// The first call primes both cursors. Every later call reads from
    /// exactly one side. Once finished, further calls return the same
    /// [`StepOutcome::Finished`] without reading.
    pub fn step(&mut self) -> Result<StepOutcome> {
        let (advanced, cursors) = match self.state.clone() {
            JoinState::Terminated(termination) => return Ok(StepOutcome::Finished(termination)),
            JoinState::Unprimed => {
                let position = match self.read_position()? {
                    ControlFlow::Continue(record) => record,
                    ControlFlow::Break(termination) => return Ok(self.finish(termination)),
                };
                let measurement = match self.read_measurement()? {
                    ControlFlow::Continue(record) => record,
                    ControlFlow::Break(termination) => return Ok(self.finish(termination)),
                };
                (
                    None,
                    Cursors {
                        position,
                        measurement,
                    },
                )
            }
            JoinState::Running(mut cursors) => {
                let side = cursors.stale_side();
                match side {
                    Side::Position => match self.read_position()? {
                        ControlFlow::Continue(record) => cursors.position = record,
                        ControlFlow::Break(termination) => return Ok(self.finish(termination)),
                    },
                    Side::Measurement => match self.read_measurement()? {
                        ControlFlow::Continue(record) => cursors.measurement = record,
                        ControlFlow::Break(termination) => return Ok(self.finish(termination)),
                    },
                }
                (Some(side), cursors)
            }
        };

        self.state = JoinState::Running(cursors);
        Ok(self.evaluate(advanced, &cursors))
    }

    /// Drive the join to completion, sending accepted pairs to `sink`.
    pub fn run<S: RecordSink>(self, sink: &mut S) -> Result<JoinSummary> {
        self.run_with_progress(sink, None)
    }

    pub fn run_with_progress<S: RecordSink>(
        mut self,
        sink: &mut S,
        progress: Option<&ProgressReporter>,
    ) -> Result<JoinSummary> {
        info!(
            positions = self.positions.source_name(),
            measurements = self.measurements.source_name(),
            max_spread = self.config.max_spread,
            "starting temporal join"
        );

        while !self.is_finished() {
            if let StepOutcome::Evaluated {
                emitted: Some(record),
                ..
            } = self.step()?
            {
                sink.emit(&record)?;
                if let Some(p) = progress {
                    p.increment(1);
                }
            }
        }

        let summary = self.summary();
        info!(
            emitted = summary.records_emitted,
            rejected = summary.pairings_rejected,
            positions_read = summary.positions_read,
            measurements_read = summary.measurements_read,
            "temporal join finished"
        );

        Ok(self.summary)
    }

    fn read_position(&mut self) -> Result<ControlFlow<Termination, PositionRecord>> {
        let outcome = self.positions.next_record()?;
        self.resolve(Side::Position, outcome)
    }

    fn read_measurement(&mut self) -> Result<ControlFlow<Termination, MeasurementRecord>> {
        let outcome = self.measurements.next_record()?;
        self.resolve(Side::Measurement, outcome)
    }

    fn resolve<T>(
        &mut self,
        side: Side,
        outcome: ReadOutcome<T>,
    ) -> Result<ControlFlow<Termination, T>> {
        match outcome {
            ReadOutcome::Record(record) => {
                self.summary.record_read(side);
                Ok(ControlFlow::Continue(record))
            }
            ReadOutcome::EndOfSource => {
                info!(source = self.source_name(side), "input exhausted");
                Ok(ControlFlow::Break(Termination::Exhausted { side }))
            }
            ReadOutcome::Malformed(malformed) => {
                warn!(
                    source = self.source_name(side),
                    line = malformed.line,
                    reason = %malformed.reason,
                    "malformed record, stopping join"
                );
                let termination = Termination::Malformed {
                    side,
                    line: malformed.line,
                    reason: malformed.reason.clone(),
                };

                match self.config.malformed_policy {
                    MalformedPolicy::Halt => Ok(ControlFlow::Break(termination)),
                    MalformedPolicy::Fail => {
                        let source_name = self.source_name(side).to_string();
                        self.finish(termination);
                        Err(ProcessingError::MalformedRecord {
                            source_name,
                            line: malformed.line,
                            reason: malformed.reason,
                        })
                    }
                }
            }
        }
    }

    fn source_name(&self, side: Side) -> &str {
        match side {
            Side::Position => self.positions.source_name(),
            Side::Measurement => self.measurements.source_name(),
        }
    }

    fn evaluate(&mut self, advanced: Option<Side>, cursors: &Cursors) -> StepOutcome {
        let gap = cursors.gap();

        let emitted = if gap < self.config.max_spread {
            let record = JoinedRecord::from_pair(&cursors.position, &cursors.measurement);
            self.summary.record_emitted(record.timestamp);
            Some(record)
        } else {
            self.summary.record_rejected();
            None
        };

        debug!(
            advanced = ?advanced,
            position_ts = cursors.position.timestamp,
            measurement_ts = cursors.measurement.timestamp,
            gap,
            accepted = emitted.is_some(),
            "evaluated pairing"
        );

        StepOutcome::Evaluated {
            advanced,
            gap,
            emitted,
        }
    }

    fn finish(&mut self, termination: Termination) -> StepOutcome {
        self.summary.termination = Some(termination.clone());
        self.state = JoinState::Terminated(termination.clone());
        StepOutcome::Finished(termination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readers::{MalformedLine, RecordReader};
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use std::collections::VecDeque;
    use std::io::Cursor;
    use std::rc::Rc;

    /// In-memory stream that counts read requests.
    struct ScriptedStream<T> {
        name: &'static str,
        outcomes: VecDeque<ReadOutcome<T>>,
        requests: Rc<Cell<u64>>,
    }

    impl<T> ScriptedStream<T> {
        fn new(name: &'static str, records: Vec<T>) -> Self {
            Self::scripted(name, records.into_iter().map(ReadOutcome::Record).collect())
        }

        fn scripted(name: &'static str, outcomes: Vec<ReadOutcome<T>>) -> Self {
            Self {
                name,
                outcomes: outcomes.into(),
                requests: Rc::new(Cell::new(0)),
            }
        }

        fn requests(&self) -> Rc<Cell<u64>> {
            Rc::clone(&self.requests)
        }
    }

    impl<T> RecordStream for ScriptedStream<T> {
        type Record = T;

        fn source_name(&self) -> &str {
            self.name
        }

        fn next_record(&mut self) -> Result<ReadOutcome<T>> {
            self.requests.set(self.requests.get() + 1);
            Ok(self.outcomes.pop_front().unwrap_or(ReadOutcome::EndOfSource))
        }
    }

    fn pos(timestamp: u64) -> PositionRecord {
        PositionRecord::new(timestamp, 45.0, 9.0)
    }

    fn meas(timestamp: u64) -> MeasurementRecord {
        MeasurementRecord::new(timestamp, 5.0, 5.0, 5.0, 5.0)
    }

    fn join_all(
        positions: Vec<PositionRecord>,
        measurements: Vec<MeasurementRecord>,
        max_spread: u64,
    ) -> (Vec<JoinedRecord>, JoinSummary) {
        let join = TemporalJoin::new(
            ScriptedStream::new("positions", positions),
            ScriptedStream::new("measurements", measurements),
            JoinConfig::default().with_max_spread(max_spread),
        );
        let mut output = Vec::new();
        let summary = join.run(&mut output).unwrap();
        (output, summary)
    }

    #[test]
    fn test_close_timestamps_are_joined() {
        let (output, summary) = join_all(vec![pos(100)], vec![meas(110)], 60);

        assert_eq!(
            output,
            vec![JoinedRecord {
                timestamp: 110,
                latitude: 45.0,
                longitude: 9.0,
                no2: 5.0,
                voc: 5.0,
                pm10: 5.0,
                pm25: 5.0,
            }]
        );
        assert_eq!(summary.records_emitted, 1);
        assert_eq!(
            summary.termination,
            Some(Termination::Exhausted {
                side: Side::Position
            })
        );
    }

    #[test]
    fn test_distant_timestamps_are_not_joined() {
        let (output, summary) = join_all(vec![pos(100)], vec![meas(200)], 60);

        assert!(output.is_empty());
        assert_eq!(summary.pairings_evaluated, 1);
        assert_eq!(summary.pairings_rejected, 1);
    }

    #[test]
    fn test_equal_timestamps_advance_measurement() {
        let positions = ScriptedStream::new("positions", vec![pos(100), pos(130)]);
        let measurements = ScriptedStream::new("measurements", vec![meas(100)]);
        let position_reads = positions.requests();
        let measurement_reads = measurements.requests();
        let mut join = TemporalJoin::new(positions, measurements, JoinConfig::default());

        let primed = join.step().unwrap();
        assert_eq!(
            primed,
            StepOutcome::Evaluated {
                advanced: None,
                gap: 0,
                emitted: Some(JoinedRecord::from_pair(&pos(100), &meas(100))),
            }
        );

        let next = join.step().unwrap();
        assert_eq!(
            next,
            StepOutcome::Finished(Termination::Exhausted {
                side: Side::Measurement
            })
        );
        assert_eq!(position_reads.get(), 1);
        assert_eq!(measurement_reads.get(), 2);
        assert_eq!(join.summary().pairings_evaluated, 1);
    }

    #[test]
    fn test_tie_in_running_state_reads_measurement() {
        let cursors = Cursors {
            position: pos(500),
            measurement: meas(500),
        };
        assert_eq!(cursors.stale_side(), Side::Measurement);

        let cursors = Cursors {
            position: pos(499),
            measurement: meas(500),
        };
        assert_eq!(cursors.stale_side(), Side::Position);
    }

    #[test]
    fn test_one_read_per_step() {
        let positions = ScriptedStream::new("positions", vec![pos(0), pos(50), pos(90), pos(200)]);
        let measurements =
            ScriptedStream::new("measurements", vec![meas(10), meas(60), meas(120), meas(130)]);
        let position_reads = positions.requests();
        let measurement_reads = measurements.requests();
        let mut join = TemporalJoin::new(positions, measurements, JoinConfig::default());

        join.step().unwrap();
        assert_eq!(position_reads.get() + measurement_reads.get(), 2);

        loop {
            let before = (position_reads.get(), measurement_reads.get());
            let outcome = join.step().unwrap();
            let after = (position_reads.get(), measurement_reads.get());

            let total = (after.0 - before.0) + (after.1 - before.1);
            assert_eq!(total, 1, "each running step reads exactly one record");

            match outcome {
                StepOutcome::Evaluated {
                    advanced: Some(Side::Position),
                    ..
                } => assert_eq!(after.0 - before.0, 1),
                StepOutcome::Evaluated {
                    advanced: Some(Side::Measurement),
                    ..
                } => assert_eq!(after.1 - before.1, 1),
                StepOutcome::Evaluated { advanced: None, .. } => {
                    panic!("only the priming step has no advanced side")
                }
                StepOutcome::Finished(_) => break,
            }
        }
    }

    #[test]
    fn test_step_after_finish_does_not_read() {
        let positions = ScriptedStream::new("positions", vec![]);
        let measurements = ScriptedStream::new("measurements", vec![meas(1)]);
        let measurement_reads = measurements.requests();
        let mut join = TemporalJoin::new(positions, measurements, JoinConfig::default());

        let first = join.step().unwrap();
        let second = join.step().unwrap();

        assert_eq!(first, second);
        assert!(join.is_finished());
        // Priming reads positions first and stops before touching measurements
        assert_eq!(measurement_reads.get(), 0);
    }

    #[test]
    fn test_spread_boundary_is_exclusive() {
        let (output, _) = join_all(vec![pos(100)], vec![meas(160)], 60);
        assert!(output.is_empty());

        let (output, _) = join_all(vec![pos(100)], vec![meas(159)], 60);
        assert_eq!(output.len(), 1);

        let (output, _) = join_all(vec![pos(100)], vec![meas(100)], 0);
        assert!(output.is_empty(), "a zero spread accepts nothing");
    }

    #[test]
    fn test_stops_when_either_side_is_exhausted() {
        // Measurements run out while positions still have records
        let (output, summary) = join_all(
            vec![pos(0), pos(30), pos(60), pos(90)],
            vec![meas(0)],
            60,
        );

        assert_eq!(output.len(), 1);
        assert_eq!(summary.positions_read, 1);
        assert_eq!(
            summary.termination,
            Some(Termination::Exhausted {
                side: Side::Measurement
            })
        );
    }

    #[test]
    fn test_every_close_pair_visited_is_emitted_once() {
        let positions: Vec<_> = (0..20).map(|i| pos(i * 30)).collect();
        let measurements: Vec<_> = (0..12).map(|i| meas(i * 50 + 5)).collect();

        let join = TemporalJoin::new(
            ScriptedStream::new("positions", positions),
            ScriptedStream::new("measurements", measurements),
            JoinConfig::default(),
        );
        let mut output = Vec::new();
        let summary = join.run(&mut output).unwrap();

        assert_eq!(output.len() as u64, summary.records_emitted);
        assert_eq!(
            summary.records_emitted + summary.pairings_rejected,
            summary.pairings_evaluated
        );
        assert!(output.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn test_terminates_within_total_record_count() {
        let m = 15u64;
        let n = 9u64;
        let positions = ScriptedStream::new("positions", (0..m).map(|i| pos(i * 7)).collect());
        let measurements =
            ScriptedStream::new("measurements", (0..n).map(|i| meas(i * 11)).collect());
        let mut join = TemporalJoin::new(positions, measurements, JoinConfig::default());

        let mut steps = 0;
        while !matches!(join.step().unwrap(), StepOutcome::Finished(_)) {
            steps += 1;
            assert!(steps <= m + n, "join did not terminate");
        }

        let summary = join.summary();
        assert!(summary.positions_read + summary.measurements_read <= m + n);
    }

    #[test]
    fn test_malformed_line_halts_by_default() {
        let measurements = ScriptedStream::scripted(
            "measurements",
            vec![
                ReadOutcome::Record(meas(100)),
                ReadOutcome::Malformed(MalformedLine {
                    line: 3,
                    reason: "expected 10 fields, found 9".to_string(),
                }),
                ReadOutcome::Record(meas(120)),
            ],
        );
        let positions = ScriptedStream::new("positions", vec![pos(100), pos(200)]);

        let mut output = Vec::new();
        let summary = TemporalJoin::new(positions, measurements, JoinConfig::default())
            .run(&mut output)
            .unwrap();

        assert_eq!(output.len(), 1);
        assert_eq!(
            summary.termination,
            Some(Termination::Malformed {
                side: Side::Measurement,
                line: 3,
                reason: "expected 10 fields, found 9".to_string(),
            })
        );
    }

    #[test]
    fn test_malformed_line_fails_when_configured() {
        let measurements = ScriptedStream::scripted(
            "measurements",
            vec![ReadOutcome::Malformed(MalformedLine {
                line: 2,
                reason: "field 3 (no2): 'x' is not a number".to_string(),
            })],
        );
        let positions = ScriptedStream::new("positions", vec![pos(100)]);
        let config = JoinConfig::default().with_malformed_policy(MalformedPolicy::Fail);
        let mut join = TemporalJoin::new(positions, measurements, config);

        match join.step() {
            Err(ProcessingError::MalformedRecord {
                source_name, line, ..
            }) => {
                assert_eq!(source_name, "measurements");
                assert_eq!(line, 2);
            }
            other => panic!("expected malformed record error, got {:?}", other),
        }
        assert!(join.is_finished());
    }

    fn bad_line(line: u64) -> MalformedLine {
        MalformedLine {
            line,
            reason: "expected 4 fields, found 3".to_string(),
        }
    }

    #[test]
    fn test_malformed_position_while_priming() {
        let positions =
            ScriptedStream::scripted("positions", vec![ReadOutcome::Malformed(bad_line(2))]);
        let measurements = ScriptedStream::new("measurements", vec![meas(100)]);
        let measurement_reads = measurements.requests();
        let mut join = TemporalJoin::new(positions, measurements, JoinConfig::default());

        assert_eq!(
            join.step().unwrap(),
            StepOutcome::Finished(Termination::Malformed {
                side: Side::Position,
                line: 2,
                reason: "expected 4 fields, found 3".to_string(),
            })
        );
        assert_eq!(measurement_reads.get(), 0);
        assert_eq!(join.summary().pairings_evaluated, 0);
    }

    #[test]
    fn test_malformed_position_while_running() {
        let positions = ScriptedStream::scripted(
            "positions",
            vec![
                ReadOutcome::Record(pos(100)),
                ReadOutcome::Malformed(bad_line(3)),
                ReadOutcome::Record(pos(200)),
            ],
        );
        let measurements = ScriptedStream::new("measurements", vec![meas(130), meas(150)]);

        let mut output = Vec::new();
        let summary = TemporalJoin::new(positions, measurements, JoinConfig::default())
            .run(&mut output)
            .unwrap();

        assert_eq!(output.len(), 1);
        assert_eq!(summary.positions_read, 1);
        assert_eq!(summary.measurements_read, 1);
        assert_eq!(
            summary.termination,
            Some(Termination::Malformed {
                side: Side::Position,
                line: 3,
                reason: "expected 4 fields, found 3".to_string(),
            })
        );
    }

    #[test]
    fn test_malformed_position_fails_when_configured() {
        let positions = ScriptedStream::scripted(
            "positions",
            vec![ReadOutcome::Record(pos(100)), ReadOutcome::Malformed(bad_line(3))],
        );
        let measurements = ScriptedStream::new("measurements", vec![meas(130)]);
        let config = JoinConfig::default().with_malformed_policy(MalformedPolicy::Fail);

        let mut output = Vec::new();
        let result = TemporalJoin::new(positions, measurements, config).run(&mut output);

        match result {
            Err(ProcessingError::MalformedRecord {
                source_name, line, ..
            }) => {
                assert_eq!(source_name, "positions");
                assert_eq!(line, 3);
            }
            other => panic!("expected malformed record error, got {:?}", other),
        }
        assert_eq!(output.len(), 1);
    }

    #[test]
    fn test_short_measurement_row_from_csv_is_reported() -> Result<()> {
        let mut positions: RecordReader<_, PositionRecord> = RecordReader::from_reader(
            Cursor::new(b"ts,date,lat,lon\n100,d,45.0,9.0\n130,d,45.1,9.1\n".to_vec()),
            b',',
            "positions",
        );
        let mut measurements: RecordReader<_, MeasurementRecord> = RecordReader::from_reader(
            Cursor::new(
                b"ts,date,no2,voc,pm10,pm25,a,b,c,d\n100,d,1,2,3,4,0,0,0\n".to_vec(),
            ),
            b',',
            "measurements",
        );
        positions.skip_header()?;
        measurements.skip_header()?;

        let mut output = Vec::new();
        let summary = TemporalJoin::new(&mut positions, &mut measurements, JoinConfig::default())
            .run(&mut output)?;

        assert!(output.is_empty());
        let termination = summary.termination.expect("join records why it stopped");
        assert!(termination.is_malformed());
        assert_eq!(termination.side(), Side::Measurement);

        Ok(())
    }
}
