use serde::Serialize;
use std::fmt;

use crate::utils::timestamp::describe_timestamp;

/// Which input stream a cursor belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Position,
    Measurement,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Position => f.write_str("positions"),
            Side::Measurement => f.write_str("measurements"),
        }
    }
}

/// Why the join loop stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Termination {
    Exhausted {
        side: Side,
    },
    Malformed {
        side: Side,
        line: u64,
        reason: String,
    },
}

impl Termination {
    pub fn side(&self) -> Side {
        match self {
            Termination::Exhausted { side } | Termination::Malformed { side, .. } => *side,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Termination::Malformed { .. })
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Exhausted { side } => write!(f, "end of {}", side),
            Termination::Malformed { side, line, reason } => {
                write!(f, "malformed line {} in {}: {}", line, side, reason)
            }
        }
    }
}

/// Counters collected over one join run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JoinSummary {
    pub max_spread: u64,
    pub positions_read: u64,
    pub measurements_read: u64,
    pub pairings_evaluated: u64,
    pub records_emitted: u64,
    pub pairings_rejected: u64,
    pub first_timestamp: Option<u64>,
    pub last_timestamp: Option<u64>,
    pub termination: Option<Termination>,
}

impl JoinSummary {
    pub fn new(max_spread: u64) -> Self {
        Self {
            max_spread,
            ..Self::default()
        }
    }

    pub(crate) fn record_read(&mut self, side: Side) {
        match side {
            Side::Position => self.positions_read += 1,
            Side::Measurement => self.measurements_read += 1,
        }
    }

    pub(crate) fn record_emitted(&mut self, timestamp: u64) {
        self.pairings_evaluated += 1;
        self.records_emitted += 1;
        self.first_timestamp.get_or_insert(timestamp);
        self.last_timestamp = Some(timestamp);
    }

    pub(crate) fn record_rejected(&mut self) {
        self.pairings_evaluated += 1;
        self.pairings_rejected += 1;
    }

    pub fn acceptance_rate(&self) -> f64 {
        if self.pairings_evaluated == 0 {
            0.0
        } else {
            100.0 * self.records_emitted as f64 / self.pairings_evaluated as f64
        }
    }

    pub fn summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("=== Join Summary ===\n");
        summary.push_str(&format!("Max spread: {}\n", self.max_spread));
        summary.push_str(&format!("Positions read: {}\n", self.positions_read));
        summary.push_str(&format!("Measurements read: {}\n", self.measurements_read));
        summary.push_str(&format!(
            "Pairings evaluated: {}\n",
            self.pairings_evaluated
        ));
        summary.push_str(&format!(
            "Records emitted: {} ({:.1}%)\n",
            self.records_emitted,
            self.acceptance_rate()
        ));
        summary.push_str(&format!("Pairings rejected: {}\n", self.pairings_rejected));

        if let (Some(first), Some(last)) = (self.first_timestamp, self.last_timestamp) {
            summary.push_str(&format!(
                "Time span: {} .. {}\n",
                describe_timestamp(first),
                describe_timestamp(last)
            ));
        }

        if let Some(termination) = &self.termination {
            summary.push_str(&format!("Stopped at: {}\n", termination));
        }

        summary
    }
}
