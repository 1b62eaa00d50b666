use serde::Serialize;

use crate::error::Result;
use crate::models::{check_limit, JoinedRecord, LimitCheck, Pollutant, PollutantLimits};
use crate::utils::constants::REPORT_TOP_EXCEEDANCES;
use crate::utils::timestamp::describe_timestamp;
use crate::writers::RecordSink;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exceedance {
    pub timestamp: u64,
    pub latitude: f64,
    pub longitude: f64,
    pub value: f32,
    pub percent_over: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdReport {
    pub pollutant: Pollutant,
    pub limit: f32,
    pub observations: u64,
    pub exceedance_count: u64,
    pub mean_value: Option<f32>,
    pub max_value: Option<f32>,
    /// Worst exceedances, highest percentage first
    pub top_exceedances: Vec<Exceedance>,
}

impl ThresholdReport {
    pub fn exceedance_rate(&self) -> f64 {
        if self.observations == 0 {
            0.0
        } else {
            100.0 * self.exceedance_count as f64 / self.observations as f64
        }
    }

    /// Text report in the same layout as the join summary
    pub fn summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str(&format!("=== {} Threshold Report ===\n", self.pollutant));
        summary.push_str(&format!("Limit: {}\n", self.limit));
        summary.push_str(&format!("Observations: {}\n", self.observations));
        summary.push_str(&format!(
            "Over limit: {} ({:.1}%)\n",
            self.exceedance_count,
            self.exceedance_rate()
        ));

        if let (Some(mean), Some(max)) = (self.mean_value, self.max_value) {
            summary.push_str(&format!("Mean: {:.2}, Max: {:.2}\n", mean, max));
        }

        if !self.top_exceedances.is_empty() {
            summary.push_str(&format!(
                "\nTop {} Exceedances:\n",
                self.top_exceedances.len()
            ));
            for (i, exceedance) in self.top_exceedances.iter().enumerate() {
                summary.push_str(&format!(
                    "  {}. {} at ({:.5}, {:.5}): {:.2} (+{}%)\n",
                    i + 1,
                    describe_timestamp(exceedance.timestamp),
                    exceedance.latitude,
                    exceedance.longitude,
                    exceedance.value,
                    exceedance.percent_over
                ));
            }
        }

        summary
    }
}

/// Checks joined records for one pollutant against its regulatory limit.
pub struct ThresholdChecker {
    pollutant: Pollutant,
    limit: f32,
    observations: u64,
    exceedance_count: u64,
    sum: f64,
    max_value: Option<f32>,
    top_exceedances: Vec<Exceedance>,
}

impl ThresholdChecker {
    pub fn new(pollutant: Pollutant, limits: &PollutantLimits) -> Self {
        Self {
            pollutant,
            limit: limits.limit_for(pollutant),
            observations: 0,
            exceedance_count: 0,
            sum: 0.0,
            max_value: None,
            top_exceedances: Vec::new(),
        }
    }

    pub fn observe(&mut self, record: &JoinedRecord) -> LimitCheck {
        let value = self.pollutant.value(record);
        let check = check_limit(value, self.limit);

        self.observations += 1;
        self.sum += value as f64;
        self.max_value = Some(self.max_value.map_or(value, |m| m.max(value)));

        if check.exceeded {
            self.exceedance_count += 1;
            self.top_exceedances.push(Exceedance {
                timestamp: record.timestamp,
                latitude: record.latitude,
                longitude: record.longitude,
                value,
                percent_over: check.percent_over,
            });
            // Stable sort keeps the earliest record first among equal percentages
            self.top_exceedances
                .sort_by(|a, b| b.percent_over.cmp(&a.percent_over));
            self.top_exceedances.truncate(REPORT_TOP_EXCEEDANCES);
        }

        check
    }

    pub fn report(&self) -> ThresholdReport {
        let mean_value = if self.observations == 0 {
            None
        } else {
            Some((self.sum / self.observations as f64) as f32)
        };

        ThresholdReport {
            pollutant: self.pollutant,
            limit: self.limit,
            observations: self.observations,
            exceedance_count: self.exceedance_count,
            mean_value,
            max_value: self.max_value,
            top_exceedances: self.top_exceedances.clone(),
        }
    }
}

impl RecordSink for ThresholdChecker {
    fn emit(&mut self, record: &JoinedRecord) -> Result<()> {
        self.observe(record);
        Ok(())
    }
}
