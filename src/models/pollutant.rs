use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use crate::error::{ProcessingError, Result};
use crate::models::JoinedRecord;
use crate::utils::constants::{DEFAULT_MAX_NO2, DEFAULT_MAX_PM10, DEFAULT_MAX_PM25, DEFAULT_MAX_VOC};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Pollutant {
    No2 = 1,
    Voc = 2,
    Pm10 = 3,
    Pm25 = 4,
}

impl Pollutant {
    pub const ALL: [Pollutant; 4] = [
        Pollutant::No2,
        Pollutant::Voc,
        Pollutant::Pm10,
        Pollutant::Pm25,
    ];

    /// Map a menu number (1-4) to a pollutant
    pub fn from_choice(choice: u8) -> Result<Self> {
        match choice {
            1 => Ok(Pollutant::No2),
            2 => Ok(Pollutant::Voc),
            3 => Ok(Pollutant::Pm10),
            4 => Ok(Pollutant::Pm25),
            _ => Err(ProcessingError::InvalidPollutant(format!(
                "option {} is not valid",
                choice
            ))),
        }
    }

    pub fn as_choice(&self) -> u8 {
        *self as u8
    }

    pub fn label(&self) -> &'static str {
        match self {
            Pollutant::No2 => "NO2 (ppb)",
            Pollutant::Voc => "VOC (ppb)",
            Pollutant::Pm10 => "PM10 (ug/m3)",
            Pollutant::Pm25 => "PM25 (ug/m3)",
        }
    }

    pub fn short_name(&self) -> &'static str {
        match self {
            Pollutant::No2 => "NO2",
            Pollutant::Voc => "VOC",
            Pollutant::Pm10 => "PM10",
            Pollutant::Pm25 => "PM2.5",
        }
    }

    pub fn value(&self, record: &JoinedRecord) -> f32 {
        match self {
            Pollutant::No2 => record.no2,
            Pollutant::Voc => record.voc,
            Pollutant::Pm10 => record.pm10,
            Pollutant::Pm25 => record.pm25,
        }
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Regulatory ceilings per pollutant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PollutantLimits {
    #[validate(range(exclusive_min = 0.0))]
    pub no2: f32,

    #[validate(range(exclusive_min = 0.0))]
    pub voc: f32,

    #[validate(range(exclusive_min = 0.0))]
    pub pm10: f32,

    #[validate(range(exclusive_min = 0.0))]
    pub pm25: f32,
}

impl Default for PollutantLimits {
    fn default() -> Self {
        Self {
            no2: DEFAULT_MAX_NO2,
            voc: DEFAULT_MAX_VOC,
            pm10: DEFAULT_MAX_PM10,
            pm25: DEFAULT_MAX_PM25,
        }
    }
}

impl PollutantLimits {
    pub fn limit_for(&self, pollutant: Pollutant) -> f32 {
        match pollutant {
            Pollutant::No2 => self.no2,
            Pollutant::Voc => self.voc,
            Pollutant::Pm10 => self.pm10,
            Pollutant::Pm25 => self.pm25,
        }
    }
}

/// Outcome of comparing one value against its ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LimitCheck {
    pub exceeded: bool,
    pub percent_over: i32,
}

/// `percent_over` is `round(100 * (value - limit) / limit)`, and 0 when the
/// value does not exceed the limit.
pub fn check_limit(value: f32, limit: f32) -> LimitCheck {
    if value > limit {
        LimitCheck {
            exceeded: true,
            percent_over: (100.0 * (value - limit) / limit).round() as i32,
        }
    } else {
        LimitCheck {
            exceeded: false,
            percent_over: 0,
        }
    }
}
