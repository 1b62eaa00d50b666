use serde::{Deserialize, Serialize};

use crate::readers::field::{FieldKind, FieldSpec, FieldValue};
use crate::readers::DelimitedRecord;

/// Pollutant concentrations sampled by the air-quality sensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    pub timestamp: u64,
    pub no2: f32,
    pub voc: f32,
    pub pm10: f32,
    pub pm25: f32,
}

// timestamp, date, no2, voc, pm10, pm25, then four sensor columns we don't use
const MEASUREMENT_LAYOUT: [FieldSpec; 10] = [
    FieldSpec::extract("timestamp", FieldKind::UnsignedInt),
    FieldSpec::Ignore,
    FieldSpec::extract("no2", FieldKind::Float),
    FieldSpec::extract("voc", FieldKind::Float),
    FieldSpec::extract("pm10", FieldKind::Float),
    FieldSpec::extract("pm25", FieldKind::Float),
    FieldSpec::Ignore,
    FieldSpec::Ignore,
    FieldSpec::Ignore,
    FieldSpec::Ignore,
];

impl MeasurementRecord {
    pub fn new(timestamp: u64, no2: f32, voc: f32, pm10: f32, pm25: f32) -> Self {
        Self {
            timestamp,
            no2,
            voc,
            pm10,
            pm25,
        }
    }
}

impl DelimitedRecord for MeasurementRecord {
    fn layout() -> &'static [FieldSpec] {
        &MEASUREMENT_LAYOUT
    }

    fn from_fields(fields: &[FieldValue]) -> Option<Self> {
        match fields {
            [timestamp, no2, voc, pm10, pm25] => Some(Self::new(
                timestamp.as_u64()?,
                no2.as_f64()? as f32,
                voc.as_f64()? as f32,
                pm10.as_f64()? as f32,
                pm25.as_f64()? as f32,
            )),
            _ => None,
        }
    }

    fn timestamp(&self) -> u64 {
        self.timestamp
    }
}
