use serde::{Deserialize, Serialize};

use crate::models::{MeasurementRecord, PositionRecord};

/// A measurement tagged with the position the sensor was at.
///
/// Field order matches the output columns:
/// `timestamp,latitude,longitude,no2,voc,pm10,pm25`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JoinedRecord {
    pub timestamp: u64,
    pub latitude: f64,
    pub longitude: f64,
    pub no2: f32,
    pub voc: f32,
    pub pm10: f32,
    pub pm25: f32,
}

impl JoinedRecord {
    /// Combine a position and a measurement. The measurement's timestamp is kept.
    pub fn from_pair(position: &PositionRecord, measurement: &MeasurementRecord) -> Self {
        Self {
            timestamp: measurement.timestamp,
            latitude: position.latitude,
            longitude: position.longitude,
            no2: measurement.no2,
            voc: measurement.voc,
            pm10: measurement.pm10,
            pm25: measurement.pm25,
        }
    }
}
