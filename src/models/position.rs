use serde::{Deserialize, Serialize};

use crate::readers::field::{FieldKind, FieldSpec, FieldValue};
use crate::readers::DelimitedRecord;

/// One GPS fix from the position track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionRecord {
    pub timestamp: u64,
    pub latitude: f64,
    pub longitude: f64,
}

// timestamp, date, latitude, longitude
const POSITION_LAYOUT: [FieldSpec; 4] = [
    FieldSpec::extract("timestamp", FieldKind::UnsignedInt),
    FieldSpec::Ignore,
    FieldSpec::extract("latitude", FieldKind::Float),
    FieldSpec::extract("longitude", FieldKind::Float),
];

impl PositionRecord {
    pub fn new(timestamp: u64, latitude: f64, longitude: f64) -> Self {
        Self {
            timestamp,
            latitude,
            longitude,
        }
    }
}

impl DelimitedRecord for PositionRecord {
    fn layout() -> &'static [FieldSpec] {
        &POSITION_LAYOUT
    }

    fn from_fields(fields: &[FieldValue]) -> Option<Self> {
        match fields {
            [timestamp, latitude, longitude] => Some(Self::new(
                timestamp.as_u64()?,
                latitude.as_f64()?,
                longitude.as_f64()?,
            )),
            _ => None,
        }
    }

    fn timestamp(&self) -> u64 {
        self.timestamp
    }
}
