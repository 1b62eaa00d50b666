pub mod joined;
pub mod measurement;
pub mod pollutant;
pub mod position;

pub use joined::JoinedRecord;
pub use measurement::MeasurementRecord;
pub use pollutant::{check_limit, LimitCheck, Pollutant, PollutantLimits};
pub use position::PositionRecord;
