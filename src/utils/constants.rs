/// Input layout
pub const DEFAULT_DELIMITER: char = ',';
pub const POSITION_COLUMNS: usize = 4;
pub const MEASUREMENT_COLUMNS: usize = 10;

/// Join window, in timestamp units (seconds for the sensor exports)
pub const DEFAULT_MAX_SPREAD: u64 = 60;

/// Regulatory ceilings
pub const DEFAULT_MAX_NO2: f32 = 10.0; // ppb
pub const DEFAULT_MAX_VOC: f32 = 10.0; // ppb
pub const DEFAULT_MAX_PM10: f32 = 10.0; // ug/m3
pub const DEFAULT_MAX_PM25: f32 = 10.0; // ug/m3

/// Source names used in logs and errors
pub const POSITION_SOURCE: &str = "positions";
pub const MEASUREMENT_SOURCE: &str = "measurements";

/// Processing defaults
pub const DEFAULT_BUFFER_SIZE: usize = 8192 * 16; // 128KB
pub const ENV_PREFIX: &str = "SENSOR_MERGE";
pub const REPORT_TOP_EXCEEDANCES: usize = 10;

/// Earliest and latest timestamps rendered as calendar dates (2000-01-01 .. 2100-01-01)
pub const MIN_EPOCH_SECONDS: u64 = 946_684_800;
pub const MAX_EPOCH_SECONDS: u64 = 4_102_444_800;

/// Process exit codes (clap uses 2 for usage errors)
pub const EXIT_IO_ERROR: u8 = 3;
pub const EXIT_CONFIG_ERROR: u8 = 4;
pub const EXIT_MALFORMED_RECORD: u8 = 5;
