use clap::Parser;
use std::path::PathBuf;

use crate::models::Pollutant;

#[derive(Parser, Debug)]
#[command(name = "sensor-merge")]
#[command(about = "Join a GPS position track with air-quality measurements by timestamp")]
#[command(version)]
pub struct Cli {
    #[arg(help = "Position CSV (timestamp,date,latitude,longitude)")]
    pub positions: PathBuf,

    #[arg(help = "Measurement CSV (timestamp,date,no2,voc,pm10,pm25 + 4 unused columns)")]
    pub measurements: PathBuf,

    #[arg(
        required_unless_present = "validate_only",
        help = "Output CSV (timestamp,latitude,longitude,no2,voc,pm10,pm25)"
    )]
    pub output: Option<PathBuf>,

    #[arg(
        short,
        long,
        help = "Maximum timestamp gap for a pairing [default: 60]"
    )]
    pub spread: Option<u64>,

    #[arg(short, long, help = "Field delimiter for inputs and output [default: ,]")]
    pub delimiter: Option<char>,

    #[arg(short, long, help = "Settings file (TOML, YAML or JSON)")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Do not write a header row to the output")]
    pub no_header: bool,

    #[arg(long, help = "Fail on a malformed input line instead of stopping cleanly")]
    pub strict: bool,

    #[arg(short, long, value_enum, help = "Report limit exceedances for this pollutant")]
    pub pollutant: Option<Pollutant>,

    #[arg(
        short,
        long,
        conflicts_with_all = ["pollutant", "json"],
        help = "Choose the pollutant to report from a menu"
    )]
    pub interactive: bool,

    #[arg(long, help = "Check both inputs without joining or writing output")]
    pub validate_only: bool,

    #[arg(long, help = "Print the run summary as JSON")]
    pub json: bool,

    #[arg(short, long, help = "Hide the progress spinner")]
    pub quiet: bool,

    #[arg(short, long, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, help = "Log file path")]
    pub log_file: Option<PathBuf>,
}
