pub mod args;
pub mod commands;
pub mod logging;
pub mod menu;

pub use args::Cli;
pub use commands::{join_files, run, validate_inputs, RunReport, ValidationReport};
pub use logging::init_logging;
pub use menu::prompt_pollutant;
