//! Report rendering.
//!
//! The report is written to stdout in one of two formats; logs stay on
//! stderr so either format can be piped.

mod human;
mod json;

pub use human::HumanFormatter;
pub use json::JsonFormatter;

use crate::config::OutputFormat;
use crate::run::RunReport;

pub trait OutputFormatter {
    fn format_run(&self, report: &RunReport) -> String;
}

pub fn get_formatter(format: OutputFormat, use_colors: bool) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Human if use_colors => Box::new(HumanFormatter::new()),
        OutputFormat::Human => Box::new(HumanFormatter::new().without_colors()),
        OutputFormat::Json => Box::new(JsonFormatter::new()),
    }
}
