//! Verbose progress output for agents and crews.

use chrono::Local;

use crate::utilities::printer::{Printer, PrinterColor};

/// Prints timestamped progress lines when verbose.
#[derive(Debug, Clone)]
pub struct Logger {
    pub verbose: bool,
    pub default_color: PrinterColor,
    printer: Printer,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(false)
    }
}

impl Logger {
    pub fn new(verbose: bool) -> Self {
        Self::with_printer(verbose, Printer::default())
    }

    pub fn with_printer(verbose: bool, printer: Printer) -> Self {
        Self {
            verbose,
            default_color: PrinterColor::BoldYellow,
            printer,
        }
    }

    /// Log a message with timestamp if verbose mode is enabled.
    pub fn log(&self, level: &str, message: &str, color: Option<PrinterColor>) {
        if !self.verbose {
            return;
        }
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let formatted = format!("\n[{}][{}]: {}", timestamp, level.to_uppercase(), message);
        self.printer
            .print(&formatted, color.unwrap_or(self.default_color));
    }
}
