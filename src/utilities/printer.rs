//! Console printer with color support.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Available colors for printed output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrinterColor {
    Plain,
    Red,
    Green,
    Yellow,
    Cyan,
    BoldRed,
    BoldGreen,
    BoldYellow,
    BoldBlue,
    BoldPurple,
}

impl PrinterColor {
    fn ansi_code(&self) -> &'static str {
        match self {
            Self::Plain => "",
            Self::Red => "\x1b[31m",
            Self::Green => "\x1b[32m",
            Self::Yellow => "\x1b[33m",
            Self::Cyan => "\x1b[36m",
            Self::BoldRed => "\x1b[1;31m",
            Self::BoldGreen => "\x1b[1;32m",
            Self::BoldYellow => "\x1b[1;33m",
            Self::BoldBlue => "\x1b[1;34m",
            Self::BoldPurple => "\x1b[1;35m",
        }
    }
}

const RESET: &str = "\x1b[0m";

/// Printer for console output.
///
/// A capturing printer records lines instead of writing them to stdout.
#[derive(Debug, Clone, Default)]
pub struct Printer {
    capture: Option<Arc<Mutex<Vec<String>>>>,
}

impl Printer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A printer that records every printed line.
    pub fn capturing() -> Self {
        Self {
            capture: Some(Arc::new(Mutex::new(Vec::new()))),
        }
    }

    /// Lines recorded by a capturing printer, without color codes.
    pub fn captured(&self) -> Vec<String> {
        self.capture
            .as_ref()
            .map(|c| c.lock().clone())
            .unwrap_or_default()
    }

    /// Print a message with the specified color.
    pub fn print(&self, content: &str, color: PrinterColor) {
        if let Some(ref capture) = self.capture {
            capture.lock().push(content.to_string());
            return;
        }
        match color {
            PrinterColor::Plain => println!("{}", content),
            _ => println!("{}{}{}", color.ansi_code(), content, RESET),
        }
    }

    /// Print an uncolored line.
    pub fn println(&self, content: &str) {
        self.print(content, PrinterColor::Plain);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capturing_printer_records_lines() {
        let printer = Printer::capturing();
        let clone = printer.clone();
        printer.println("first");
        clone.print("second", PrinterColor::BoldGreen);
        assert_eq!(printer.captured(), vec!["first", "second"]);
    }

    #[test]
    fn test_plain_printer_captures_nothing() {
        let printer = Printer::new();
        assert!(printer.captured().is_empty());
    }
}
