//! Progress reporting for a capture session

use super::{CaptureError, CaptureReport};
use crate::serial::PortConfig;
use chrono::Local;
use colored::Colorize;
use std::path::Path;

/// Receives every observable step of a capture session.
///
/// `record` is called once per decoded line, in arrival order. `closed` is
/// called exactly once if and only if the endpoint was opened.
pub trait CaptureSink {
    fn connected(&mut self, _port: &PortConfig) {}

    fn writing_to(&mut self, _path: &Path) {}

    fn record(&mut self, line: &str);

    fn finished(&mut self, _report: &CaptureReport) {}

    fn failed(&mut self, _error: &CaptureError) {}

    fn closed(&mut self, _endpoint: &str) {}
}

/// Prints the session to stdout/stderr
#[derive(Debug, Default, Clone)]
pub struct ConsoleSink {
    /// Prefix echoed lines with the local time
    pub show_timestamps: bool,
}

impl ConsoleSink {
    pub fn new(show_timestamps: bool) -> Self {
        Self { show_timestamps }
    }
}

impl CaptureSink for ConsoleSink {
    fn connected(&mut self, port: &PortConfig) {
        println!(
            "{} Connected to {} at {} baud",
            "[OK]".green().bold(),
            port.port_path.white().bold(),
            port.baud_rate
        );
    }

    fn writing_to(&mut self, path: &Path) {
        println!(
            "{} Saving data to {}...",
            "[LOG]".cyan().bold(),
            path.display().to_string().white()
        );
    }

    fn record(&mut self, line: &str) {
        if self.show_timestamps {
            let timestamp = Local::now().format("%H:%M:%S%.3f");
            println!("{} {}", timestamp.to_string().dimmed(), line);
        } else {
            println!("{}", line);
        }
    }

    fn finished(&mut self, report: &CaptureReport) {
        println!(
            "{} Capture of {} complete: {} lines saved to {} ({:.1}s)",
            "[OK]".green().bold(),
            report.endpoint,
            report.lines_written,
            report.output.display().to_string().white(),
            report.elapsed.as_secs_f64()
        );
    }

    fn failed(&mut self, error: &CaptureError) {
        eprintln!("{} {}", "[ERROR]".red().bold(), failure_message(error));
    }

    fn closed(&mut self, endpoint: &str) {
        println!(
            "{} Serial connection {} closed",
            "[*]".cyan().bold(),
            endpoint.white()
        );
    }
}

/// Console text for a failed session. `Unexpected` already names itself.
fn failure_message(error: &CaptureError) -> String {
    match error {
        CaptureError::Connection { .. } => format!("Serial port error: {}", error),
        CaptureError::Unexpected { .. } => error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_unexpected_failure_labelled_once() {
        let err = CaptureError::unexpected(
            "decoding a line",
            2,
            io::Error::new(io::ErrorKind::InvalidData, "invalid utf-8 sequence"),
        );
        let message = failure_message(&err);

        assert_eq!(
            message,
            "Unexpected error while decoding a line (2 lines saved): invalid utf-8 sequence"
        );
        assert_eq!(message.matches("Unexpected error").count(), 1);
    }

    #[test]
    fn test_connection_failure_labelled() {
        let err = CaptureError::Connection {
            endpoint: "COM3".to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "no such device"),
        };

        assert_eq!(
            failure_message(&err),
            "Serial port error: Failed to open serial port COM3: no such device"
        );
    }
}
