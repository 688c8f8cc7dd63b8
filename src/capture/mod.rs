//! Timed serial capture
//!
//! Reads newline-terminated records from a serial endpoint for a fixed
//! wall-clock duration, echoing each one to a [`CaptureSink`] and appending
//! it to a freshly truncated text file.
//!
//! The session moves `Closed -> Open -> Capturing -> Closed`. Any error or the
//! deadline ends capturing; the endpoint is released on every path once it has
//! been opened.

pub mod error;
pub mod sink;

pub use error::CaptureError;
pub use sink::{CaptureSink, ConsoleSink};

use crate::serial::PortConfig;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

/// A readable, line-oriented serial endpoint.
pub trait Endpoint {
    /// Bytes that can be read without waiting.
    fn bytes_available(&mut self) -> io::Result<usize>;

    /// Append bytes up to and including the next `\n` to `line`, returning
    /// how many were appended. May return a partial line if the read times out.
    fn read_line(&mut self, line: &mut Vec<u8>) -> io::Result<usize>;

    /// Release the endpoint.
    fn close(self);
}

/// Something that can open endpoints by name.
pub trait Transport {
    type Endpoint: Endpoint;

    fn open(&self, config: &PortConfig) -> io::Result<Self::Endpoint>;
}

/// Parameters of one capture run
#[derive(Debug, Clone)]
pub struct CaptureSession {
    /// Endpoint name, baud rate and read timeout
    pub port: PortConfig,
    /// Output text file, truncated on start
    pub output: PathBuf,
    /// Wall-clock budget for the read loop
    pub duration: Duration,
    /// Pause after a poll finds nothing to read; zero busy-polls
    pub poll_interval: Duration,
}

/// Outcome of a completed session
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureReport {
    pub endpoint: String,
    pub output: PathBuf,
    pub lines_written: usize,
    pub elapsed: Duration,
}

/// Run one capture session.
///
/// Every failure is passed to `sink.failed` before the endpoint is released
/// and the error is returned.
pub fn capture<T, S>(
    transport: &T,
    session: &CaptureSession,
    sink: &mut S,
) -> Result<CaptureReport, CaptureError>
where
    T: Transport,
    S: CaptureSink + ?Sized,
{
    let endpoint_name = &session.port.port_path;
    log::info!(
        "capturing {} at {} baud into {} for {:?}",
        endpoint_name,
        session.port.baud_rate,
        session.output.display(),
        session.duration
    );

    let mut endpoint = match transport.open(&session.port) {
        Ok(endpoint) => endpoint,
        Err(source) => {
            let err = CaptureError::Connection {
                endpoint: endpoint_name.clone(),
                source,
            };
            log::warn!("{}", err);
            sink.failed(&err);
            return Err(err);
        }
    };
    sink.connected(&session.port);

    let result = record_lines(&mut endpoint, session, sink);
    match &result {
        Ok(report) => sink.finished(report),
        Err(err) => {
            log::warn!("capture aborted: {}", err);
            sink.failed(err);
        }
    }

    endpoint.close();
    log::info!("released {}", endpoint_name);
    sink.closed(endpoint_name);

    result
}

fn record_lines<E, S>(
    endpoint: &mut E,
    session: &CaptureSession,
    sink: &mut S,
) -> Result<CaptureReport, CaptureError>
where
    E: Endpoint,
    S: CaptureSink + ?Sized,
{
    let file = File::create(&session.output).map_err(|source| {
        CaptureError::unexpected(
            format!("creating {}", session.output.display()),
            0,
            source,
        )
    })?;
    let mut writer = BufWriter::new(file);
    sink.writing_to(&session.output);

    let start = Instant::now();
    let mut lines_written = 0;
    let mut raw = Vec::new();

    while start.elapsed() < session.duration {
        let available = endpoint
            .bytes_available()
            .map_err(|source| CaptureError::unexpected("polling the port", lines_written, source))?;

        if available == 0 {
            if !session.poll_interval.is_zero() {
                let remaining = session.duration.saturating_sub(start.elapsed());
                thread::sleep(session.poll_interval.min(remaining));
            }
            continue;
        }

        raw.clear();
        let n = endpoint
            .read_line(&mut raw)
            .map_err(|source| CaptureError::unexpected("reading from the port", lines_written, source))?;
        if n == 0 {
            continue;
        }
        log::debug!("read {} bytes", n);

        let line = decode_record(&raw)
            .map_err(|source| CaptureError::unexpected("decoding a line", lines_written, source))?;
        sink.record(line);

        writeln!(writer, "{}", line)
            .and_then(|_| writer.flush())
            .map_err(|source| {
                CaptureError::unexpected(
                    format!("writing {}", session.output.display()),
                    lines_written,
                    source,
                )
            })?;
        lines_written += 1;
    }

    Ok(CaptureReport {
        endpoint: session.port.port_path.clone(),
        output: session.output.clone(),
        lines_written,
        elapsed: start.elapsed(),
    })
}

/// Decode one raw line as UTF-8 and drop trailing whitespace and terminators.
pub fn decode_record(raw: &[u8]) -> io::Result<&str> {
    std::str::from_utf8(raw)
        .map(str::trim_end)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
