//! Serial port configuration and connection management
//!
//! Opens the capture endpoint and exposes it through the line-oriented
//! [`Endpoint`] interface the capture loop polls.

use crate::capture::{Endpoint, Transport};
use anyhow::{Context, Result};
use colored::Colorize;
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{self, Read};
use std::time::{Duration, Instant};

/// Default baud rate for ESP32 and most dev boards
pub const DEFAULT_BAUD: u32 = 115200;

/// Default read timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Size of a single read from the driver
const READ_CHUNK: usize = 256;

/// Platform default endpoint name
pub fn default_port_path() -> &'static str {
    if cfg!(windows) {
        "COM3"
    } else {
        "/dev/ttyUSB0"
    }
}

/// Configuration for serial port connection
#[derive(Debug, Clone)]
pub struct PortConfig {
    /// Serial port path (e.g., /dev/ttyUSB0, COM3)
    pub port_path: String,
    /// Baud rate (default: 115200)
    pub baud_rate: u32,
    /// Data bits (default: 8)
    pub data_bits: DataBits,
    /// Parity (default: None)
    pub parity: Parity,
    /// Stop bits (default: 1)
    pub stop_bits: StopBits,
    /// Flow control (default: None)
    pub flow_control: FlowControl,
    /// Read timeout
    pub timeout: Duration,
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            port_path: default_port_path().to_string(),
            baud_rate: DEFAULT_BAUD,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            flow_control: FlowControl::None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl PortConfig {
    /// Create a new 8N1 configuration for the given port
    pub fn new(port_path: &str) -> Self {
        Self {
            port_path: port_path.to_string(),
            ..Default::default()
        }
    }

    /// Set the baud rate
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Set the read timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Bytes received from the driver but not yet handed out as a line.
#[derive(Debug, Default)]
pub(crate) struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn extend(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
    }

    /// Move the next complete line, terminator included, into `out`.
    pub(crate) fn take_line(&mut self, out: &mut Vec<u8>) -> Option<usize> {
        let end = self.pending.iter().position(|b| *b == b'\n')? + 1;
        out.extend(self.pending.drain(..end));
        Some(end)
    }

    /// Move everything buffered into `out`.
    pub(crate) fn take_all(&mut self, out: &mut Vec<u8>) -> usize {
        let n = self.pending.len();
        out.append(&mut self.pending);
        n
    }
}

/// Open serial port plus the bytes read past the last returned line
pub struct SerialConnection {
    port: Box<dyn SerialPort>,
    config: PortConfig,
    buffer: LineBuffer,
}

impl SerialConnection {
    /// Open a serial connection with the given configuration
    pub fn open(config: PortConfig) -> Result<Self, serialport::Error> {
        let port = serialport::new(&config.port_path, config.baud_rate)
            .data_bits(config.data_bits)
            .parity(config.parity)
            .stop_bits(config.stop_bits)
            .flow_control(config.flow_control)
            .timeout(config.timeout)
            .open()?;

        log::debug!(
            "opened {} at {} baud (timeout {:?})",
            config.port_path,
            config.baud_rate,
            config.timeout
        );

        Ok(Self::from_port(port, config))
    }

    /// Wrap a port that is already open
    pub(crate) fn from_port(port: Box<dyn SerialPort>, config: PortConfig) -> Self {
        Self {
            port,
            config,
            buffer: LineBuffer::default(),
        }
    }
}

impl Endpoint for SerialConnection {
    fn bytes_available(&mut self) -> io::Result<usize> {
        let queued = self.port.bytes_to_read()?;
        Ok(self.buffer.len() + queued as usize)
    }

    /// Read until `\n`. The read timeout bounds the whole call; when it
    /// runs out before the terminator, whatever arrived so far is returned.
    fn read_line(&mut self, line: &mut Vec<u8>) -> io::Result<usize> {
        let mut chunk = [0u8; READ_CHUNK];
        let deadline = Instant::now() + self.config.timeout;

        loop {
            if let Some(n) = self.buffer.take_line(line) {
                return Ok(n);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                log::debug!("line read timed out with {} bytes pending", self.buffer.len());
                break;
            }
            self.port.set_timeout(remaining)?;

            match self.port.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => self.buffer.extend(&chunk[..n]),
                Err(ref e) if e.kind() == io::ErrorKind::TimedOut => break,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(self.buffer.take_all(line))
    }

    fn close(self) {
        log::debug!("closing {}", self.config.port_path);
        drop(self.port);
    }
}

/// Opens real serial ports
#[derive(Debug, Default, Clone, Copy)]
pub struct SerialTransport;

impl Transport for SerialTransport {
    type Endpoint = SerialConnection;

    fn open(&self, config: &PortConfig) -> io::Result<SerialConnection> {
        SerialConnection::open(config.clone()).map_err(io::Error::from)
    }
}

/// Information about a detected serial port
#[derive(Debug, Clone)]
pub struct PortInfo {
    pub path: String,
    pub port_type: PortType,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
    pub serial_number: Option<String>,
    pub vid: Option<u16>,
    pub pid: Option<u16>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PortType {
    UsbSerial,
    PciSerial,
    Bluetooth,
    Unknown,
}

impl std::fmt::Display for PortType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortType::UsbSerial => write!(f, "USB Serial"),
            PortType::PciSerial => write!(f, "PCI Serial"),
            PortType::Bluetooth => write!(f, "Bluetooth"),
            PortType::Unknown => write!(f, "Unknown"),
        }
    }
}

impl From<serialport::SerialPortInfo> for PortInfo {
    fn from(p: serialport::SerialPortInfo) -> Self {
        let mut info = PortInfo {
            path: p.port_name,
            port_type: PortType::Unknown,
            manufacturer: None,
            product: None,
            serial_number: None,
            vid: None,
            pid: None,
        };

        match p.port_type {
            serialport::SerialPortType::UsbPort(usb) => {
                info.port_type = PortType::UsbSerial;
                info.manufacturer = usb.manufacturer;
                info.product = usb.product;
                info.serial_number = usb.serial_number;
                info.vid = Some(usb.vid);
                info.pid = Some(usb.pid);
            }
            serialport::SerialPortType::PciPort => info.port_type = PortType::PciSerial,
            serialport::SerialPortType::BluetoothPort => info.port_type = PortType::Bluetooth,
            serialport::SerialPortType::Unknown => {}
        }

        info
    }
}

/// List all available serial ports
pub fn list_ports() -> Result<Vec<PortInfo>> {
    let ports = serialport::available_ports().context("Failed to enumerate serial ports")?;
    Ok(ports.into_iter().map(PortInfo::from).collect())
}

/// Print formatted list of available serial ports
pub fn print_ports() -> Result<()> {
    let ports = list_ports()?;

    if ports.is_empty() {
        println!("{}", "No serial ports found".yellow());
        println!("\n{}", "Troubleshooting tips:".cyan().bold());
        println!("  1. Connect the board over USB");
        println!("  2. Check if the device is recognized: ls -la /dev/ttyUSB* /dev/ttyACM*");
        println!("  3. Add your user to the 'dialout' group: sudo usermod -aG dialout $USER");
        println!("  4. On Windows, look the COM port up in Device Manager");
        return Ok(());
    }

    println!("{}", "Available Serial Ports:".green().bold());
    println!("{}", "=".repeat(60));

    for port in ports {
        println!("\n{}: {}", "Port".cyan(), port.path.white().bold());
        println!("  Type: {}", port.port_type);

        if let Some(ref mfg) = port.manufacturer {
            println!("  Manufacturer: {}", mfg);
        }
        if let Some(ref prod) = port.product {
            println!("  Product: {}", prod);
        }
        if let Some(ref sn) = port.serial_number {
            println!("  Serial: {}", sn);
        }
        if let (Some(vid), Some(pid)) = (port.vid, port.pid) {
            println!("  VID:PID: {:04x}:{:04x}", vid, pid);
        }
    }

    println!("\n{}", "=".repeat(60));
    println!(
        "{}",
        "Use: serial-capture capture -p <PORT> to start a capture".yellow()
    );

    Ok(())
}
