//! Serial port transport for the capture loop
//!
//! This module provides functionality for:
//! - Listing available serial ports
//! - Opening a port as a capture [`Endpoint`](crate::capture::Endpoint)

pub mod port;

pub use port::{PortConfig, SerialTransport};
