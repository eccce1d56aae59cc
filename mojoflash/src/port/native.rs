//! Native serial port implementation using the `serialport` crate.

use crate::error::{Error, Result};
use crate::port::Port;
use crate::protocol::{BAUD_RATE, READ_TIMEOUT};
use log::trace;
use serialport::ClearBuffer;
use std::io::{self, Read, Write};

/// Serial port to the board, opened with the fixed bootloader settings.
///
/// The bootloader only ever listens at 115200-8-N-1 with a 10 second
/// reply window, so there is nothing to configure: [`NativePort::open`]
/// takes a port name and nothing else. The reset line is DTR.
pub struct NativePort {
    port: Option<Box<dyn serialport::SerialPort>>,
    name: String,
}

impl NativePort {
    /// Open the named serial port with the bootloader settings.
    ///
    /// The port is claimed exclusively; a second open of the same port
    /// fails until this one is closed or dropped.
    pub fn open(name: &str) -> Result<Self> {
        let port = serialport::new(name, BAUD_RATE)
            .timeout(READ_TIMEOUT)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .open()
            .map_err(|source| Error::Connection {
                port: name.to_string(),
                source,
            })?;

        Ok(Self {
            port: Some(port),
            name: name.to_string(),
        })
    }
}

impl std::fmt::Debug for NativePort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativePort")
            .field("name", &self.name)
            .field("open", &self.port.is_some())
            .finish()
    }
}

impl Port for NativePort {
    fn set_reset(&mut self, level: bool) -> Result<()> {
        trace!("Setting DTR to {level}");
        if let Some(ref mut p) = self.port {
            p.write_data_terminal_ready(level)
                .map_err(io::Error::from)?;
        }
        Ok(())
    }

    fn discard_input(&mut self) -> Result<()> {
        if let Some(ref mut p) = self.port {
            p.clear(ClearBuffer::Input).map_err(io::Error::from)?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn close(&mut self) -> Result<()> {
        // Take ownership of the port and let it drop (close)
        self.port.take();
        Ok(())
    }
}

impl Read for NativePort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "port closed"))
            .and_then(|p| p.read(buf))
    }
}

impl Write for NativePort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.port
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "port closed"))
            .and_then(|p| p.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "port closed"))
            .and_then(std::io::Write::flush)
    }
}
