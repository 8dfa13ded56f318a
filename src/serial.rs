//! Serial transport.
//!
//! # Types
//!
//! - [`SerialPortIO`]: AsyncRead + AsyncWrite bound shared by real ports and
//!   test doubles
//! - [`DynSerial`]: type-erased boxed port
//!
//! # Utilities
//!
//! - [`open_serial_async`]: open a port with 8N1, no flow control
//!   (feature `serial`)
//! - [`drain_serial_buffer`]: discard whatever is already queued
//!
//! ```rust,ignore
//! use coxiris_link::serial::{drain_serial_buffer, open_serial_async};
//!
//! let mut port = open_serial_async("/dev/ttyACM0", 115_200).await?;
//! let discarded = drain_serial_buffer(&mut port, 50).await;
//! ```

use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};

/// Async byte stream usable as the link transport.
///
/// Covers `tokio_serial::SerialStream` on real hardware and
/// `tokio::io::DuplexStream` in tests.
pub trait SerialPortIO: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> SerialPortIO for T {}

/// Type-erased boxed serial port.
pub type DynSerial = Box<dyn SerialPortIO>;

/// Open a serial port without blocking the runtime.
///
/// The port is configured 8N1 with no flow control, which is what the
/// controller board's USB bridge expects.
///
/// # Errors
///
/// Returns an error if the port cannot be opened or `spawn_blocking` fails.
#[cfg(feature = "serial")]
pub async fn open_serial_async(
    port_path: &str,
    baud_rate: u32,
) -> anyhow::Result<tokio_serial::SerialStream> {
    use anyhow::Context;
    use tokio::task::spawn_blocking;
    use tokio_serial::SerialPortBuilderExt;

    let port_path_owned = port_path.to_string();

    spawn_blocking(move || {
        tokio_serial::new(&port_path_owned, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .with_context(|| format!("Failed to open serial port {port_path_owned} at {baud_rate} baud"))
    })
    .await
    .context("spawn_blocking for serial port opening failed")?
}

/// Read and discard bytes until nothing more arrives within `timeout_ms`.
///
/// Returns the number of bytes discarded. Read errors end the drain
/// silently; the serve loop reports them if they persist.
pub async fn drain_serial_buffer<R: AsyncRead + Unpin>(port: &mut R, timeout_ms: u64) -> usize {
    let mut discard = [0u8; 256];
    let deadline = tokio::time::Instant::now() + Duration::from_millis(timeout_ms);
    let mut total_discarded = 0usize;

    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            break;
        }

        match tokio::time::timeout(remaining, port.read(&mut discard)).await {
            Ok(Ok(0)) => break, // EOF
            Ok(Ok(n)) => total_discarded += n,
            Ok(Err(_)) | Err(_) => break,
        }
    }

    total_discarded
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn drain_discards_queued_bytes() {
        let (mut host, mut device) = tokio::io::duplex(64);

        host.write_all(b"boot noise 12345").await.unwrap();

        let discarded = drain_serial_buffer(&mut device, 50).await;
        assert_eq!(discarded, 16);

        // nothing left to read
        let mut buf = [0u8; 1];
        let pending =
            tokio::time::timeout(Duration::from_millis(10), device.read(&mut buf)).await;
        assert!(pending.is_err());
    }

    #[tokio::test]
    async fn drain_on_quiet_port_returns_zero() {
        let (_host, mut device) = tokio::io::duplex(64);
        assert_eq!(drain_serial_buffer(&mut device, 20).await, 0);
    }

    #[tokio::test]
    async fn boxed_duplex_is_a_serial_port() {
        let (mut host, device) = tokio::io::duplex(64);
        let mut port: DynSerial = Box::new(device);

        host.write_all(b"GET_ID\n").await.unwrap();
        let mut buf = [0u8; 7];
        port.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"GET_ID\n");
    }

    #[cfg(feature = "serial")]
    #[tokio::test]
    async fn opening_a_missing_port_fails() {
        let err = open_serial_async("/dev/coxiris-does-not-exist", 115_200)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("/dev/coxiris-does-not-exist"));
    }
}
