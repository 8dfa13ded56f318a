//! The serve loop.
//!
//! Reads whatever the transport delivers, pushes it through the
//! [`CommandProcessor`] and writes back the responses for each chunk before
//! reading again. Ends cleanly when the reader reaches EOF.

use crate::config::LinkConfig;
use crate::error::LinkResult;
use coxiris_core::{command, CommandProcessor, DeviceOperations, DispatchReport, Dispatcher};
use std::io::Write;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, instrument, trace};

/// Read chunk size. Larger than any legal line so a burst of commands
/// usually arrives in one read.
const READ_CHUNK: usize = 256;

/// Counters accumulated over one serve session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServiceStats {
    /// Bytes read from the transport
    pub bytes_read: u64,
    /// Lines that produced a response, overflows included
    pub lines: u64,
    /// Lines answered with an `ERROR:` line
    pub errors: u64,
}

impl ServiceStats {
    fn record(&mut self, report: &DispatchReport) {
        if report.command.is_none() && report.error.is_none() {
            return;
        }
        self.lines += 1;
        if report.error.is_some() {
            self.errors += 1;
        }
    }
}

/// Build a processor with the `[protocol]` settings over `operations`.
pub fn build_processor(config: &LinkConfig, operations: DeviceOperations) -> CommandProcessor {
    let dispatcher = Dispatcher::new(operations).with_device_id(config.protocol.device_id.clone());
    CommandProcessor::new(dispatcher, config.protocol.buffer_capacity)
        .with_line_ending(config.protocol.line_ending.into())
}

/// Write the HELP listing, header included, one line per entry.
pub fn write_help_listing<W: Write>(mut out: W) -> std::io::Result<()> {
    for line in command::help_lines() {
        writeln!(out, "{line}")?;
    }
    out.flush()
}

/// Serve the command protocol over a reader/writer pair until EOF.
///
/// # Errors
///
/// Returns an error if reading from or writing to the transport fails.
#[instrument(skip_all)]
pub async fn serve<R, W>(
    mut reader: R,
    mut writer: W,
    processor: &mut CommandProcessor,
) -> LinkResult<ServiceStats>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut stats = ServiceStats::default();
    let mut chunk = [0u8; READ_CHUNK];
    let mut responses = Vec::with_capacity(4 * READ_CHUNK);

    info!(
        capacity = processor.buffer().capacity(),
        device_id = processor.dispatcher().device_id(),
        "serving command protocol"
    );

    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        stats.bytes_read += n as u64;
        trace!(bytes = n, "read chunk");

        responses.clear();
        for report in processor.process(&chunk[..n], &mut responses)? {
            if let Some(command) = report.command {
                debug!(%command, executed = report.executed, "line handled");
            }
            stats.record(&report);
        }

        if !responses.is_empty() {
            writer.write_all(&responses).await?;
            writer.flush().await?;
        }
    }

    info!(
        bytes_read = stats.bytes_read,
        lines = stats.lines,
        errors = stats.errors,
        "transport closed"
    );
    Ok(stats)
}
