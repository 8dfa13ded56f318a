//! `coxiris-core`
//!
//! Line-oriented command protocol for the COXIRIS positioning system.
//!
//! The crate turns a raw byte stream into commands and commands into
//! responses. It knows nothing about the transport or about motion control:
//! bytes come in through [`CommandProcessor::process`], responses go out to
//! any [`std::io::Write`] sink, and device actions are closures supplied by
//! the host through [`DeviceOperations`].
//!
//! ## Pipeline
//!
//! - [`LineBuffer`]: bounded accumulation, terminator detection, overflow
//!   discard
//! - [`tokenizer`]: trim, uppercase, split
//! - [`Dispatcher`]: command table lookup, parameter validation, operation
//!   call
//! - [`ResponseEmitter`]: `ACK` / `ERROR` / `DONE` lines
//!
//! Everything here is synchronous and single-threaded. A host that shares a
//! processor between threads must serialize access itself.
//!
//! ## Example
//!
//! ```
//! use coxiris_core::{CommandProcessor, DeviceOperations, Dispatcher};
//!
//! let ops = DeviceOperations::new().on_get_speed(|| Ok(25.0));
//! let mut processor = CommandProcessor::new(Dispatcher::new(ops), 64);
//!
//! let mut out = Vec::new();
//! processor.process(b"get_speed\n", &mut out)?;
//! assert_eq!(out, b"ACK GET_SPEED\r\nDONE GET_SPEED: 25\r\n");
//! # Ok::<(), std::io::Error>(())
//! ```

pub mod command;
pub mod dispatcher;
pub mod error;
pub mod line_buffer;
pub mod number;
pub mod operations;
pub mod processor;
pub mod response;
pub mod tokenizer;

pub use command::{CommandDescriptor, CommandKind, COMMAND_TABLE};
pub use dispatcher::{DispatchReport, Dispatcher, DEFAULT_DEVICE_ID};
pub use error::ProtocolError;
pub use line_buffer::{LineBuffer, LineEvent, DEFAULT_CAPACITY};
pub use number::{is_valid_number, parse_number};
pub use operations::{BoundOperation, DeviceOperations, OperationOutput, Position};
pub use processor::CommandProcessor;
pub use response::{LineEnding, ResponseEmitter};
