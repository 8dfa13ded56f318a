//! Command dispatch.
//!
//! A tokenized line goes through a single pass per line:
//! match → validate → execute or skip → respond. Nothing but the command
//! table and the bound operations outlives the call.
//!
//! For a recognised command the response is always `ACK`, then at most one
//! `ERROR`, then `DONE`, even when validation fails, the operation is not
//! bound or the operation itself reports an error. Getters that cannot
//! produce a value report a zero payload so the `DONE` line keeps its shape.

use crate::command::{
    self, CommandDescriptor, CommandKind, OperationShape, ParamConstraint, ReplyFormat,
};
use crate::error::ProtocolError;
use crate::number::parse_number;
use crate::operations::{DeviceOperations, OperationOutput, Position};
use crate::response::{format_position, format_speed, ResponseEmitter};
use crate::tokenizer::{normalize, tokenize};
use std::io::{self, Write};
use tracing::{debug, warn};

/// Identifier reported by `GET_ID` unless configured otherwise.
pub const DEFAULT_DEVICE_ID: &str = "CX25F7TK9P";

/// What happened to one dispatched line, for host-side logging.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchReport {
    /// The recognised command, `None` for unknown commands and overflows.
    pub command: Option<CommandKind>,
    /// Whether the command's action actually ran to completion.
    pub executed: bool,
    /// The error written to the wire, if any.
    pub error: Option<ProtocolError>,
}

impl DispatchReport {
    /// Report for a line that produced no output at all.
    pub fn idle() -> Self {
        Self {
            command: None,
            executed: false,
            error: None,
        }
    }

    /// Report for an error that was not tied to a command.
    pub fn rejected(error: ProtocolError) -> Self {
        Self {
            command: None,
            executed: false,
            error: Some(error),
        }
    }

    /// Whether the line completed without an error.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

struct Execution {
    ran: bool,
    payload: Option<String>,
    error: Option<ProtocolError>,
}

/// Maps tokenized lines onto the command table and the bound operations.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    operations: DeviceOperations,
    device_id: String,
}

impl Dispatcher {
    /// Create a dispatcher over the given operations.
    pub fn new(operations: DeviceOperations) -> Self {
        Self {
            operations,
            device_id: DEFAULT_DEVICE_ID.to_string(),
        }
    }

    /// Replace the identifier reported by `GET_ID`.
    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = device_id.into();
        self
    }

    /// The identifier reported by `GET_ID`.
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// The bound operations.
    pub fn operations(&self) -> &DeviceOperations {
        &self.operations
    }

    /// Normalize, tokenize and dispatch one raw line.
    pub fn dispatch_line<W: Write>(
        &self,
        raw: &[u8],
        out: &mut ResponseEmitter<W>,
    ) -> io::Result<DispatchReport> {
        let line = normalize(raw);
        let tokens = tokenize(&line);
        self.run(&line, &tokens, out)
    }

    /// Dispatch an already normalized token sequence.
    ///
    /// An empty sequence writes nothing.
    pub fn dispatch<W: Write>(
        &self,
        tokens: &[&str],
        out: &mut ResponseEmitter<W>,
    ) -> io::Result<DispatchReport> {
        self.run(&tokens.join(" "), tokens, out)
    }

    fn run<W: Write>(
        &self,
        line: &str,
        tokens: &[&str],
        out: &mut ResponseEmitter<W>,
    ) -> io::Result<DispatchReport> {
        let Some((&name, params)) = tokens.split_first() else {
            return Ok(DispatchReport::idle());
        };

        let Some(descriptor) = command::lookup(name) else {
            let error = ProtocolError::UnknownCommand {
                line: line.to_string(),
            };
            warn!(%error, "rejected line");
            out.error(&error)?;
            for help in command::help_lines() {
                out.line(&help)?;
            }
            return Ok(DispatchReport::rejected(error));
        };

        debug!(command = descriptor.name, params = params.len(), "dispatching");
        out.ack(descriptor.name)?;

        let execution = match validate(descriptor, params) {
            Ok(args) => self.execute(descriptor, &args, out)?,
            Err(error) => Execution {
                ran: false,
                payload: self.fallback_payload(descriptor.reply),
                error: Some(error),
            },
        };

        if let Some(error) = &execution.error {
            warn!(command = descriptor.name, %error, "command failed");
            out.error(error)?;
        }
        out.done(descriptor.name, execution.payload.as_deref())?;

        Ok(DispatchReport {
            command: Some(descriptor.kind),
            executed: execution.ran,
            error: execution.error,
        })
    }

    fn execute<W: Write>(
        &self,
        descriptor: &CommandDescriptor,
        args: &[f64],
        out: &mut ResponseEmitter<W>,
    ) -> io::Result<Execution> {
        if descriptor.shape == OperationShape::Builtin {
            if descriptor.kind == CommandKind::Help {
                for help in command::help_lines() {
                    out.line(&help)?;
                }
            }
            return Ok(Execution {
                ran: true,
                payload: self.fallback_payload(descriptor.reply),
                error: None,
            });
        }

        let Some(operation) = self.operations.get(descriptor.kind) else {
            return Ok(Execution {
                ran: false,
                payload: self.fallback_payload(descriptor.reply),
                error: Some(ProtocolError::HandlerNotConfigured {
                    command: descriptor.name,
                }),
            });
        };

        let execution = match operation.invoke(args) {
            Ok(output) => Execution {
                ran: true,
                payload: self.render(descriptor.reply, output),
                error: None,
            },
            Err(err) => Execution {
                ran: false,
                payload: self.fallback_payload(descriptor.reply),
                error: Some(ProtocolError::OperationFailed {
                    command: descriptor.name,
                    reason: format!("{err:#}"),
                }),
            },
        };
        Ok(execution)
    }

    fn render(&self, reply: ReplyFormat, output: OperationOutput) -> Option<String> {
        match (reply, output) {
            (ReplyFormat::Position, OperationOutput::Position(position)) => {
                Some(format_position(&position))
            }
            (ReplyFormat::Speed, OperationOutput::Scalar(value)) => Some(format_speed(value)),
            (reply, _) => self.fallback_payload(reply),
        }
    }

    fn fallback_payload(&self, reply: ReplyFormat) -> Option<String> {
        match reply {
            ReplyFormat::Plain => None,
            ReplyFormat::Position => Some(format_position(&Position::default())),
            ReplyFormat::Speed => Some(format_speed(0.0)),
            ReplyFormat::Identifier => Some(self.device_id.clone()),
        }
    }
}

/// Check arity, numeric format and constraints; return the parsed arguments.
///
/// Tokens beyond the command's arity are ignored.
fn validate(descriptor: &CommandDescriptor, params: &[&str]) -> Result<Vec<f64>, ProtocolError> {
    let arity = descriptor.arity();
    let Some(candidates) = params.get(..arity) else {
        return Err(ProtocolError::MissingParameters {
            usage: descriptor.usage,
            arity,
        });
    };

    let args = candidates
        .iter()
        .map(|token| parse_number(token))
        .collect::<Option<Vec<f64>>>()
        .ok_or(ProtocolError::InvalidNumberFormat {
            usage: descriptor.usage,
            params: descriptor.params,
        })?;

    if let Some(constraint) = descriptor.constraint {
        if !args.iter().all(|&value| constraint.admits(value)) {
            let ParamConstraint::StrictlyPositive { reason, condition } = constraint;
            return Err(ProtocolError::ConstraintViolation {
                reason,
                usage: descriptor.usage,
                condition,
            });
        }
    }

    Ok(args)
}
