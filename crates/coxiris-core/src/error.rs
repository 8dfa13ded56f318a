//! Protocol error taxonomy.
//!
//! Every variant is recovered locally: it is written to the transport as a
//! single `ERROR: <message>` line and the read loop moves on to the next
//! line. The `Display` text of each variant *is* the wire message, so the
//! structured value handed back to the host and the text seen by a client
//! can never drift apart.

use thiserror::Error;

/// A recoverable error raised while framing, validating or executing a command.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    /// The first token matched no entry in the command table.
    #[error("Unknown command - {line}")]
    UnknownCommand {
        /// The normalized line as received.
        line: String,
    },

    /// Fewer parameter tokens than the command's arity.
    #[error("Missing {} - Usage: {usage}", parameter_noun(.arity))]
    MissingParameters {
        /// Usage text of the command.
        usage: &'static str,
        /// Number of parameters the command requires.
        arity: usize,
    },

    /// A parameter token failed numeric validation.
    #[error("Invalid number format - Usage: {usage} (where {})", number_hint(.params))]
    InvalidNumberFormat {
        /// Usage text of the command.
        usage: &'static str,
        /// Parameter names, in declared order.
        params: &'static [&'static str],
    },

    /// A well-formed number violated a command-specific constraint.
    #[error("{reason} - Usage: {usage} (where {condition})")]
    ConstraintViolation {
        /// Short statement of the violated rule.
        reason: &'static str,
        /// Usage text of the command.
        usage: &'static str,
        /// The condition the parameter must satisfy.
        condition: &'static str,
    },

    /// The command needs a device operation the host never bound.
    #[error("{command} function not configured")]
    HandlerNotConfigured {
        /// Command name.
        command: &'static str,
    },

    /// The bound device operation ran and reported a failure.
    #[error("{command} failed - {reason}")]
    OperationFailed {
        /// Command name.
        command: &'static str,
        /// Failure reported by the operation.
        reason: String,
    },

    /// An inbound line exceeded the line buffer and was dropped.
    #[error("Command too long")]
    BufferOverflow {
        /// Capacity of the line buffer, terminator slot included.
        capacity: usize,
    },
}

fn parameter_noun(arity: &usize) -> &'static str {
    if *arity == 1 {
        "parameter"
    } else {
        "parameters"
    }
}

fn number_hint(params: &[&str]) -> String {
    match params {
        [single] => format!("{single} is a number"),
        many => format!("{} are numbers", many.join(", ")),
    }
}
