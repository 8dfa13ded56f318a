//! Host-side error type.
//!
//! `LinkError` covers everything that can stop the link before or while it
//! serves a transport: loading and validating configuration, opening the
//! serial port, installing the log subscriber and transport I/O. Protocol
//! errors never show up here; they are answered on the wire by
//! `coxiris-core` and only reported back through `DispatchReport`.
//!
//! By using `#[from]`, `LinkError` can be created from the underlying error
//! types with the `?` operator.

use thiserror::Error;

/// Convenience alias for results using the link error type.
pub type LinkResult<T> = std::result::Result<T, LinkError>;

/// Errors raised by the host side of the link.
#[derive(Error, Debug)]
pub enum LinkError {
    /// The configuration sources could not be read or extracted.
    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    /// The configuration parsed but holds invalid values.
    #[error("Configuration validation error: {0}")]
    Configuration(String),

    /// Transport I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The serial port could not be opened or configured.
    #[error("Serial port error: {0}")]
    Serial(String),

    /// The tracing subscriber could not be installed.
    #[error("Logging setup error: {0}")]
    Logging(String),
}

impl From<figment::Error> for LinkError {
    fn from(err: figment::Error) -> Self {
        LinkError::Config(Box::new(err))
    }
}
