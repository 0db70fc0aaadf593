use derive_more::{Display, Error, From};
use tracing::warn;

use crate::osc::registry::MethodId;
use crate::traits::ErrorHandler;

/// Numeric codes handed to an [`ErrorHandler`]. Dispatch misses use their own code so an
/// application can tell them apart from decode and transport failures.
pub mod codes {
    pub const INVALID_PATH: i32 = 9120;
    pub const BAD_TYPE: i32 = 9122;
    pub const MALFORMED_PACKET: i32 = 9123;
    pub const NESTED_BUNDLE: i32 = 9127;
    pub const NO_MATCH: i32 = 9130;

    pub const TOO_BIG: i32 = 9911;
    pub const RECV_FAILED: i32 = 9912;
}

/// Raised synchronously by the registry. A failed registration leaves the registry untouched.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum ConfigError {
    #[display("malformed pattern {pattern:?}: {reason}")]
    MalformedPattern { pattern: String, reason: String },
    #[display("invalid type code {code:?} in signature {signature:?}")]
    InvalidTypeSignature { signature: String, code: char },
    #[display("no method registered with id {id}")]
    NotFound { id: MethodId },
}

/// Per-candidate coercion failure. Only ever disqualifies the candidate it was raised for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum CoercionError {
    #[display("cannot coerce '{actual}' into '{declared}'")]
    Incompatible { declared: char, actual: char },
    #[display("signature expects {expected} arguments, message has {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Clone, PartialEq, Display, Error)]
pub enum MessageError {
    #[display("invalid OSC path {path:?}")]
    InvalidPath { path: String },
    #[display("argument {index} has no single type code (arrays are not supported)")]
    UnsupportedArgument { index: usize },
    #[display("nested bundles are not supported")]
    NestedBundle,
    #[display("could not decode packet: {reason}")]
    Decode { reason: String },
    #[display("could not encode message: {reason}")]
    Encode { reason: String },
}

impl MessageError {
    pub fn code(&self) -> i32 {
        match self {
            MessageError::InvalidPath { .. } => codes::INVALID_PATH,
            MessageError::UnsupportedArgument { .. } => codes::BAD_TYPE,
            MessageError::NestedBundle => codes::NESTED_BUNDLE,
            MessageError::Decode { .. } | MessageError::Encode { .. } => codes::MALFORMED_PACKET,
        }
    }
}

#[derive(Debug, Display, Error, From)]
pub enum ServerError {
    #[display("socket error: {_0}")]
    #[from]
    Io(std::io::Error),
    #[display("{_0}")]
    #[from]
    Message(MessageError),
    #[display("datagram of {size} bytes exceeds the {limit} byte limit")]
    TooBig { size: usize, limit: usize },
    #[display("server thread panicked")]
    ThreadPanicked,
}

impl ServerError {
    pub fn code(&self) -> i32 {
        match self {
            ServerError::Io(_) | ServerError::ThreadPanicked => codes::RECV_FAILED,
            ServerError::Message(err) => err.code(),
            ServerError::TooBig { .. } => codes::TOO_BIG,
        }
    }
}

/// Error handler used when the embedding application doesn't supply one: every report
/// becomes a `warn!` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogErrors;

impl ErrorHandler for LogErrors {
    fn report(&self, code: i32, msg: &str, context: &str) {
        warn!(code, context, "{msg}");
    }
}
