//! Open Sound Control method dispatch.
//!
//! Methods are registered with a [`Registry`] under an optional path pattern and an optional
//! type signature. A [`Dispatcher`] takes decoded [`Message`]s, finds every matching method in
//! registration order, coerces arguments to the declared signature and calls handlers until
//! one of them returns [`Verdict::Handled`]. [`server`] wires this up to a UDP socket.

pub mod error;
pub mod osc;
pub mod server;
mod shared;
pub mod traits;

pub use error::{CoercionError, ConfigError, LogErrors, MessageError, ServerError};
pub use osc::{
    Coercion, DispatchOutcome, Dispatcher, Message, MethodCall, MethodId, Pattern, Registry,
    Verdict,
};
pub use rosc::OscType;
pub use server::{Address, Server, ServerConfig, ServerThread};
pub use traits::{ErrorHandler, Handler};
