//! UDP plumbing around the dispatcher: a pollable [`Server`], a [`ServerThread`] that runs
//! one on its own thread, and [`Address`] for sending.

pub mod address;
pub mod config;
#[allow(clippy::module_inception)]
pub mod server;
pub mod thread;

pub use address::Address;
pub use config::ServerConfig;
pub use server::Server;
pub use thread::ServerThread;
