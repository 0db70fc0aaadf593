use std::fmt;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use rosc::OscType;
use tracing::trace;

use crate::error::ServerError;
use crate::osc::message::Message;

/// A remote OSC endpoint. Owns the (ephemeral) socket it sends from.
pub struct Address {
    addr: SocketAddr,
    socket: UdpSocket,
}

impl Address {
    /// Resolves `host` and uses the first address it yields.
    pub fn resolve(host: &str, port: u16) -> Result<Address, ServerError> {
        let addr = (host, port).to_socket_addrs()?.next().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{host}:{port} did not resolve to any address"),
            )
        })?;
        Self::from_socket_addr(addr)
    }

    pub fn from_socket_addr(addr: SocketAddr) -> Result<Address, ServerError> {
        let local: SocketAddr = if addr.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };
        let socket = UdpSocket::bind(local)?;
        Ok(Address { addr, socket })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn send(&self, msg: &Message) -> Result<usize, ServerError> {
        trace!(to = %self.addr, path = msg.path(), types = msg.types(), "sending");
        Ok(self.socket.send_to(msg.raw(), self.addr)?)
    }

    /// Builds a message from `path` and `args` and sends it.
    pub fn send_args(&self, path: &str, args: Vec<OscType>) -> Result<usize, ServerError> {
        let msg = Message::new(path, args)?;
        self.send(&msg)
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.addr == other.addr
    }
}

impl Eq for Address {}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Address").field(&self.addr).finish()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "osc.udp://{}/", self.addr)
    }
}
