use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tracing::info;

use crate::error::{ConfigError, LogErrors, ServerError, codes};
use crate::osc::dispatcher::{DispatchOutcome, Dispatcher, MethodCall, Verdict};
use crate::osc::message::{Message, decode_packet};
use crate::osc::registry::{MethodId, Registry};
use crate::server::config::ServerConfig;
use crate::traits::ErrorHandler;

/// A UDP OSC server driven by the caller: nothing happens until `recv` or `recv_timeout`
/// is called. Use [`ServerThread`](crate::server::ServerThread) to have it polled on a
/// dedicated thread instead.
pub struct Server {
    socket: UdpSocket,
    dispatcher: Dispatcher,
    config: ServerConfig,
    // Receive buffer, `max_packet_size + 1` bytes, reused across datagrams
    buf: Mutex<Vec<u8>>,
}

impl Server {
    /// Binds with errors going to [`LogErrors`].
    pub fn bind(config: ServerConfig) -> Result<Server, ServerError> {
        Self::bind_with_errors(config, LogErrors)
    }

    pub fn bind_with_errors<E>(config: ServerConfig, errors: E) -> Result<Server, ServerError>
    where
        E: ErrorHandler + 'static,
    {
        let socket = UdpSocket::bind(config.bind_addr)?;
        let dispatcher = Dispatcher::new(Arc::new(Registry::new()), errors)
            .with_coercion(config.coercion)
            .with_incoming_patterns(config.incoming_patterns);

        info!(addr = %socket.local_addr()?, "OSC server bound");
        // One spare byte tells an oversized datagram apart from one that fits exactly.
        let buf = Mutex::new(vec![0u8; config.max_packet_size + 1]);
        Ok(Server {
            socket,
            dispatcher,
            config,
            buf,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.socket.local_addr()?)
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<Registry> {
        self.dispatcher.registry()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn add_method<F>(
        &self,
        pattern: Option<&str>,
        types: Option<&str>,
        handler: F,
    ) -> Result<MethodId, ConfigError>
    where
        F: Fn(&MethodCall<'_>) -> Verdict + Send + Sync + 'static,
    {
        self.registry().add(pattern, types, handler)
    }

    pub fn remove_method(&self, id: MethodId) -> Result<(), ConfigError> {
        self.registry().remove(id)
    }

    /// Blocks for one datagram and dispatches every message in it.
    pub fn recv(&self) -> Result<Vec<DispatchOutcome>, ServerError> {
        self.socket.set_nonblocking(false)?;
        self.socket.set_read_timeout(None)?;
        self.recv_one()
    }

    /// Like [`recv`](Self::recv) but gives up after `timeout`, returning `Ok(None)`. A zero
    /// timeout only picks up a datagram that is already queued.
    pub fn recv_timeout(
        &self,
        timeout: Duration,
    ) -> Result<Option<Vec<DispatchOutcome>>, ServerError> {
        if timeout.is_zero() {
            self.socket.set_nonblocking(true)?;
        } else {
            self.socket.set_nonblocking(false)?;
            self.socket.set_read_timeout(Some(timeout))?;
        }
        match self.recv_one() {
            Ok(outcomes) => Ok(Some(outcomes)),
            Err(ServerError::Io(err)) if is_timeout(&err) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Decodes a datagram and dispatches its messages in order. Decode failures go to the
    /// error handler as well as being returned.
    pub fn dispatch_bytes(&self, bytes: &[u8]) -> Result<Vec<DispatchOutcome>, ServerError> {
        let messages = self.decode(bytes)?;
        Ok(self.dispatch_all(&messages))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<Message>, ServerError> {
        decode_packet(bytes).map_err(|err| {
            self.dispatcher.report(err.code(), &err.to_string(), "decode");
            err.into()
        })
    }

    fn dispatch_all(&self, messages: &[Message]) -> Vec<DispatchOutcome> {
        messages
            .iter()
            .map(|msg| self.dispatcher.dispatch(msg))
            .collect()
    }

    fn recv_one(&self) -> Result<Vec<DispatchOutcome>, ServerError> {
        // The buffer is only held while receiving and decoding; handlers run without it.
        let messages = {
            let mut buf = self.buf.lock().unwrap_or_else(PoisonError::into_inner);
            let (size, from) = match self.socket.recv_from(&mut buf[..]) {
                Ok(received) => received,
                Err(err) => {
                    if !is_timeout(&err) {
                        self.dispatcher
                            .report(codes::RECV_FAILED, &err.to_string(), "recv");
                    }
                    return Err(err.into());
                }
            };

            if size > self.config.max_packet_size {
                let err = ServerError::TooBig {
                    size,
                    limit: self.config.max_packet_size,
                };
                self.dispatcher
                    .report(err.code(), &err.to_string(), &from.to_string());
                return Err(err);
            }
            self.decode(&buf[..size])?
        };
        Ok(self.dispatch_all(&messages))
    }
}

fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}
