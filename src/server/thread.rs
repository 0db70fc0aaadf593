use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Sender, TryRecvError, bounded};
use tracing::{info, warn};

use crate::error::{ConfigError, ServerError};
use crate::osc::dispatcher::{MethodCall, Verdict};
use crate::osc::registry::{MethodId, Registry};
use crate::server::server::Server;

/// Shortest socket wait between stop checks. A zero interval would turn the loop into a
/// busy spin.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Runs a [`Server`]'s receive loop on its own thread.
///
/// Methods can be added and removed through the shared registry while the thread is
/// dispatching. The thread stops on [`stop`](Self::stop) or when the handle is dropped.
pub struct ServerThread {
    registry: Arc<Registry>,
    local_addr: SocketAddr,
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl ServerThread {
    pub fn start(server: Server) -> Result<ServerThread, ServerError> {
        let local_addr = server.local_addr()?;
        let registry = Arc::clone(server.registry());
        let poll_interval = server.config().poll_interval.max(MIN_POLL_INTERVAL);
        let (stop_tx, stop_rx) = bounded::<()>(1);

        let handle = thread::Builder::new()
            .name(format!("osc-server-{}", local_addr.port()))
            .spawn(move || {
                info!(addr = %local_addr, "OSC server thread started");
                loop {
                    match stop_rx.try_recv() {
                        Ok(()) | Err(TryRecvError::Disconnected) => break,
                        Err(TryRecvError::Empty) => {}
                    }
                    // Failures were already handed to the server's error handler
                    if let Err(err) = server.recv_timeout(poll_interval) {
                        warn!(%err, "receive failed");
                    }
                }
                info!(addr = %local_addr, "OSC server thread stopped");
            })?;

        Ok(ServerThread {
            registry,
            local_addr,
            stop_tx,
            handle: Some(handle),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
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
        self.registry.add(pattern, types, handler)
    }

    pub fn remove_method(&self, id: MethodId) -> Result<(), ConfigError> {
        self.registry.remove(id)
    }

    /// Signals the thread and waits for it to finish its current poll.
    pub fn stop(mut self) -> Result<(), ServerError> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<(), ServerError> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        // A full channel means a stop is already pending
        let _ = self.stop_tx.try_send(());
        handle.join().map_err(|_| ServerError::ThreadPanicked)
    }
}

impl Drop for ServerThread {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}
