//! TCP Server
//!
//! Accepts connections and runs each one on its own thread.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use crate::config::Config;
use crate::dispatcher::Dispatcher;
use crate::error::{FilePortError, Result};
use crate::store::FileStore;

use super::Connection;

/// TCP server for fileport
///
/// One OS thread per accepted connection. A failing or panicking connection
/// only ends its own thread.
pub struct Server {
    config: Config,
    listener: TcpListener,
    dispatcher: Arc<Dispatcher>,
    shutdown: Arc<AtomicBool>,
    active: Arc<AtomicUsize>,
    next_conn_id: AtomicU64,
}

impl Server {
    /// Bind the listener described by `config`
    pub fn bind(config: Config, store: Arc<FileStore>) -> Result<Self> {
        let listener = TcpListener::bind(&config.listen_addr).map_err(|e| {
            FilePortError::Config(format!("Failed to bind {}: {}", config.listen_addr, e))
        })?;

        Ok(Self {
            config,
            listener,
            dispatcher: Arc::new(Dispatcher::new(store)),
            shutdown: Arc::new(AtomicBool::new(false)),
            active: Arc::new(AtomicUsize::new(0)),
            next_conn_id: AtomicU64::new(1),
        })
    }

    /// Address the listener is bound to (resolves port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle that stops the accept loop from another thread
    pub fn shutdown_handle(&self) -> Result<ShutdownHandle> {
        Ok(ShutdownHandle {
            flag: Arc::clone(&self.shutdown),
            wake_addr: wake_addr(self.local_addr()?),
        })
    }

    /// Number of connections currently being handled
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Accept connections until shut down (blocking)
    ///
    /// Connections already accepted keep running after this returns.
    pub fn run(&self) -> Result<()> {
        tracing::info!("Listening on {}", self.local_addr()?);

        for incoming in self.listener.incoming() {
            if self.shutdown.load(Ordering::SeqCst) {
                break;
            }

            match incoming {
                Ok(stream) => self.spawn_connection(stream),
                Err(e) if is_transient_accept_error(&e) => {
                    tracing::warn!("Accept failed, continuing: {}", e);
                }
                Err(e) => {
                    tracing::error!("Accept failed: {}", e);
                    return Err(e.into());
                }
            }
        }

        tracing::info!(
            "Listener stopped ({} connections still active)",
            self.active_connections()
        );
        Ok(())
    }

    /// Start a handling thread for one accepted stream
    fn spawn_connection(&self, stream: TcpStream) {
        let id = self.next_conn_id.fetch_add(1, Ordering::SeqCst);
        let dispatcher = Arc::clone(&self.dispatcher);
        let guard = ActiveGuard::new(Arc::clone(&self.active));
        let read_ms = self.config.read_timeout_ms;
        let write_ms = self.config.write_timeout_ms;
        let nodelay = self.config.nodelay;

        let spawned = thread::Builder::new()
            .name(format!("conn-{}", id))
            .spawn(move || {
                let _guard = guard;
                if let Err(e) = serve(stream, dispatcher, read_ms, write_ms, nodelay) {
                    tracing::warn!("Connection {} ended with error: {}", id, e);
                }
            });

        if let Err(e) = spawned {
            // The closure (stream and guard) is dropped with the error
            tracing::error!("Failed to spawn handler for connection {}: {}", id, e);
        }
    }
}

/// Body of one handling thread
fn serve(
    stream: TcpStream,
    dispatcher: Arc<Dispatcher>,
    read_ms: u64,
    write_ms: u64,
    nodelay: bool,
) -> Result<()> {
    let mut connection = Connection::new(stream, dispatcher)?;
    connection.set_nodelay(nodelay)?;
    connection.set_timeouts(read_ms, write_ms)?;
    connection.handle()?;
    tracing::debug!("Connection to {} closed", connection.peer_addr());
    Ok(())
}

fn is_transient_accept_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
    )
}

/// Loopback address to poke an `accept` bound to a wildcard address
fn wake_addr(mut addr: SocketAddr) -> SocketAddr {
    if addr.ip().is_unspecified() {
        match addr {
            SocketAddr::V4(_) => addr.set_ip([127, 0, 0, 1].into()),
            SocketAddr::V6(_) => addr.set_ip(std::net::Ipv6Addr::LOCALHOST.into()),
        }
    }
    addr
}

/// Decrements the active-connection count when dropped, even on panic
struct ActiveGuard {
    active: Arc<AtomicUsize>,
}

impl ActiveGuard {
    fn new(active: Arc<AtomicUsize>) -> Self {
        active.fetch_add(1, Ordering::SeqCst);
        Self { active }
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Stops a running `Server`
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
    wake_addr: SocketAddr,
}

impl ShutdownHandle {
    /// Signal the server to stop accepting
    ///
    /// Sets the flag, then connects once so a blocked `accept` returns.
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
        if let Err(e) = TcpStream::connect(self.wake_addr) {
            tracing::debug!("Shutdown wake-up connect failed: {}", e);
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
