// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Four letter word listener.

use crate::config::{ConfigError, ServerConfig};
use keeper_flw::{CommandRegistry, RegistryCell, RegistryError};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{watch, Notify, Semaphore};
use tracing::{debug, error, info, warn};

pub mod connection;

pub use connection::{AdminConnection, ConnectionError};

const ACCEPT_BACKOFF_MIN: Duration = Duration::from_millis(10);
const ACCEPT_BACKOFF_MAX: Duration = Duration::from_secs(1);

/// Delay before retrying after `failures` consecutive accept errors.
fn accept_backoff(failures: u32) -> Duration {
    ACCEPT_BACKOFF_MIN
        .saturating_mul(1u32 << failures.saturating_sub(1).min(16))
        .min(ACCEPT_BACKOFF_MAX)
}

/// Admin listener serving one four letter word per connection.
#[derive(Clone)]
pub struct FlwServer {
    config: Arc<ServerConfig>,
    registry: Arc<RegistryCell>,
    shutdown: Arc<Notify>,
    stopping: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    bound: Arc<watch::Sender<Option<SocketAddr>>>,
}

impl FlwServer {
    /// Create a listener for `config`. The registry may still be empty;
    /// `run` refuses to start until it is initialized.
    pub fn new(config: ServerConfig, registry: Arc<RegistryCell>) -> Result<Self, ServerError> {
        config.validate()?;
        let (bound, _) = watch::channel(None);

        Ok(Self {
            config: Arc::new(config),
            registry,
            shutdown: Arc::new(Notify::new()),
            stopping: Arc::new(AtomicBool::new(false)),
            running: Arc::new(AtomicBool::new(false)),
            bound: Arc::new(bound),
        })
    }

    /// Accept connections until `shutdown` is called.
    ///
    /// A `shutdown` issued before `run` stops that run at once. Once `run`
    /// returns, the server can be run again.
    pub async fn run(&self) -> Result<(), ServerError> {
        let registry = self.registry.check_initialization()?;

        if self.running.swap(true, Ordering::SeqCst) {
            return Err(ServerError::AlreadyRunning);
        }

        let result = self.serve(registry).await;

        self.bound.send_replace(None);
        self.stopping.store(false, Ordering::SeqCst);
        self.running.store(false, Ordering::SeqCst);
        result
    }

    async fn serve(&self, registry: Arc<CommandRegistry>) -> Result<(), ServerError> {
        let addr = SocketAddr::new(self.config.bind_address, self.config.port);
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        let local_addr = listener.local_addr()?;
        self.bound.send_replace(Some(local_addr));

        info!(
            "Four letter word listener on {} ({} commands)",
            local_addr,
            registry.len()
        );

        let permits = Arc::new(Semaphore::new(self.config.max_connections));
        let read_timeout = self.config.read_timeout();

        let shutdown = self.shutdown.notified();
        tokio::pin!(shutdown);
        shutdown.as_mut().enable();
        if self.stopping.load(Ordering::SeqCst) {
            info!("Shutdown requested before accept loop");
            return Ok(());
        }

        let mut accept_failures = 0u32;
        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, peer_addr)) => {
                            accept_failures = 0;
                            let Ok(permit) = Arc::clone(&permits).try_acquire_owned() else {
                                warn!(
                                    "Refusing {}: {} connections already open",
                                    peer_addr, self.config.max_connections
                                );
                                drop(stream);
                                continue;
                            };
                            debug!("New connection from {}", peer_addr);

                            let registry = Arc::clone(&registry);
                            tokio::spawn(async move {
                                if let Err(e) = Self::handle_connection(
                                    stream,
                                    peer_addr,
                                    registry,
                                    read_timeout,
                                ).await {
                                    warn!("Connection error from {}: {}", peer_addr, e);
                                }
                                drop(permit);
                            });
                        }
                        Err(e) => {
                            accept_failures = accept_failures.saturating_add(1);
                            let backoff = accept_backoff(accept_failures);
                            error!("Accept error: {} (retrying in {:?})", e, backoff);
                            tokio::time::sleep(backoff).await;
                        }
                    }
                }
                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Read one word, dispatch it off the async workers, reply, close.
    async fn handle_connection(
        stream: TcpStream,
        peer_addr: SocketAddr,
        registry: Arc<CommandRegistry>,
        read_timeout: Duration,
    ) -> Result<(), ConnectionError> {
        let mut conn = AdminConnection::new(stream, peer_addr);

        let Some(code) = conn.read_code(read_timeout).await? else {
            debug!("Connection closed before a full word: {}", conn.peer_addr());
            return Ok(());
        };
        debug!("{} sent {}", conn.peer_addr(), code);

        let dispatch = tokio::task::spawn_blocking(move || registry.dispatch(code))
            .await
            .map_err(|e| ConnectionError::Dispatch(e.to_string()))?;

        conn.write_reply(dispatch.response.as_bytes()).await?;
        conn.shutdown().await
    }

    /// Stop accepting connections.
    pub fn shutdown(&self) {
        self.stopping.store(true, Ordering::SeqCst);
        self.shutdown.notify_waiters();
    }

    /// Check if server is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Address the listener is bound to, once `run` has bound it.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.bound.borrow()
    }

    /// Wait until `run` has bound its listener and return the address.
    pub async fn wait_bound(&self) -> Option<SocketAddr> {
        let mut rx = self.bound.subscribe();
        let addr = rx.wait_for(Option::is_some).await.ok()?;
        *addr
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// Server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Bind error on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("Server already running")]
    AlreadyRunning,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
