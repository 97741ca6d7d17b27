//! `GridfallServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → session/room via
//! the router actor.

use gridfall_protocol::JsonCodec;
use gridfall_transport::{Transport, WebSocketTransport};

use crate::GridfallError;
use crate::handler::handle_connection;
use crate::router::{RouterHandle, spawn_router};

/// Inbound command queue size for the router actor.
const DEFAULT_COMMAND_BUFFER: usize = 64;

/// Builder for configuring and starting a Gridfall server.
///
/// # Example
///
/// ```rust,no_run
/// use gridfall::GridfallServerBuilder;
///
/// # async fn run() -> Result<(), gridfall::GridfallError> {
/// let server = GridfallServerBuilder::new()
///     .bind("0.0.0.0:3000")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct GridfallServerBuilder {
    bind_addr: String,
    command_buffer: usize,
}

impl GridfallServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            command_buffer: DEFAULT_COMMAND_BUFFER,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the router's inbound command queue size.
    pub fn command_buffer(mut self, size: usize) -> Self {
        self.command_buffer = size;
        self
    }

    /// Binds the transport, spawns the router, and returns the server.
    pub async fn build(self) -> Result<GridfallServer, GridfallError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        let router = spawn_router(self.command_buffer);
        Ok(GridfallServer { transport, router })
    }
}

impl Default for GridfallServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Gridfall server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct GridfallServer {
    transport: WebSocketTransport,
    router: RouterHandle,
}

impl GridfallServer {
    /// Creates a new builder.
    pub fn builder() -> GridfallServerBuilder {
        GridfallServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop, spawning a handler task per connection.
    /// Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), GridfallError> {
        tracing::info!("Gridfall server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let router = self.router.clone();
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_connection(conn, router, JsonCodec).await
                        {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
