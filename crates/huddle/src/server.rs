//! `HuddleServer` builder and accept loop.
//!
//! This is the entry point for running a gateway. It ties together
//! all the layers: transport → protocol → auth → hub.

use std::sync::Arc;

use huddle_auth::Authenticator;
use huddle_hub::{spawn_hub, HubHandle};
use huddle_protocol::{Codec, JsonCodec};
use huddle_transport::{Transport, WebSocketTransport};

use crate::handler::handle_connection;
use crate::router::EventRouter;
use crate::GatewayError;

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. There
/// are no locks here: everything mutable lives inside the hub, behind
/// its command channel.
pub(crate) struct ServerState<A: Authenticator, C: Codec> {
    pub(crate) hub: HubHandle,
    pub(crate) auth: A,
    pub(crate) codec: C,
    pub(crate) router: EventRouter,
}

/// Builder for configuring and starting a Huddle gateway.
///
/// # Example
///
/// ```rust,ignore
/// use huddle::prelude::*;
///
/// let server = HuddleServerBuilder::new()
///     .bind("0.0.0.0:8080")
///     .build(JwtAuthenticator::new(b"secret"))
///     .await?;
/// server.run().await
/// ```
pub struct HuddleServerBuilder {
    bind_addr: String,
}

impl HuddleServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Builds and starts the server with the given authenticator.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport` as defaults; the hub
    /// task is spawned here and outlives individual connections.
    pub async fn build(
        self,
        auth: impl Authenticator,
    ) -> Result<HuddleServer<impl Authenticator, JsonCodec>, GatewayError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            hub: spawn_hub(),
            auth,
            codec: JsonCodec,
            router: EventRouter::new(),
        });

        Ok(HuddleServer { transport, state })
    }
}

impl Default for HuddleServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Huddle gateway.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct HuddleServer<A: Authenticator, C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<A, C>>,
}

impl<A, C> HuddleServer<A, C>
where
    A: Authenticator,
    C: Codec,
{
    /// Creates a new builder.
    pub fn builder() -> HuddleServerBuilder {
        HuddleServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Returns a handle to the hub for pushing server-side events.
    ///
    /// This is how the rest of the application reaches connected
    /// clients: call [`HubHandle::broadcast_to_room`] after a write
    /// commits, or [`HubHandle::notify_user`] to reach one user on
    /// every device they have open.
    pub fn hub(&self) -> HubHandle {
        self.state.hub.clone()
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for
    /// each one. Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), GatewayError> {
        tracing::info!("Huddle gateway running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
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
