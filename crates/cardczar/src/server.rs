//! `CardczarServer` builder and server loop.
//!
//! This is the entry point for running a Cardczar server. It ties together
//! all the layers: sockets → hub → room directory → game rules.

use std::path::PathBuf;
use std::sync::Arc;

use cardczar_game::CardCatalog;
use cardczar_room::{DirectoryConfig, MemoryStore, RoomDirectory};
use tokio::net::TcpListener;

use crate::handler::handle_connection;
use crate::hub::SocketHub;
use crate::{CardczarError, ServerConfig, http};

/// The room directory as the server runs it.
pub type Directory = RoomDirectory<MemoryStore, SocketHub>;

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState {
    pub(crate) directory: Arc<Directory>,
    pub(crate) hub: Arc<SocketHub>,
}

/// Builder for configuring and starting a Cardczar server.
///
/// # Example
///
/// ```rust,no_run
/// # async fn run() -> Result<(), cardczar::CardczarError> {
/// use cardczar::CardczarServer;
///
/// let server = CardczarServer::builder()
///     .bind("0.0.0.0:8080")
///     .http_bind("0.0.0.0:8081")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct CardczarServerBuilder {
    config: ServerConfig,
    catalog: Option<CardCatalog>,
}

impl CardczarServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::from_config(ServerConfig::default())
    }

    pub fn from_config(config: ServerConfig) -> Self {
        Self { config, catalog: None }
    }

    /// Sets the WebSocket listen address.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.ws_addr = addr.to_string();
        self
    }

    /// Sets the HTTP listen address.
    pub fn http_bind(mut self, addr: &str) -> Self {
        self.config.http_addr = addr.to_string();
        self
    }

    /// Reads card packs from a JSON file at build time.
    pub fn card_packs(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.card_packs = Some(path.into());
        self
    }

    /// Uses an already loaded catalog instead of a pack file.
    pub fn catalog(mut self, catalog: CardCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn directory_config(mut self, config: DirectoryConfig) -> Self {
        self.config.directory = config;
        self
    }

    /// Loads the cards and binds both listeners.
    pub async fn build(self) -> Result<CardczarServer, CardczarError> {
        let catalog = match (self.catalog, &self.config.card_packs) {
            (Some(catalog), _) => catalog,
            (None, Some(path)) => {
                let json = tokio::fs::read_to_string(path).await?;
                CardCatalog::from_json(&json)?
            }
            (None, None) => CardCatalog::builtin()?,
        };
        tracing::info!(packs = catalog.pack_ids().len(), "card catalog loaded");

        let ws_listener = TcpListener::bind(&self.config.ws_addr).await?;
        let http_listener = TcpListener::bind(&self.config.http_addr).await?;
        tracing::info!(ws = %ws_listener.local_addr()?, http = %http_listener.local_addr()?, "listening");

        let hub = Arc::new(SocketHub::new());
        let directory = RoomDirectory::new(
            Arc::new(MemoryStore::default()),
            Arc::clone(&hub),
            Arc::new(catalog),
            self.config.directory,
        );
        let state = Arc::new(ServerState {
            directory: Arc::new(directory),
            hub,
        });

        Ok(CardczarServer {
            ws_listener,
            http_listener,
            state,
        })
    }
}

impl Default for CardczarServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Cardczar server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct CardczarServer {
    ws_listener: TcpListener,
    http_listener: TcpListener,
    state: Arc<ServerState>,
}

impl CardczarServer {
    /// Creates a new builder.
    pub fn builder() -> CardczarServerBuilder {
        CardczarServerBuilder::new()
    }

    /// Returns the address the WebSocket listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.ws_listener.local_addr()
    }

    /// Returns the address the HTTP listener is bound to.
    pub fn http_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.http_listener.local_addr()
    }

    /// The room directory, for inspection and shutdown.
    pub fn directory(&self) -> Arc<Directory> {
        Arc::clone(&self.state.directory)
    }

    /// Runs the HTTP endpoint and the WebSocket accept loop.
    ///
    /// Spawns a handler task per connection. Runs until the process is
    /// terminated or the HTTP server fails.
    pub async fn run(self) -> Result<(), CardczarError> {
        tracing::info!("Cardczar server running");
        let Self {
            ws_listener,
            http_listener,
            state,
        } = self;

        let app = http::router(Arc::clone(&state));
        let mut http = tokio::spawn(async move { axum::serve(http_listener, app).await });

        loop {
            tokio::select! {
                accepted = ws_listener.accept() => match accepted {
                    Ok((stream, _)) => {
                        let state = Arc::clone(&state);
                        tokio::spawn(async move {
                            if let Err(err) = handle_connection(stream, state).await {
                                tracing::debug!(error = %err, "connection ended with error");
                            }
                        });
                    }
                    Err(err) => {
                        tracing::error!(error = %err, "accept failed");
                    }
                },
                served = &mut http => {
                    tracing::error!("http server stopped");
                    return match served {
                        Ok(result) => result.map_err(CardczarError::from),
                        Err(join) => Err(std::io::Error::other(join).into()),
                    };
                }
            }
        }
    }
}
