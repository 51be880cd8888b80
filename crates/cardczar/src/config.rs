//! Server configuration.

use std::path::PathBuf;

use cardczar_room::DirectoryConfig;

/// Where the server listens and which cards it plays with.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address of the WebSocket listener.
    pub ws_addr: String,
    /// Address of the HTTP listener (room creation).
    pub http_addr: String,
    /// JSON file of card packs. `None` uses the built-in packs.
    pub card_packs: Option<PathBuf>,
    pub directory: DirectoryConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ws_addr: "127.0.0.1:8080".to_string(),
            http_addr: "127.0.0.1:8081".to_string(),
            card_packs: None,
            directory: DirectoryConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `WS_ADDR`, `HTTP_ADDR` and `CARD_PACKS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(addr) = lookup("WS_ADDR") {
            config.ws_addr = addr;
        }
        if let Some(addr) = lookup("HTTP_ADDR") {
            config.http_addr = addr;
        }
        config.card_packs = lookup("CARD_PACKS")
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);
        config
    }
}
