//! Directory configuration.

use cardczar_game::GameRules;

/// Settings shared by every room actor a directory spawns.
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    /// Capacity of each room's command channel. Senders wait when full.
    pub channel_size: usize,
    /// Game constants handed to the orchestrator.
    pub rules: GameRules,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            channel_size: 64,
            rules: GameRules::default(),
        }
    }
}
