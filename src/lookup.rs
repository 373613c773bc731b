use std::collections::HashMap;

use crate::api::Player;
use crate::error::{FplError, FplResult};

/// Player id to display name, built once per session from the bootstrap roster.
#[derive(Debug, Clone, Default)]
pub struct PlayerIndex {
    names: HashMap<u32, String>,
}

pub fn build_index(players: &[Player]) -> PlayerIndex {
    PlayerIndex::build(players)
}

impl PlayerIndex {
    pub fn build(players: &[Player]) -> Self {
        let names = players
            .iter()
            .map(|p| (p.id, p.display_name.clone()))
            .collect();
        Self { names }
    }

    pub fn name_of(&self, player_id: u32) -> FplResult<&str> {
        self.names
            .get(&player_id)
            .map(String::as_str)
            .ok_or(FplError::UnknownPlayer(player_id))
    }
}
