use std::cmp::Ordering;

use tracing::warn;

use crate::api::{GameweekPicks, SquadPick};
use crate::error::{FplError, FplResult};
use crate::lookup::PlayerIndex;

/// One squad member with the points it earned in the gameweek.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredPick {
    pub gameweek_index: u8,
    pub player_id: u32,
    pub display_name: String,
    pub multiplier: u8,
    pub is_captain: bool,
    pub is_vice_captain: bool,
    /// `None` when the per-player history had nothing usable for this gameweek.
    pub raw_points: Option<i32>,
    pub effective_points: Option<i32>,
}

impl ScoredPick {
    fn from_pick(pick: &SquadPick, display_name: String, raw_points: Option<i32>) -> Self {
        Self {
            gameweek_index: pick.gameweek_index,
            player_id: pick.player_id,
            display_name,
            multiplier: pick.multiplier,
            is_captain: pick.is_captain,
            is_vice_captain: pick.is_vice_captain,
            raw_points,
            effective_points: raw_points.map(|p| p * i32::from(pick.multiplier)),
        }
    }

    pub fn is_benched(&self) -> bool {
        self.multiplier == 0
    }
}

/// Turns a point lookup failure into "unknown" unless it must abort the flow.
pub fn soften_lookup(
    result: FplResult<Option<i32>>,
    player_id: u32,
    gameweek: u8,
) -> FplResult<Option<i32>> {
    match result {
        Ok(points) => Ok(points),
        Err(err) if err.is_fatal() => Err(err),
        Err(err) => {
            warn!(player_id, gameweek, error = %err, "points unavailable, marking unknown");
            Ok(None)
        }
    }
}

pub fn check_captaincy(picks: &GameweekPicks) -> FplResult<&SquadPick> {
    let mut captains = picks.picks.iter().filter(|p| p.is_captain);
    let Some(captain) = captains.next() else {
        return Err(FplError::missing(picks.gameweek, "no captain flagged in picks"));
    };
    if captains.next().is_some() {
        return Err(FplError::malformed(
            "picks",
            format!("gameweek {} has more than one captain", picks.gameweek),
        ));
    }
    if captain.multiplier < 2 {
        return Err(FplError::malformed(
            "picks",
            format!(
                "gameweek {} captain {} has multiplier {}",
                picks.gameweek, captain.player_id, captain.multiplier
            ),
        ));
    }
    Ok(captain)
}

/// Scores and ranks one gameweek's squad.
///
/// `points_for(player_id, gameweek)` returns the player's unmultiplied points.
/// Lookup failures other than transport exhaustion or cancellation leave the
/// entry's points unknown; such entries sort after every known score.
pub fn normalize_gameweek<F>(
    picks: &GameweekPicks,
    index: &PlayerIndex,
    mut points_for: F,
) -> FplResult<Vec<ScoredPick>>
where
    F: FnMut(u32, u8) -> FplResult<Option<i32>>,
{
    check_captaincy(picks)?;

    let mut rows = Vec::with_capacity(picks.picks.len());
    for pick in &picks.picks {
        let name = index.name_of(pick.player_id)?.to_string();
        let raw = soften_lookup(
            points_for(pick.player_id, picks.gameweek),
            pick.player_id,
            picks.gameweek,
        )?;
        rows.push(ScoredPick::from_pick(pick, name, raw));
    }

    sort_squad(&mut rows);
    Ok(rows)
}

/// Raw points descending, then effective points descending; unknown last.
pub fn sort_squad(rows: &mut [ScoredPick]) {
    rows.sort_by(compare_scored);
}

fn compare_scored(a: &ScoredPick, b: &ScoredPick) -> Ordering {
    // Option orders None below Some, so reversing puts unknown scores last.
    b.raw_points
        .cmp(&a.raw_points)
        .then_with(|| b.effective_points.cmp(&a.effective_points))
}
