//! Season-wide tables derived from bootstrap, history and per-gameweek picks.

use tracing::warn;

use crate::api::{GameweekPicks, GameweekSummary, HistoryRow, Player, Position};
use crate::error::{FplError, FplResult};
use crate::gameweek::soften_lookup;
use crate::lookup::PlayerIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeagueOverviewRow {
    pub gameweek: u8,
    pub average_score: i32,
    pub highest_score: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptainRecord {
    pub gameweek_index: u8,
    pub captain_player_id: u32,
    pub captain_display_name: String,
    /// Base score, not multiplied by the captaincy multiplier.
    pub points_scored: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopPerformerRecord {
    pub gameweek_index: u8,
    pub player_id: u32,
    pub top_player_display_name: String,
    pub points_scored: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedGameweek {
    pub gameweek: u8,
    pub reason: String,
}

/// Rows that could be derived plus the gameweeks that were left out and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonTable<T> {
    pub rows: Vec<T>,
    pub skipped: Vec<SkippedGameweek>,
}

impl<T> Default for SeasonTable<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

impl<T> SeasonTable<T> {
    fn skip(&mut self, gameweek: u8, err: &FplError, table: &'static str) {
        warn!(gameweek, table, error = %err, "skipping gameweek");
        self.skipped.push(SkippedGameweek {
            gameweek,
            reason: err.to_string(),
        });
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeasonRow {
    pub gameweek: u8,
    pub points: i32,
    pub total_points: i32,
    pub gameweek_rank: Option<u64>,
    pub overall_rank: Option<u64>,
    pub bank: f64,
    pub value: f64,
    pub transfers: u32,
    pub transfers_cost: i32,
    pub points_on_bench: i32,
    pub points_after_hits: i32,
    pub average_points: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValueRow {
    pub player_id: u32,
    pub display_name: String,
    pub cost: f64,
    pub total_points: i32,
    pub points_per_million: f64,
}

/// League-wide average and highest score for every completed gameweek.
pub fn league_overview(gameweeks: &[GameweekSummary]) -> Vec<LeagueOverviewRow> {
    let mut rows: Vec<LeagueOverviewRow> = gameweeks
        .iter()
        .filter_map(|gw| {
            Some(LeagueOverviewRow {
                gameweek: gw.index,
                average_score: gw.average_score?,
                highest_score: gw.highest_score?,
            })
        })
        .collect();
    rows.sort_by_key(|row| row.gameweek);
    rows
}

/// The league's best individual player of each completed gameweek.
pub fn league_top_players(
    gameweeks: &[GameweekSummary],
    index: &PlayerIndex,
) -> SeasonTable<TopPerformerRecord> {
    let mut table = SeasonTable::default();
    for gw in gameweeks {
        let (Some(player_id), Some(points)) = (gw.top_scoring_player_id, gw.top_scoring_points)
        else {
            continue;
        };
        match index.name_of(player_id) {
            Ok(name) => table.rows.push(TopPerformerRecord {
                gameweek_index: gw.index,
                player_id,
                top_player_display_name: name.to_string(),
                points_scored: points,
            }),
            Err(err) => table.skip(gw.index, &err, "league top players"),
        }
    }
    table
}

/// The manager's captain in each played gameweek with that player's base score.
pub fn captain_performance<F>(
    played: &[GameweekPicks],
    index: &PlayerIndex,
    mut points_for: F,
) -> FplResult<SeasonTable<CaptainRecord>>
where
    F: FnMut(u32, u8) -> FplResult<Option<i32>>,
{
    let mut table = SeasonTable::default();
    for picks in played {
        let gw = picks.gameweek;
        let Some(captain) = picks.captain() else {
            table.skip(gw, &FplError::missing(gw, "no captain flagged in picks"), "captains");
            continue;
        };
        let name = match index.name_of(captain.player_id) {
            Ok(name) => name.to_string(),
            Err(err) => {
                table.skip(gw, &err, "captains");
                continue;
            }
        };
        let points = soften_lookup(points_for(captain.player_id, gw), captain.player_id, gw)?;
        let Some(points) = points else {
            table.skip(gw, &FplError::missing(gw, "captain points unavailable"), "captains");
            continue;
        };
        table.rows.push(CaptainRecord {
            gameweek_index: gw,
            captain_player_id: captain.player_id,
            captain_display_name: name,
            points_scored: points,
        });
    }
    Ok(table)
}

/// The highest individual scorer among all squad members of each played gameweek.
/// Ties go to the pick listed first.
pub fn top_performers<F>(
    played: &[GameweekPicks],
    index: &PlayerIndex,
    mut points_for: F,
) -> FplResult<SeasonTable<TopPerformerRecord>>
where
    F: FnMut(u32, u8) -> FplResult<Option<i32>>,
{
    let mut table = SeasonTable::default();
    for picks in played {
        let gw = picks.gameweek;
        let mut best: Option<(u32, i32)> = None;
        for pick in &picks.picks {
            let points = soften_lookup(points_for(pick.player_id, gw), pick.player_id, gw)?;
            let Some(points) = points else {
                continue;
            };
            if best.is_none_or(|(_, top)| points > top) {
                best = Some((pick.player_id, points));
            }
        }
        let Some((player_id, points)) = best else {
            table.skip(gw, &FplError::missing(gw, "no squad points available"), "top performers");
            continue;
        };
        match index.name_of(player_id) {
            Ok(name) => table.rows.push(TopPerformerRecord {
                gameweek_index: gw,
                player_id,
                top_player_display_name: name.to_string(),
                points_scored: points,
            }),
            Err(err) => table.skip(gw, &err, "top performers"),
        }
    }
    Ok(table)
}

pub fn season_performance(
    history: &[HistoryRow],
    overview: &[LeagueOverviewRow],
) -> Vec<SeasonRow> {
    history
        .iter()
        .map(|row| SeasonRow {
            gameweek: row.gameweek,
            points: row.points,
            total_points: row.total_points,
            gameweek_rank: row.gameweek_rank,
            overall_rank: row.overall_rank,
            bank: row.bank_tenths as f64 / 10.0,
            value: row.value_tenths as f64 / 10.0,
            transfers: row.transfers,
            transfers_cost: row.transfers_cost,
            points_on_bench: row.points_on_bench,
            points_after_hits: row.points - row.transfers_cost,
            average_points: overview
                .iter()
                .find(|o| o.gameweek == row.gameweek)
                .map(|o| o.average_score),
        })
        .collect()
}

/// Points per million for one position, best value first.
pub fn value_table(players: &[Player], position: Position) -> Vec<ValueRow> {
    let mut rows: Vec<ValueRow> = players
        .iter()
        .filter(|p| p.position == position)
        .map(|p| {
            let cost = p.cost();
            let points_per_million = if p.cost_tenths == 0 {
                0.0
            } else {
                p.total_points as f64 / cost
            };
            ValueRow {
                player_id: p.id,
                display_name: p.display_name.clone(),
                cost,
                total_points: p.total_points,
                points_per_million,
            }
        })
        .collect();
    rows.sort_by(|a, b| {
        b.points_per_million
            .total_cmp(&a.points_per_million)
            .then_with(|| b.total_points.cmp(&a.total_points))
    });
    rows
}
