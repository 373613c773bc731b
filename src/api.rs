//! Upstream payloads and their decoding into typed records.
//!
//! Every `parse_*_json` fails with `MalformedResponse` as soon as a required
//! field is missing or mistyped; nothing is deferred to the point of use.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::{FplError, FplResult};

pub const SQUAD_SIZE: usize = 15;

pub fn bootstrap_path() -> String {
    "/bootstrap-static/".to_string()
}

pub fn manager_path(manager_id: u32) -> String {
    format!("/entry/{manager_id}/")
}

pub fn history_path(manager_id: u32) -> String {
    format!("/entry/{manager_id}/history/")
}

pub fn picks_path(manager_id: u32, gameweek: u8) -> String {
    format!("/entry/{manager_id}/event/{gameweek}/picks/")
}

pub fn element_summary_path(player_id: u32) -> String {
    format!("/element-summary/{player_id}/")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Position {
    Goalkeeper,
    Defender,
    Midfielder,
    Forward,
}

impl Position {
    pub const ALL: [Position; 4] = [
        Position::Goalkeeper,
        Position::Defender,
        Position::Midfielder,
        Position::Forward,
    ];

    pub fn from_element_type(element_type: u8) -> Option<Self> {
        match element_type {
            1 => Some(Position::Goalkeeper),
            2 => Some(Position::Defender),
            3 => Some(Position::Midfielder),
            4 => Some(Position::Forward),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Position::Goalkeeper => "Goalkeeper",
            Position::Defender => "Defender",
            Position::Midfielder => "Midfielder",
            Position::Forward => "Forward",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Position::Goalkeeper => Position::Defender,
            Position::Defender => Position::Midfielder,
            Position::Midfielder => Position::Forward,
            Position::Forward => Position::Goalkeeper,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: u32,
    pub display_name: String,
    pub position: Position,
    /// Tenths of a currency unit, as sent upstream.
    pub cost_tenths: u32,
    pub total_points: i32,
    pub minutes_played: u32,
}

impl Player {
    pub fn cost(&self) -> f64 {
        self.cost_tenths as f64 / 10.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameweekSummary {
    pub index: u8,
    pub average_score: Option<i32>,
    pub highest_score: Option<i32>,
    pub top_scoring_player_id: Option<u32>,
    pub top_scoring_points: Option<i32>,
    pub finished: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bootstrap {
    pub players: Vec<Player>,
    pub gameweeks: Vec<GameweekSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeagueMembership {
    pub league_name: String,
    pub current_rank: Option<u64>,
    pub previous_rank: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerSnapshot {
    pub manager_id: u32,
    pub first_name: String,
    pub last_name: String,
    pub world_rank: Option<u64>,
    pub league_memberships: Vec<LeagueMembership>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRow {
    pub gameweek: u8,
    pub points: i32,
    pub total_points: i32,
    pub gameweek_rank: Option<u64>,
    pub overall_rank: Option<u64>,
    pub bank_tenths: i32,
    pub value_tenths: i32,
    pub transfers: u32,
    pub transfers_cost: i32,
    pub points_on_bench: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SquadPick {
    pub gameweek_index: u8,
    pub player_id: u32,
    /// 0 bench, 1 normal, 2 captain, 3 triple captain.
    pub multiplier: u8,
    pub is_captain: bool,
    pub is_vice_captain: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameweekPicks {
    pub gameweek: u8,
    pub active_chip: Option<String>,
    pub picks: Vec<SquadPick>,
}

impl GameweekPicks {
    /// First pick flagged as captain, in pick order.
    pub fn captain(&self) -> Option<&SquadPick> {
        self.picks.iter().find(|p| p.is_captain)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundScore {
    pub round: u8,
    pub total_points: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerHistory {
    pub player_id: u32,
    pub rounds: Vec<RoundScore>,
}

impl PlayerHistory {
    /// Points for a gameweek; double gameweeks add both fixtures.
    pub fn points_in(&self, gameweek: u8) -> Option<i32> {
        let mut found = false;
        let mut total = 0;
        for entry in self.rounds.iter().filter(|r| r.round == gameweek) {
            found = true;
            total += entry.total_points;
        }
        found.then_some(total)
    }
}

#[derive(Debug, Deserialize)]
struct RawBootstrap {
    elements: Vec<RawElement>,
    events: Vec<RawEvent>,
}

#[derive(Debug, Deserialize)]
struct RawElement {
    id: u32,
    web_name: String,
    element_type: u8,
    now_cost: u32,
    total_points: i32,
    #[serde(default)]
    minutes: u32,
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    id: u8,
    #[serde(default)]
    average_entry_score: Option<i32>,
    #[serde(default)]
    highest_score: Option<i32>,
    #[serde(default)]
    top_element: Option<u32>,
    #[serde(default)]
    top_element_info: Option<RawTopElement>,
    #[serde(default)]
    finished: bool,
}

#[derive(Debug, Deserialize)]
struct RawTopElement {
    points: i32,
}

#[derive(Debug, Deserialize)]
struct RawManager {
    id: u32,
    player_first_name: String,
    player_last_name: String,
    #[serde(default)]
    summary_overall_rank: Option<u64>,
    leagues: RawLeagues,
}

#[derive(Debug, Deserialize)]
struct RawLeagues {
    #[serde(default)]
    classic: Vec<RawClassicLeague>,
}

#[derive(Debug, Deserialize)]
struct RawClassicLeague {
    name: String,
    #[serde(default)]
    entry_rank: Option<u64>,
    #[serde(default)]
    entry_last_rank: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawHistory {
    current: Vec<RawHistoryRow>,
}

#[derive(Debug, Deserialize)]
struct RawHistoryRow {
    event: u8,
    points: i32,
    total_points: i32,
    #[serde(default)]
    rank: Option<u64>,
    #[serde(default)]
    overall_rank: Option<u64>,
    #[serde(default)]
    bank: i32,
    #[serde(default)]
    value: i32,
    #[serde(default)]
    event_transfers: u32,
    #[serde(default)]
    event_transfers_cost: i32,
    #[serde(default)]
    points_on_bench: i32,
}

#[derive(Debug, Deserialize)]
struct RawPicks {
    #[serde(default)]
    active_chip: Option<String>,
    picks: Vec<RawPick>,
}

#[derive(Debug, Deserialize)]
struct RawPick {
    element: u32,
    multiplier: u8,
    is_captain: bool,
    is_vice_captain: bool,
}

#[derive(Debug, Deserialize)]
struct RawElementSummary {
    history: Vec<RawElementRound>,
}

#[derive(Debug, Deserialize)]
struct RawElementRound {
    round: u8,
    total_points: i32,
}

fn decode<T: DeserializeOwned>(resource: &'static str, raw: &str) -> FplResult<T> {
    serde_json::from_str(raw.trim()).map_err(|err| FplError::malformed(resource, err))
}

pub fn parse_bootstrap_json(raw: &str) -> FplResult<Bootstrap> {
    let data: RawBootstrap = decode("bootstrap-static", raw)?;

    let mut players = Vec::with_capacity(data.elements.len());
    for el in data.elements {
        let Some(position) = Position::from_element_type(el.element_type) else {
            warn!(
                player_id = el.id,
                element_type = el.element_type,
                "skipping element with unsupported element_type"
            );
            continue;
        };
        players.push(Player {
            id: el.id,
            display_name: el.web_name,
            position,
            cost_tenths: el.now_cost,
            total_points: el.total_points,
            minutes_played: el.minutes,
        });
    }

    let gameweeks = data
        .events
        .into_iter()
        .map(|ev| GameweekSummary {
            index: ev.id,
            average_score: ev.average_entry_score,
            highest_score: ev.highest_score,
            top_scoring_player_id: ev.top_element,
            top_scoring_points: ev.top_element_info.map(|info| info.points),
            finished: ev.finished,
        })
        .collect();

    Ok(Bootstrap { players, gameweeks })
}

pub fn parse_manager_json(raw: &str) -> FplResult<ManagerSnapshot> {
    let data: RawManager = decode("entry", raw)?;
    Ok(ManagerSnapshot {
        manager_id: data.id,
        first_name: data.player_first_name,
        last_name: data.player_last_name,
        world_rank: data.summary_overall_rank,
        league_memberships: data
            .leagues
            .classic
            .into_iter()
            .map(|league| LeagueMembership {
                league_name: league.name,
                current_rank: league.entry_rank,
                previous_rank: league.entry_last_rank,
            })
            .collect(),
    })
}

pub fn parse_history_json(raw: &str) -> FplResult<Vec<HistoryRow>> {
    let data: RawHistory = decode("entry history", raw)?;
    Ok(data
        .current
        .into_iter()
        .map(|row| HistoryRow {
            gameweek: row.event,
            points: row.points,
            total_points: row.total_points,
            gameweek_rank: row.rank,
            overall_rank: row.overall_rank,
            bank_tenths: row.bank,
            value_tenths: row.value,
            transfers: row.event_transfers,
            transfers_cost: row.event_transfers_cost,
            points_on_bench: row.points_on_bench,
        })
        .collect())
}

pub fn parse_picks_json(raw: &str, gameweek: u8) -> FplResult<GameweekPicks> {
    let data: RawPicks = decode("picks", raw)?;
    if data.picks.len() != SQUAD_SIZE {
        return Err(FplError::malformed(
            "picks",
            format!(
                "gameweek {gameweek} has {} picks, expected {SQUAD_SIZE}",
                data.picks.len()
            ),
        ));
    }

    let mut picks = Vec::with_capacity(SQUAD_SIZE);
    for pick in data.picks {
        if pick.multiplier > 3 {
            return Err(FplError::malformed(
                "picks",
                format!(
                    "player {} has multiplier {} in gameweek {gameweek}",
                    pick.element, pick.multiplier
                ),
            ));
        }
        picks.push(SquadPick {
            gameweek_index: gameweek,
            player_id: pick.element,
            multiplier: pick.multiplier,
            is_captain: pick.is_captain,
            is_vice_captain: pick.is_vice_captain,
        });
    }

    Ok(GameweekPicks {
        gameweek,
        active_chip: data.active_chip.filter(|chip| !chip.trim().is_empty()),
        picks,
    })
}

pub fn parse_element_summary_json(raw: &str, player_id: u32) -> FplResult<PlayerHistory> {
    let data: RawElementSummary = decode("element-summary", raw)?;
    Ok(PlayerHistory {
        player_id,
        rounds: data
            .history
            .into_iter()
            .map(|r| RoundScore {
                round: r.round,
                total_points: r.total_points,
            })
            .collect(),
    })
}
