use std::collections::VecDeque;

use crate::api::{ManagerSnapshot, Position};
use crate::comparison::ComparisonRow;
use crate::gameweek::ScoredPick;
use crate::season::{
    CaptainRecord, LeagueOverviewRow, SeasonRow, SkippedGameweek, TopPerformerRecord, ValueRow,
};

const MAX_LOGS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Overview,
    Manager,
    Gameweek,
    Captains,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeagueView {
    pub overview: Vec<LeagueOverviewRow>,
    pub top_players: Vec<TopPerformerRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ManagerView {
    pub snapshot: ManagerSnapshot,
    pub season: Vec<SeasonRow>,
    pub played: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SquadView {
    pub gameweek: u8,
    pub chip: Option<String>,
    pub rows: Vec<ScoredPick>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaptainView {
    pub captains: Vec<CaptainRecord>,
    pub tops: Vec<TopPerformerRecord>,
    pub comparison: Vec<ComparisonRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Delta {
    SetLeague(LeagueView),
    SetValues {
        position: Position,
        rows: Vec<ValueRow>,
    },
    SetManager(ManagerView),
    SetSquad(SquadView),
    SetCaptains(CaptainView),
    Skipped {
        table: &'static str,
        gameweeks: Vec<SkippedGameweek>,
    },
    Loaded {
        at: String,
    },
    Log(String),
}

#[derive(Debug)]
pub struct AppState {
    pub screen: Screen,
    pub manager_id: u32,
    pub position: Position,
    pub selected_gameweek: u8,
    pub league: Option<LeagueView>,
    pub values: Vec<ValueRow>,
    pub manager: Option<ManagerView>,
    pub squad: Option<SquadView>,
    pub captains: Option<CaptainView>,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
    /// Manager id being typed, when the input prompt is open.
    pub input: Option<String>,
    pub loaded_at: Option<String>,
}

impl AppState {
    pub fn new(manager_id: u32) -> Self {
        Self {
            screen: Screen::Overview,
            manager_id,
            position: Position::Goalkeeper,
            selected_gameweek: 1,
            league: None,
            values: Vec::new(),
            manager: None,
            squad: None,
            captains: None,
            logs: VecDeque::new(),
            help_overlay: false,
            input: None,
            loaded_at: None,
        }
    }

    pub fn played(&self) -> u8 {
        self.manager.as_ref().map(|m| m.played).unwrap_or(0)
    }

    /// Moves the drill-down one gameweek forward; true when the selection changed.
    pub fn next_gameweek(&mut self) -> bool {
        if self.selected_gameweek < self.played() {
            self.selected_gameweek += 1;
            self.squad = None;
            return true;
        }
        false
    }

    pub fn prev_gameweek(&mut self) -> bool {
        if self.selected_gameweek > 1 {
            self.selected_gameweek -= 1;
            self.squad = None;
            return true;
        }
        false
    }

    pub fn cycle_position(&mut self) {
        self.position = self.position.next();
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn begin_input(&mut self) {
        self.input = Some(String::new());
    }

    pub fn input_char(&mut self, c: char) {
        if let Some(buf) = self.input.as_mut() {
            if c.is_ascii_digit() && buf.len() < 10 {
                buf.push(c);
            }
        }
    }

    pub fn input_backspace(&mut self) {
        if let Some(buf) = self.input.as_mut() {
            buf.pop();
        }
    }

    pub fn cancel_input(&mut self) {
        self.input = None;
    }

    /// Closes the prompt and switches manager if the typed id is valid.
    pub fn commit_input(&mut self) -> Option<u32> {
        let raw = self.input.take()?;
        match raw.parse::<u32>() {
            Ok(id) if id > 0 => {
                if id != self.manager_id {
                    self.manager_id = id;
                    self.clear_manager_views();
                }
                Some(id)
            }
            _ => {
                self.push_log(format!("[WARN] Invalid manager id '{raw}'"));
                None
            }
        }
    }

    pub fn clear_manager_views(&mut self) {
        self.manager = None;
        self.squad = None;
        self.captains = None;
        self.selected_gameweek = 1;
    }
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::SetLeague(view) => state.league = Some(view),
        Delta::SetValues { position, rows } => {
            if position == state.position {
                state.values = rows;
            }
        }
        Delta::SetManager(view) => {
            let played = view.played;
            state.manager = Some(view);
            if played == 0 {
                state.selected_gameweek = 1;
            } else {
                state.selected_gameweek = state.selected_gameweek.clamp(1, played);
            }
        }
        Delta::SetSquad(view) => {
            if view.gameweek == state.selected_gameweek {
                state.squad = Some(view);
            }
        }
        Delta::SetCaptains(view) => state.captains = Some(view),
        Delta::Skipped { table, gameweeks } => {
            for skipped in gameweeks {
                state.push_log(format!(
                    "[WARN] {table}: skipped GW{} ({})",
                    skipped.gameweek, skipped.reason
                ));
            }
        }
        Delta::Loaded { at } => {
            state.push_log(format!("[INFO] Data loaded at {at}"));
            state.loaded_at = Some(at);
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}
