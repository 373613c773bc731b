//! One dashboard session: a fetcher plus everything fetched or derived through it.
//!
//! Nothing here outlives the session. Bodies are cached per resource key and
//! player points per (player, gameweek), so the season tables and the
//! drill-down share upstream calls instead of repeating them.

use std::collections::HashMap;
use std::rc::Rc;

use tracing::{info, warn};

use crate::api::{
    self, Bootstrap, GameweekPicks, HistoryRow, ManagerSnapshot, PlayerHistory, Position,
};
use crate::comparison::{self, ComparisonRow};
use crate::config::MAX_GAMEWEEKS;
use crate::error::{FplError, FplResult};
use crate::fetch::Fetcher;
use crate::gameweek::{self, ScoredPick};
use crate::http_client::Transport;
use crate::lookup::PlayerIndex;
use crate::season::{
    self, CaptainRecord, LeagueOverviewRow, SeasonRow, SeasonTable, SkippedGameweek,
    TopPerformerRecord, ValueRow,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKey {
    Bootstrap,
    Manager(u32),
    History(u32),
    Picks { manager_id: u32, gameweek: u8 },
    ElementSummary(u32),
}

impl ResourceKey {
    pub fn path(&self) -> String {
        match *self {
            ResourceKey::Bootstrap => api::bootstrap_path(),
            ResourceKey::Manager(id) => api::manager_path(id),
            ResourceKey::History(id) => api::history_path(id),
            ResourceKey::Picks {
                manager_id,
                gameweek,
            } => api::picks_path(manager_id, gameweek),
            ResourceKey::ElementSummary(id) => api::element_summary_path(id),
        }
    }
}

#[derive(Debug, Default)]
pub struct SessionCache {
    bodies: HashMap<ResourceKey, String>,
    histories: HashMap<u32, Rc<PlayerHistory>>,
    /// Players whose history could not be fetched or decoded.
    failed_histories: HashMap<u32, FplError>,
    points: HashMap<(u32, u8), Option<i32>>,
}

impl SessionCache {
    pub fn body<T: Transport>(
        &mut self,
        fetcher: &Fetcher<T>,
        key: ResourceKey,
    ) -> FplResult<String> {
        if let Some(body) = self.bodies.get(&key) {
            return Ok(body.clone());
        }
        let body = fetcher.fetch_body(&key.path())?;
        self.bodies.insert(key, body.clone());
        Ok(body)
    }

    pub fn player_history<T: Transport>(
        &mut self,
        fetcher: &Fetcher<T>,
        player_id: u32,
    ) -> FplResult<Rc<PlayerHistory>> {
        if let Some(history) = self.histories.get(&player_id) {
            return Ok(Rc::clone(history));
        }
        if let Some(err) = self.failed_histories.get(&player_id) {
            return Err(err.clone());
        }
        let history = self
            .body(fetcher, ResourceKey::ElementSummary(player_id))
            .and_then(|body| api::parse_element_summary_json(&body, player_id));
        match history {
            Ok(history) => {
                let history = Rc::new(history);
                self.histories.insert(player_id, Rc::clone(&history));
                Ok(history)
            }
            Err(err) => {
                if !err.is_fatal() {
                    self.failed_histories.insert(player_id, err.clone());
                }
                Err(err)
            }
        }
    }

    pub fn player_points<T: Transport>(
        &mut self,
        fetcher: &Fetcher<T>,
        player_id: u32,
        gameweek: u8,
    ) -> FplResult<Option<i32>> {
        if let Some(points) = self.points.get(&(player_id, gameweek)) {
            return Ok(*points);
        }
        let points = self.player_history(fetcher, player_id)?.points_in(gameweek);
        self.points.insert((player_id, gameweek), points);
        Ok(points)
    }

    pub fn clear(&mut self) {
        self.bodies.clear();
        self.histories.clear();
        self.failed_histories.clear();
        self.points.clear();
    }
}

/// What the played-gameweek probe found. A gameweek whose picks answered 2xx
/// but could not be decoded still counts as played and keeps its error.
#[derive(Debug, Default)]
pub struct PlayedGameweeks {
    pub picks: Vec<GameweekPicks>,
    pub unreadable: Vec<(u8, FplError)>,
}

impl PlayedGameweeks {
    pub fn count(&self) -> u8 {
        (self.picks.len() + self.unreadable.len()) as u8
    }

    fn error_for(&self, gameweek: u8) -> Option<&FplError> {
        self.unreadable
            .iter()
            .find(|(gw, _)| *gw == gameweek)
            .map(|(_, err)| err)
    }

    fn add_skips<R>(&self, mut table: SeasonTable<R>) -> SeasonTable<R> {
        table
            .skipped
            .extend(self.unreadable.iter().map(|(gameweek, err)| SkippedGameweek {
                gameweek: *gameweek,
                reason: err.to_string(),
            }));
        table.skipped.sort_by_key(|s| s.gameweek);
        table
    }
}

pub struct Session<T: Transport> {
    fetcher: Fetcher<T>,
    manager_id: u32,
    cache: SessionCache,
    bootstrap: Option<Rc<Bootstrap>>,
    index: Option<Rc<PlayerIndex>>,
    played: Option<Rc<PlayedGameweeks>>,
}

impl<T: Transport> Session<T> {
    pub fn new(fetcher: Fetcher<T>, manager_id: u32) -> Self {
        Self {
            fetcher,
            manager_id,
            cache: SessionCache::default(),
            bootstrap: None,
            index: None,
            played: None,
        }
    }

    pub fn manager_id(&self) -> u32 {
        self.manager_id
    }

    pub fn fetcher(&self) -> &Fetcher<T> {
        &self.fetcher
    }

    pub fn cache(&self) -> &SessionCache {
        &self.cache
    }

    /// Switches manager; league-wide data and player histories stay cached.
    pub fn set_manager(&mut self, manager_id: u32) {
        if manager_id != self.manager_id {
            self.manager_id = manager_id;
            self.played = None;
        }
    }

    /// Drops everything fetched so far.
    pub fn reload(&mut self) {
        self.cache.clear();
        self.bootstrap = None;
        self.index = None;
        self.played = None;
    }

    pub fn bootstrap(&mut self) -> FplResult<Rc<Bootstrap>> {
        if let Some(bootstrap) = &self.bootstrap {
            return Ok(Rc::clone(bootstrap));
        }
        let body = self.cache.body(&self.fetcher, ResourceKey::Bootstrap)?;
        let bootstrap = Rc::new(api::parse_bootstrap_json(&body)?);
        info!(
            players = bootstrap.players.len(),
            gameweeks = bootstrap.gameweeks.len(),
            "bootstrap loaded"
        );
        self.bootstrap = Some(Rc::clone(&bootstrap));
        Ok(bootstrap)
    }

    pub fn player_index(&mut self) -> FplResult<Rc<PlayerIndex>> {
        if let Some(index) = &self.index {
            return Ok(Rc::clone(index));
        }
        let bootstrap = self.bootstrap()?;
        let index = Rc::new(PlayerIndex::build(&bootstrap.players));
        self.index = Some(Rc::clone(&index));
        Ok(index)
    }

    pub fn manager(&mut self) -> FplResult<ManagerSnapshot> {
        let body = self
            .cache
            .body(&self.fetcher, ResourceKey::Manager(self.manager_id))?;
        api::parse_manager_json(&body)
    }

    pub fn history(&mut self) -> FplResult<Vec<HistoryRow>> {
        let body = self
            .cache
            .body(&self.fetcher, ResourceKey::History(self.manager_id))?;
        api::parse_history_json(&body)
    }

    pub fn picks_for(&mut self, gameweek: u8) -> FplResult<GameweekPicks> {
        let key = ResourceKey::Picks {
            manager_id: self.manager_id,
            gameweek,
        };
        let body = self.cache.body(&self.fetcher, key)?;
        api::parse_picks_json(&body, gameweek)
    }

    /// Picks for gameweeks 1..=N, probing until the upstream answers non-2xx.
    /// A 503 is not "no more data" and is returned as an error. Picks that
    /// arrive but fail to decode are kept aside and the probe carries on.
    pub fn played_gameweeks(&mut self) -> FplResult<Rc<PlayedGameweeks>> {
        if let Some(played) = &self.played {
            return Ok(Rc::clone(played));
        }
        let mut played = PlayedGameweeks::default();
        for gameweek in 1..=MAX_GAMEWEEKS {
            match self.picks_for(gameweek) {
                Ok(picks) => played.picks.push(picks),
                Err(FplError::Upstream { status, .. }) => {
                    info!(gameweek, status, "no picks, probe stopped");
                    break;
                }
                Err(err @ (FplError::MalformedResponse { .. } | FplError::MissingData { .. })) => {
                    warn!(gameweek, error = %err, "unreadable picks");
                    played.unreadable.push((gameweek, err));
                }
                Err(err) => return Err(err),
            }
        }
        info!(
            manager_id = self.manager_id,
            played = played.count(),
            unreadable = played.unreadable.len(),
            "played gameweeks detected"
        );
        let played = Rc::new(played);
        self.played = Some(Rc::clone(&played));
        Ok(played)
    }

    pub fn played_count(&mut self) -> FplResult<u8> {
        Ok(self.played_gameweeks()?.count())
    }

    pub fn player_points(&mut self, player_id: u32, gameweek: u8) -> FplResult<Option<i32>> {
        self.cache.player_points(&self.fetcher, player_id, gameweek)
    }

    pub fn gameweek_squad(&mut self, gameweek: u8) -> FplResult<Vec<ScoredPick>> {
        let index = self.player_index()?;
        let played = self.played_gameweeks()?;
        if let Some(err) = played.error_for(gameweek) {
            return Err(err.clone());
        }
        let Some(picks) = played.picks.iter().find(|p| p.gameweek == gameweek) else {
            return Err(FplError::missing(
                gameweek,
                format!("no picks (manager has played {} gameweeks)", played.count()),
            ));
        };
        gameweek::normalize_gameweek(picks, &index, |pid, gw| self.player_points(pid, gw))
    }

    pub fn active_chip(&mut self, gameweek: u8) -> FplResult<Option<String>> {
        let played = self.played_gameweeks()?;
        Ok(played
            .picks
            .iter()
            .find(|p| p.gameweek == gameweek)
            .and_then(|p| p.active_chip.clone()))
    }

    pub fn league_overview(&mut self) -> FplResult<Vec<LeagueOverviewRow>> {
        Ok(season::league_overview(&self.bootstrap()?.gameweeks))
    }

    pub fn league_top_players(&mut self) -> FplResult<SeasonTable<TopPerformerRecord>> {
        let bootstrap = self.bootstrap()?;
        let index = self.player_index()?;
        Ok(season::league_top_players(&bootstrap.gameweeks, &index))
    }

    pub fn value_table(&mut self, position: Position) -> FplResult<Vec<ValueRow>> {
        Ok(season::value_table(&self.bootstrap()?.players, position))
    }

    pub fn season_performance(&mut self) -> FplResult<Vec<SeasonRow>> {
        let overview = self.league_overview()?;
        let history = self.history()?;
        Ok(season::season_performance(&history, &overview))
    }

    pub fn captain_records(&mut self) -> FplResult<SeasonTable<CaptainRecord>> {
        let index = self.player_index()?;
        let played = self.played_gameweeks()?;
        let table = season::captain_performance(&played.picks, &index, |pid, gw| {
            self.player_points(pid, gw)
        })?;
        Ok(played.add_skips(table))
    }

    pub fn top_performers(&mut self) -> FplResult<SeasonTable<TopPerformerRecord>> {
        let index = self.player_index()?;
        let played = self.played_gameweeks()?;
        let table = season::top_performers(&played.picks, &index, |pid, gw| {
            self.player_points(pid, gw)
        })?;
        Ok(played.add_skips(table))
    }

    pub fn comparison(&mut self) -> FplResult<Vec<ComparisonRow>> {
        let captains = self.captain_records()?;
        let tops = self.top_performers()?;
        Ok(comparison::assemble(&captains.rows, &tops.rows))
    }
}
