#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use fpl_terminal::api::{GameweekPicks, SquadPick};
use fpl_terminal::fetch::{Fetcher, RetryPolicy};
use fpl_terminal::http_client::{HttpResponse, Transport, TransportFailure};
use fpl_terminal::session::Session;

pub const BASE: &str = "http://fpl.test/api";

pub fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

type Reply = Result<HttpResponse, TransportFailure>;

/// Replays queued replies per url; the last reply of a queue repeats.
/// Unknown urls answer 404.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: RefCell<HashMap<String, VecDeque<Reply>>>,
    calls: RefCell<HashMap<String, usize>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(self, path: &str, replies: Vec<Reply>) -> Self {
        self.routes
            .borrow_mut()
            .insert(format!("{BASE}{path}"), replies.into_iter().collect());
        self
    }

    pub fn json(self, path: &str, body: impl Into<String>) -> Self {
        self.route(path, vec![Ok(HttpResponse::ok(body))])
    }

    pub fn status(self, path: &str, status: u16) -> Self {
        self.route(path, vec![Ok(HttpResponse::status(status))])
    }

    pub fn calls(&self, path: &str) -> usize {
        self.calls
            .borrow()
            .get(&format!("{BASE}{path}"))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.borrow().values().sum()
    }
}

impl Transport for ScriptedTransport {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportFailure> {
        *self.calls.borrow_mut().entry(url.to_string()).or_default() += 1;
        let mut routes = self.routes.borrow_mut();
        let Some(queue) = routes.get_mut(url) else {
            return Ok(HttpResponse::status(404));
        };
        if queue.len() > 1 {
            return queue.pop_front().unwrap_or_else(|| Ok(HttpResponse::status(404)));
        }
        queue
            .front()
            .cloned()
            .unwrap_or_else(|| Ok(HttpResponse::status(404)))
    }
}

pub fn fast_retry(max_attempts: Option<u32>) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_delay: Duration::ZERO,
        max_delay: Duration::ZERO,
        max_elapsed: None,
    }
}

pub fn fetcher(transport: ScriptedTransport) -> Fetcher<ScriptedTransport> {
    Fetcher::new(transport, BASE, fast_retry(Some(3)))
}

pub fn session(transport: ScriptedTransport, manager_id: u32) -> Session<ScriptedTransport> {
    Session::new(fetcher(transport), manager_id)
}

pub fn transport_failure(msg: &str) -> Reply {
    Err(TransportFailure(msg.to_string()))
}

/// Players 1..=n named `P1`.. plus whatever is in `named`.
pub fn bootstrap_json(count: u32, named: &[(u32, &str)], events: &str) -> String {
    let elements = (1..=count)
        .map(|id| {
            let name = named
                .iter()
                .find(|(nid, _)| *nid == id)
                .map(|(_, n)| n.to_string())
                .unwrap_or_else(|| format!("P{id}"));
            let element_type = (id % 4) + 1;
            format!(
                r#"{{"id":{id},"web_name":"{name}","element_type":{element_type},"now_cost":{cost},"total_points":{pts},"minutes":900}}"#,
                cost = 40 + id,
                pts = id * 3
            )
        })
        .collect::<Vec<_>>()
        .join(",");
    format!(r#"{{"elements":[{elements}],"events":{events}}}"#)
}

/// Fifteen picks: first eleven start, last four on the bench.
pub fn picks_json(ids: &[u32], captain: u32, vice: u32, captain_multiplier: u8) -> String {
    let picks = ids
        .iter()
        .enumerate()
        .map(|(pos, id)| {
            let multiplier = if *id == captain {
                captain_multiplier
            } else if pos < 11 {
                1
            } else {
                0
            };
            format!(
                r#"{{"element":{id},"position":{},"multiplier":{multiplier},"is_captain":{},"is_vice_captain":{}}}"#,
                pos + 1,
                *id == captain,
                *id == vice
            )
        })
        .collect::<Vec<_>>()
        .join(",");
    format!(r#"{{"active_chip":null,"entry_history":{{}},"picks":[{picks}]}}"#)
}

pub fn element_summary_json(rounds: &[(u8, i32)]) -> String {
    let history = rounds
        .iter()
        .map(|(round, pts)| format!(r#"{{"element":0,"round":{round},"total_points":{pts}}}"#))
        .collect::<Vec<_>>()
        .join(",");
    format!(r#"{{"fixtures":[],"history":[{history}],"history_past":[]}}"#)
}

pub fn squad(
    gameweek: u8,
    ids: &[u32],
    captain: Option<u32>,
    captain_multiplier: u8,
) -> GameweekPicks {
    GameweekPicks {
        gameweek,
        active_chip: None,
        picks: ids
            .iter()
            .enumerate()
            .map(|(pos, id)| {
                let is_captain = Some(*id) == captain;
                SquadPick {
                    gameweek_index: gameweek,
                    player_id: *id,
                    multiplier: if is_captain {
                        captain_multiplier
                    } else if pos < 11 {
                        1
                    } else {
                        0
                    },
                    is_captain,
                    is_vice_captain: false,
                }
            })
            .collect(),
    }
}

pub fn ids(range: std::ops::RangeInclusive<u32>) -> Vec<u32> {
    range.collect()
}
