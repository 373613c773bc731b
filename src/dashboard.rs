//! Fills the dashboard state from a session, one blocking load at a time.

use chrono::Local;

use crate::api::Position;
use crate::error::FplResult;
use crate::http_client::Transport;
use crate::session::Session;
use crate::state::{CaptainView, Delta, LeagueView, ManagerView, SquadView};

/// League-wide tables plus the value table for one position.
pub fn load_league<T: Transport>(
    session: &mut Session<T>,
    position: Position,
) -> FplResult<Vec<Delta>> {
    let overview = session.league_overview()?;
    let top = session.league_top_players()?;
    let values = session.value_table(position)?;
    Ok(vec![
        Delta::SetLeague(LeagueView {
            overview,
            top_players: top.rows,
        }),
        Delta::Skipped {
            table: "league top players",
            gameweeks: top.skipped,
        },
        Delta::SetValues {
            position,
            rows: values,
        },
    ])
}

pub fn load_values<T: Transport>(
    session: &mut Session<T>,
    position: Position,
) -> FplResult<Vec<Delta>> {
    let rows = session.value_table(position)?;
    Ok(vec![Delta::SetValues { position, rows }])
}

pub fn load_manager<T: Transport>(session: &mut Session<T>) -> FplResult<Vec<Delta>> {
    let snapshot = session.manager()?;
    let season = session.season_performance()?;
    let played = session.played_count()?;
    Ok(vec![
        Delta::Log(format!(
            "[INFO] Manager {} {} {}: {} gameweeks played",
            snapshot.manager_id, snapshot.first_name, snapshot.last_name, played
        )),
        Delta::SetManager(ManagerView {
            snapshot,
            season,
            played,
        }),
    ])
}

pub fn load_squad<T: Transport>(session: &mut Session<T>, gameweek: u8) -> FplResult<Vec<Delta>> {
    let rows = session.gameweek_squad(gameweek)?;
    let chip = session.active_chip(gameweek)?;
    Ok(vec![Delta::SetSquad(SquadView {
        gameweek,
        chip,
        rows,
    })])
}

pub fn load_captains<T: Transport>(session: &mut Session<T>) -> FplResult<Vec<Delta>> {
    let captains = session.captain_records()?;
    let tops = session.top_performers()?;
    let comparison = crate::comparison::assemble(&captains.rows, &tops.rows);
    Ok(vec![
        Delta::Skipped {
            table: "captains",
            gameweeks: captains.skipped,
        },
        Delta::Skipped {
            table: "top performers",
            gameweeks: tops.skipped,
        },
        Delta::SetCaptains(CaptainView {
            captains: captains.rows,
            tops: tops.rows,
            comparison,
        }),
    ])
}

/// Every view for the current manager. A failing section is logged and the rest still load,
/// except for fatal errors, which stop the load.
pub fn load_all<T: Transport>(
    session: &mut Session<T>,
    position: Position,
    gameweek: u8,
) -> FplResult<Vec<Delta>> {
    let mut deltas = Vec::new();
    absorb(&mut deltas, "League", load_league(session, position))?;
    absorb(&mut deltas, "Manager", load_manager(session))?;
    absorb(&mut deltas, "Gameweek", load_squad(session, gameweek))?;
    absorb(&mut deltas, "Captains", load_captains(session))?;
    deltas.push(Delta::Loaded {
        at: Local::now().format("%H:%M:%S").to_string(),
    });
    Ok(deltas)
}

fn absorb(deltas: &mut Vec<Delta>, label: &str, result: FplResult<Vec<Delta>>) -> FplResult<()> {
    match result {
        Ok(mut out) => deltas.append(&mut out),
        Err(err) if err.is_fatal() => return Err(err),
        Err(err) => deltas.push(Delta::Log(format!("[WARN] {label}: {err}"))),
    }
    Ok(())
}
