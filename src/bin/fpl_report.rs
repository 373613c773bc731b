use anyhow::{Context, Result};

use fpl_terminal::config::Config;
use fpl_terminal::fetch::Fetcher;
use fpl_terminal::http_client::ReqwestTransport;
use fpl_terminal::logging::{self, LogTarget};
use fpl_terminal::session::Session;

fn main() -> Result<()> {
    let config = Config::from_env();
    logging::init(LogTarget::Stderr)?;

    let manager_id = parse_num_arg::<u32>("--manager").unwrap_or(config.manager_id);
    let gameweek = parse_num_arg::<u8>("--gameweek");

    let transport = ReqwestTransport::new(config.request_timeout)?;
    let fetcher = Fetcher::new(transport, config.api_base.clone(), config.retry.clone());
    let mut session = Session::new(fetcher, manager_id);

    let bootstrap = session.bootstrap().context("load bootstrap")?;
    let finished = bootstrap.gameweeks.iter().filter(|gw| gw.finished).count();
    let overview = session.league_overview().context("load league overview")?;
    println!(
        "League overview ({finished} of {} gameweeks finished)",
        bootstrap.gameweeks.len()
    );
    println!("{:>3} {:>8} {:>8}", "GW", "Average", "Highest");
    for row in &overview {
        println!(
            "{:>3} {:>8} {:>8}",
            row.gameweek, row.average_score, row.highest_score
        );
    }

    let manager = session.manager().context("load manager")?;
    println!();
    println!(
        "Manager {}: {} {} (world rank {})",
        manager.manager_id,
        manager.first_name,
        manager.last_name,
        manager
            .world_rank
            .map(|r| r.to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    for league in &manager.league_memberships {
        println!(
            " - {} #{}",
            league.league_name,
            league
                .current_rank
                .map(|r| r.to_string())
                .unwrap_or_else(|| "-".to_string())
        );
    }

    let played = session.played_count().context("probe played gameweeks")?;
    println!("Gameweeks played: {played}");

    if let Some(gw) = gameweek {
        let squad = session
            .gameweek_squad(gw)
            .with_context(|| format!("load gameweek {gw} squad"))?;
        println!();
        println!("Gameweek {gw} squad");
        println!("{:<20} {:>4} {:>3} {:>4} {:>4}", "Player", "Mult", "C/V", "Pts", "Eff");
        for row in &squad {
            let flag = if row.is_captain {
                "C"
            } else if row.is_vice_captain {
                "V"
            } else {
                ""
            };
            println!(
                "{:<20} {:>4} {:>3} {:>4} {:>4}",
                row.display_name,
                row.multiplier,
                flag,
                fmt_points(row.raw_points),
                fmt_points(row.effective_points)
            );
        }
    }

    let captains = session.captain_records().context("captain performance")?;
    let tops = session.top_performers().context("top performers")?;
    let comparison = fpl_terminal::comparison::assemble(&captains.rows, &tops.rows);
    println!();
    println!("Captain vs top performer");
    println!("{:>3} {:<16} {:>4} {:<16} {:>4}", "GW", "Captain", "Pts", "Top", "Pts");
    for row in &comparison {
        println!(
            "{:>3} {:<16} {:>4} {:<16} {:>4}",
            row.gameweek_index,
            row.captain_name,
            row.captain_points,
            row.top_performer_name,
            row.top_performer_points
        );
    }
    let skipped = captains.skipped.len() + tops.skipped.len();
    if skipped > 0 {
        println!("Skipped: {skipped}");
        for s in captains.skipped.iter().chain(tops.skipped.iter()).take(8) {
            println!(" - GW{}: {}", s.gameweek, s.reason);
        }
    }

    Ok(())
}

fn fmt_points(points: Option<i32>) -> String {
    points.map(|p| p.to_string()).unwrap_or_else(|| "?".to_string())
}

fn parse_num_arg<T: std::str::FromStr>(name: &str) -> Option<T> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            return value.trim().parse().ok();
        }
        if arg == name {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            return next.trim().parse().ok();
        }
    }
    None
}
