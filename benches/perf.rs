use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use fpl_terminal::api::{GameweekPicks, SquadPick, parse_bootstrap_json};
use fpl_terminal::gameweek::normalize_gameweek;
use fpl_terminal::lookup::PlayerIndex;
use fpl_terminal::season::top_performers;

fn bootstrap_json(players: u32) -> String {
    let elements = (1..=players)
        .map(|id| {
            format!(
                r#"{{"id":{id},"web_name":"Player {id}","element_type":{},"now_cost":{},"total_points":{},"minutes":{}}}"#,
                id % 4 + 1,
                40 + id % 90,
                id % 150,
                id * 7 % 3000
            )
        })
        .collect::<Vec<_>>()
        .join(",");
    let events = (1..=38)
        .map(|gw| {
            format!(
                r#"{{"id":{gw},"average_entry_score":50,"highest_score":120,"top_element":{gw},"top_element_info":{{"id":{gw},"points":15}}}}"#
            )
        })
        .collect::<Vec<_>>()
        .join(",");
    format!(r#"{{"elements":[{elements}],"events":[{events}]}}"#)
}

fn season_picks() -> Vec<GameweekPicks> {
    (1..=38u8)
        .map(|gw| GameweekPicks {
            gameweek: gw,
            active_chip: None,
            picks: (0..15u32)
                .map(|slot| SquadPick {
                    gameweek_index: gw,
                    player_id: u32::from(gw) * 10 + slot + 1,
                    multiplier: if slot == 0 { 2 } else if slot < 11 { 1 } else { 0 },
                    is_captain: slot == 0,
                    is_vice_captain: slot == 1,
                })
                .collect(),
        })
        .collect()
}

fn fake_points(player_id: u32, gameweek: u8) -> Option<i32> {
    if player_id % 17 == 0 {
        return None;
    }
    Some(((player_id * 31 + u32::from(gameweek)) % 16) as i32 - 1)
}

fn bench_bootstrap_parse(c: &mut Criterion) {
    let raw = bootstrap_json(700);
    c.bench_function("bootstrap_parse", |b| {
        b.iter(|| {
            let data = parse_bootstrap_json(black_box(&raw)).unwrap();
            black_box(data.players.len());
        })
    });
}

fn bench_normalize_season(c: &mut Criterion) {
    let bootstrap = parse_bootstrap_json(&bootstrap_json(700)).unwrap();
    let index = PlayerIndex::build(&bootstrap.players);
    let played = season_picks();
    c.bench_function("normalize_38_gameweeks", |b| {
        b.iter(|| {
            for picks in &played {
                let rows =
                    normalize_gameweek(black_box(picks), &index, |pid, gw| Ok(fake_points(pid, gw)))
                        .unwrap();
                black_box(rows.len());
            }
        })
    });
}

fn bench_top_performers(c: &mut Criterion) {
    let bootstrap = parse_bootstrap_json(&bootstrap_json(700)).unwrap();
    let index = PlayerIndex::build(&bootstrap.players);
    let played = season_picks();
    c.bench_function("top_performers_season", |b| {
        b.iter(|| {
            let table =
                top_performers(black_box(&played), &index, |pid, gw| Ok(fake_points(pid, gw)))
                    .unwrap();
            black_box(table.rows.len());
        })
    });
}

criterion_group!(
    benches,
    bench_bootstrap_parse,
    bench_normalize_season,
    bench_top_performers
);
criterion_main!(benches);
