mod common;

use std::collections::HashMap;

use common::{ids, squad};
use fpl_terminal::FplError;
use fpl_terminal::api::{Player, Position};
use fpl_terminal::gameweek::normalize_gameweek;
use fpl_terminal::lookup::{PlayerIndex, build_index};

fn roster(count: u32) -> PlayerIndex {
    let players: Vec<Player> = (1..=count)
        .map(|id| Player {
            id,
            display_name: format!("P{id}"),
            position: Position::Midfielder,
            cost_tenths: 50,
            total_points: 0,
            minutes_played: 0,
        })
        .collect();
    build_index(&players)
}

fn points_table(pairs: &[(u32, i32)]) -> HashMap<u32, i32> {
    pairs.iter().copied().collect()
}

#[test]
fn scenario_lookup_index_resolves_and_rejects() {
    let index = build_index(&[Player {
        id: 1,
        display_name: "Salah".to_string(),
        position: Position::Midfielder,
        cost_tenths: 130,
        total_points: 0,
        minutes_played: 0,
    }]);
    assert_eq!(index.name_of(1).unwrap(), "Salah");
    assert_eq!(index.name_of(1).unwrap(), index.name_of(1).unwrap());
    assert_eq!(index.name_of(99), Err(FplError::UnknownPlayer(99)));
}

#[test]
fn normalized_squad_is_ranked_with_one_captain() {
    let index = roster(15);
    let picks = squad(4, &ids(1..=15), Some(7), 2);
    let points = points_table(&[
        (1, 2),
        (2, 6),
        (3, 1),
        (4, 6),
        (5, 0),
        (6, 3),
        (7, 6),
        (8, 12),
        (9, 2),
        (10, 1),
        (11, 2),
        (12, 6),
        (13, 1),
        (14, -1),
    ]);

    let rows = normalize_gameweek(&picks, &index, |pid, _| Ok(points.get(&pid).copied()))
        .expect("normalizes");

    assert_eq!(rows.len(), 15);
    assert_eq!(rows.iter().filter(|r| r.is_captain).count(), 1);
    assert_eq!(rows[0].display_name, "P8");
    // Three players on 6: the captain's doubled score wins, the benched player is last of them.
    assert_eq!(rows[1].player_id, 7);
    assert_eq!(rows[1].effective_points, Some(12));
    assert_eq!(rows[2].player_id, 2);
    assert_eq!(rows[3].player_id, 4);
    assert_eq!(rows[4].player_id, 12);
    assert_eq!(rows[4].effective_points, Some(0));
    // Player 15 has no points for the gameweek.
    let last = rows.last().unwrap();
    assert_eq!(last.player_id, 15);
    assert_eq!(last.raw_points, None);
    assert_eq!(last.effective_points, None);

    for pair in rows.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        match (a.raw_points, b.raw_points) {
            (Some(x), Some(y)) => {
                assert!(x >= y);
                if x == y {
                    assert!(a.effective_points >= b.effective_points);
                }
            }
            (None, Some(_)) => panic!("unknown points sorted before known"),
            _ => {}
        }
    }
}

#[test]
fn missing_captain_is_missing_data() {
    let index = roster(15);
    let picks = squad(3, &ids(1..=15), None, 2);
    let err = normalize_gameweek(&picks, &index, |_, _| Ok(Some(1))).unwrap_err();
    assert!(matches!(err, FplError::MissingData { gameweek: 3, .. }));
}

#[test]
fn two_captains_are_rejected() {
    let index = roster(15);
    let mut picks = squad(3, &ids(1..=15), Some(1), 2);
    picks.picks[1].is_captain = true;
    picks.picks[1].multiplier = 2;
    let err = normalize_gameweek(&picks, &index, |_, _| Ok(Some(1))).unwrap_err();
    assert!(matches!(err, FplError::MalformedResponse { .. }));
}

#[test]
fn captain_multiplier_below_two_is_rejected() {
    let index = roster(15);
    let picks = squad(3, &ids(1..=15), Some(1), 1);
    assert!(normalize_gameweek(&picks, &index, |_, _| Ok(Some(1))).is_err());
}

#[test]
fn upstream_lookup_errors_become_unknown_points() {
    let index = roster(15);
    let picks = squad(2, &ids(1..=15), Some(1), 3);
    let rows = normalize_gameweek(&picks, &index, |pid, gw| {
        if pid == 5 {
            Err(FplError::Upstream {
                url: format!("/element-summary/{pid}/"),
                status: 404,
            })
        } else {
            Ok(Some(i32::from(gw)))
        }
    })
    .expect("non-fatal lookup errors do not abort");

    assert_eq!(rows.len(), 15);
    assert_eq!(rows[0].player_id, 1);
    assert_eq!(rows[0].effective_points, Some(6));
    assert_eq!(rows.last().unwrap().player_id, 5);
    assert_eq!(rows.last().unwrap().raw_points, None);
}

#[test]
fn fatal_lookup_errors_abort_the_gameweek() {
    let index = roster(15);
    let picks = squad(2, &ids(1..=15), Some(1), 2);
    let err = normalize_gameweek(&picks, &index, |_, _| {
        Err(FplError::Transport {
            url: "x".into(),
            attempts: 5,
            message: "timeout".into(),
        })
    })
    .unwrap_err();
    assert!(err.is_fatal());
}

#[test]
fn unknown_player_in_squad_is_reported() {
    let index = roster(14);
    let picks = squad(1, &ids(1..=15), Some(1), 2);
    assert_eq!(
        normalize_gameweek(&picks, &index, |_, _| Ok(Some(1))).unwrap_err(),
        FplError::UnknownPlayer(15)
    );
}
