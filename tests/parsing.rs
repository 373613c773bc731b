mod common;

use common::read_fixture;
use fpl_terminal::FplError;
use fpl_terminal::api::{
    Position, parse_bootstrap_json, parse_element_summary_json, parse_history_json,
    parse_manager_json, parse_picks_json,
};

#[test]
fn parses_bootstrap_fixture() {
    let raw = read_fixture("bootstrap.json");
    let data = parse_bootstrap_json(&raw).expect("fixture should parse");

    // element_type 5 is not a squad position and is dropped.
    assert_eq!(data.players.len(), 5);
    assert!(data.players.iter().all(|p| p.id != 900));

    let salah = &data.players[0];
    assert_eq!(salah.display_name, "Salah");
    assert_eq!(salah.position, Position::Midfielder);
    assert_eq!(salah.cost_tenths, 130);
    assert!((salah.cost() - 13.0).abs() < f64::EPSILON);
    assert_eq!(salah.minutes_played, 180);

    assert_eq!(data.gameweeks.len(), 3);
    assert_eq!(data.gameweeks[0].highest_score, Some(127));
    assert_eq!(data.gameweeks[0].top_scoring_player_id, Some(1));
    assert_eq!(data.gameweeks[0].top_scoring_points, Some(18));
    assert_eq!(data.gameweeks[2].highest_score, None);
    assert!(!data.gameweeks[2].finished);
}

#[test]
fn parses_manager_fixture() {
    let manager = parse_manager_json(&read_fixture("manager.json")).expect("fixture should parse");
    assert_eq!(manager.manager_id, 132645);
    assert_eq!(manager.first_name, "Alex");
    assert_eq!(manager.world_rank, Some(254113));
    assert_eq!(manager.league_memberships.len(), 2);
    assert_eq!(manager.league_memberships[1].league_name, "Office League");
    assert_eq!(manager.league_memberships[1].current_rank, Some(2));
    assert_eq!(manager.league_memberships[1].previous_rank, None);
}

#[test]
fn new_manager_has_no_world_rank() {
    let manager =
        parse_manager_json(&read_fixture("manager_new.json")).expect("fixture should parse");
    assert_eq!(manager.world_rank, None);
    assert!(manager.league_memberships.is_empty());
}

#[test]
fn parses_history_fixture() {
    let rows = parse_history_json(&read_fixture("history.json")).expect("fixture should parse");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].gameweek, 2);
    assert_eq!(rows[1].transfers_cost, 4);
    assert_eq!(rows[1].bank_tenths, 12);
    assert_eq!(rows[1].value_tenths, 1003);
}

#[test]
fn parses_picks_fixture() {
    let picks = parse_picks_json(&read_fixture("picks.json"), 2).expect("fixture should parse");
    assert_eq!(picks.gameweek, 2);
    assert_eq!(picks.picks.len(), 15);
    assert_eq!(picks.active_chip.as_deref(), Some("3xc"));
    assert!(picks.picks.iter().all(|p| p.gameweek_index == 2));

    let captain = picks.captain().expect("one captain");
    assert_eq!(captain.player_id, 1);
    assert_eq!(captain.multiplier, 3);
    assert_eq!(picks.picks.iter().filter(|p| p.is_captain).count(), 1);
    assert!(picks.picks[9].is_vice_captain);
}

#[test]
fn element_summary_sums_double_gameweek() {
    let history = parse_element_summary_json(&read_fixture("element_summary.json"), 1)
        .expect("fixture should parse");
    assert_eq!(history.points_in(1), Some(18));
    assert_eq!(history.points_in(2), Some(15));
    assert_eq!(history.points_in(3), None);
}

#[test]
fn short_squad_is_malformed() {
    let raw = r#"{"active_chip":null,"picks":[{"element":1,"multiplier":2,"is_captain":true,"is_vice_captain":false}]}"#;
    let err = parse_picks_json(raw, 1).unwrap_err();
    assert!(matches!(
        err,
        FplError::MalformedResponse {
            resource: "picks",
            ..
        }
    ));
}

#[test]
fn missing_required_field_fails_fast() {
    let raw = r#"{"elements":[{"id":1,"element_type":3,"now_cost":50,"total_points":1}],"events":[]}"#;
    let err = parse_bootstrap_json(raw).unwrap_err();
    match err {
        FplError::MalformedResponse { resource, reason } => {
            assert_eq!(resource, "bootstrap-static");
            assert!(reason.contains("web_name"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn out_of_range_multiplier_is_malformed() {
    let raw = common::picks_json(&common::ids(1..=15), 1, 2, 4);
    assert!(matches!(
        parse_picks_json(&raw, 1),
        Err(FplError::MalformedResponse { .. })
    ));
}
