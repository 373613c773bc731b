use std::collections::HashMap;

use crate::season::{CaptainRecord, TopPerformerRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonRow {
    pub gameweek_index: u8,
    pub captain_name: String,
    pub captain_points: i32,
    pub top_performer_name: String,
    pub top_performer_points: i32,
}

impl ComparisonRow {
    /// Points left on the table by not captaining the top performer.
    pub fn missed_points(&self) -> i32 {
        (self.top_performer_points - self.captain_points).max(0)
    }
}

/// Inner join on gameweek index, ordered by gameweek.
pub fn assemble(captains: &[CaptainRecord], tops: &[TopPerformerRecord]) -> Vec<ComparisonRow> {
    let by_gameweek: HashMap<u8, &TopPerformerRecord> =
        tops.iter().map(|t| (t.gameweek_index, t)).collect();

    let mut rows: Vec<ComparisonRow> = captains
        .iter()
        .filter_map(|cap| {
            let top = by_gameweek.get(&cap.gameweek_index)?;
            Some(ComparisonRow {
                gameweek_index: cap.gameweek_index,
                captain_name: cap.captain_display_name.clone(),
                captain_points: cap.points_scored,
                top_performer_name: top.top_player_display_name.clone(),
                top_performer_points: top.points_scored,
            })
        })
        .collect();
    rows.sort_by_key(|row| row.gameweek_index);
    rows
}
