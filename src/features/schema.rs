//! Feature column schema
//!
//! Training rows and the inference vector are both built from this list, so
//! their column order cannot drift apart.

/// Bumped whenever the column list changes; stored in model snapshots
pub const SCHEMA_VERSION: u32 = 1;

/// Game date, used only for ordering
pub const DATE_FIELD: &str = "GAME_DATE";

/// Win/loss label
pub const LABEL_FIELD: &str = "WL";

/// 1 when team1 played at home
pub const HOME_FIELD: &str = "HOME_GAME";

/// Per-game box-score statistics, in column order
pub const STAT_FIELDS: [&str; 18] = [
    "TEAM1_PTS",
    "TEAM1_FGM",
    "TEAM1_FGA",
    "TEAM1_FG_PCT",
    "TEAM1_FG3M",
    "TEAM1_FG3A",
    "TEAM1_FG3_PCT",
    "TEAM1_FTM",
    "TEAM1_FTA",
    "TEAM1_FT_PCT",
    "TEAM1_OREB",
    "TEAM1_DREB",
    "TEAM1_REB",
    "TEAM1_AST",
    "TEAM1_STL",
    "TEAM1_BLK",
    "TEAM1_TOV",
    "TEAM1_PF",
];

/// Attributes that identify a game rather than describe it; never features
pub const IDENTIFIER_FIELDS: [&str; 7] = [
    "SEASON_ID",
    "TEAM_ID",
    "TEAM_ABBREVIATION",
    "TEAM_NAME",
    "GAME_ID",
    "MATCHUP",
    "OPPONENT_ID",
];

/// Number of averaged statistics
pub const STAT_DIM: usize = STAT_FIELDS.len();

/// Width of a training row and of the inference vector: home flag + stats
pub const FEATURE_DIM: usize = 1 + STAT_DIM;

const _: () = assert!(FEATURE_DIM == STAT_DIM + 1);

/// Ordered names of the model input columns
pub fn feature_columns() -> Vec<&'static str> {
    let mut columns = Vec::with_capacity(FEATURE_DIM);
    columns.push(HOME_FIELD);
    columns.extend_from_slice(&STAT_FIELDS);
    columns
}

/// Column index of a statistic, if it is part of the schema
pub fn stat_index(name: &str) -> Option<usize> {
    STAT_FIELDS.iter().position(|f| *f == name)
}

/// True for attributes that must never become model inputs
pub fn is_excluded(name: &str) -> bool {
    name == DATE_FIELD || name == LABEL_FIELD || IDENTIFIER_FIELDS.contains(&name)
}

/// Attributes the schema accounts for, either as inputs or as known non-inputs
pub fn is_known(name: &str) -> bool {
    is_excluded(name) || name == HOME_FIELD || stat_index(name).is_some()
}
