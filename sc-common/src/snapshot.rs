use serde::{Deserialize, Serialize};

/// One timestamped StreamControl payload. Field names on the wire are the
/// camelCase ids StreamControl writes; anything missing from the file
/// defaults so a partially filled layout still parses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StreamSnapshot {
    /// Opaque change marker, only ever compared for equality.
    pub timestamp: String,
    pub match_event: String,
    pub match_player1_name_main: String,
    pub match_player1_name_sub: String,
    pub match_player1_score: String,
    pub match_player2_name_main: String,
    pub match_player2_name_sub: String,
    pub match_player2_score: String,
    pub options_duration_main_language: Option<String>,
    pub options_duration_sub_language: Option<String>,
    pub options_duration_fade: Option<String>,
    pub options_mode_score_visibility: Option<String>,
}

/// StreamControl encodes checkboxes as the string flags `"0"` and `"1"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckBoxValue {
    Unchecked,
    Checked,
}

impl CheckBoxValue {
    /// Parses an optional flag field. Anything other than the two known
    /// values (including a missing field) is `None`.
    pub fn from_flag(flag: Option<&str>) -> Option<Self> {
        match flag {
            Some("0") => Some(Self::Unchecked),
            Some("1") => Some(Self::Checked),
            _ => None,
        }
    }
}
