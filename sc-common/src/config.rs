use log::debug;
use serde::{Deserialize, Serialize};

use crate::snapshot::StreamSnapshot;

/// Timing settings for the overlay animations, all in milliseconds.
///
/// `main_language` and `sub_language` are the hold times of the two name
/// rotation phases; `fade` is the full length of one text crossfade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Durations {
    pub main_language: u64,
    pub sub_language: u64,
    pub fade: u64,
}

impl Default for Durations {
    fn default() -> Self {
        Self {
            main_language: 10_000,
            sub_language: 5_000,
            fade: 1_000,
        }
    }
}

impl Durations {
    /// Folds a snapshot's duration overrides into the current settings.
    ///
    /// An override wins only when it is present, non-empty, and parses as an
    /// integer; anything else keeps the previous value.
    pub fn apply_overrides(&mut self, snapshot: &StreamSnapshot) {
        apply_override(
            &mut self.main_language,
            snapshot.options_duration_main_language.as_deref(),
        );
        apply_override(
            &mut self.sub_language,
            snapshot.options_duration_sub_language.as_deref(),
        );
        apply_override(&mut self.fade, snapshot.options_duration_fade.as_deref());
    }
}

fn apply_override(value: &mut u64, new: Option<&str>) {
    let Some(new) = new else {
        return;
    };
    if new.is_empty() {
        return;
    }
    match new.parse() {
        Ok(parsed) => *value = parsed,
        Err(_) => debug!("Ignoring unparseable duration override {new:?}"),
    }
}
