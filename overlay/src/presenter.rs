use log::debug;
use sc_common::{
    config::Durations,
    snapshot::{CheckBoxValue, StreamSnapshot},
};
use std::sync::Arc;
use tokio::{sync::Mutex, task, time::Duration};

use crate::{
    animation::{Animator, RotationConfig, RotationLoop, RotationPhase, UpdateScope},
    stage::{Field, Stage},
};

/// Whether the score column is part of the current layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreVisibility {
    Visible,
    Hidden,
}

impl ScoreVisibility {
    /// The layout a snapshot asks for. Only an explicit checked flag keeps
    /// the score column; a missing or malformed flag hides it.
    fn requested(snapshot: &StreamSnapshot) -> Self {
        match CheckBoxValue::from_flag(snapshot.options_mode_score_visibility.as_deref()) {
            Some(CheckBoxValue::Checked) => Self::Visible,
            _ => Self::Hidden,
        }
    }
}

/// Owns the animation state of the overlay: the current update generation
/// and its scope, the effective durations, and the score-visibility layout
/// mode. Driven only from the poll loop.
pub struct Presenter {
    stage: Arc<dyn Stage>,
    animator: Animator,
    durations: Durations,
    generation: u64,
    scope: Option<UpdateScope>,
    score_visibility: ScoreVisibility,
    layout_lock: Arc<Mutex<()>>,
}

impl Presenter {
    pub fn new(stage: Arc<dyn Stage>, durations: Durations) -> Self {
        Self {
            animator: Animator::new(stage.clone()),
            stage,
            durations,
            generation: 0,
            scope: None,
            // The static layout starts with the score column shown.
            score_visibility: ScoreVisibility::Visible,
            layout_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Runs the one-time entrance reveal, then applies the first snapshot.
    pub async fn initialize(&mut self, snapshot: &StreamSnapshot) {
        self.durations.apply_overrides(snapshot);

        // The entrance is not tied to any update generation; its scope is
        // never cancelled.
        let entrance = UpdateScope::new(self.generation);
        self.stage.set_visible(Field::Header, true);
        let _ = self
            .animator
            .fade_to(Field::Header, 1.0, self.fade(), &entrance)
            .await;

        self.update(snapshot);
    }

    /// Applies a fresh snapshot: cancels everything started for the previous
    /// one, then restarts the static fades and the name rotations under a
    /// new scope. The cancel happens before any new task is spawned, so two
    /// generations never animate the same field concurrently.
    pub fn update(&mut self, snapshot: &StreamSnapshot) {
        self.durations.apply_overrides(snapshot);

        let scope = self.next_scope();
        debug!(
            "Applying snapshot {:?} as generation {}",
            snapshot.timestamp,
            scope.generation()
        );

        let fade = self.fade();
        let statics = [
            (Field::Event, snapshot.match_event.clone()),
            (Field::Player1Score, snapshot.match_player1_score.clone()),
            (Field::Player2Score, snapshot.match_player2_score.clone()),
        ];
        for (field, text) in statics {
            let animator = self.animator.clone();
            let scope = scope.clone();
            task::spawn(async move {
                let _ = animator.set_text_with_fade(field, &text, fade, &scope).await;
            });
        }

        let rotations = [
            (
                Field::Player1Name,
                &snapshot.match_player1_name_main,
                &snapshot.match_player1_name_sub,
            ),
            (
                Field::Player2Name,
                &snapshot.match_player2_name_main,
                &snapshot.match_player2_name_sub,
            ),
        ];
        for (field, main, sub) in rotations {
            let config = RotationConfig {
                main_text: main.clone(),
                sub_text: sub.clone(),
                main_duration: Duration::from_millis(self.durations.main_language),
                sub_duration: Duration::from_millis(self.durations.sub_language),
                fade_duration: fade,
            };
            let rotation = RotationLoop::new(self.animator.clone(), field, config, scope.clone());
            task::spawn(rotation.run(RotationPhase::MainVisible));
        }

        self.set_mode(snapshot);
    }

    fn fade(&self) -> Duration {
        Duration::from_millis(self.durations.fade)
    }

    fn next_scope(&mut self) -> UpdateScope {
        if let Some(scope) = self.scope.take() {
            scope.cancel();
        }
        self.generation += 1;
        let scope = UpdateScope::new(self.generation);
        self.scope = Some(scope.clone());
        scope
    }

    /// Applies the requested score-visibility layout. The crossfade is
    /// deliberately detached from the update scope: layout is global state,
    /// and a toggle that has started runs to completion even if further
    /// updates arrive. Toggles serialize among themselves through the
    /// layout lock.
    fn set_mode(&mut self, snapshot: &StreamSnapshot) {
        let requested = ScoreVisibility::requested(snapshot);
        if requested == self.score_visibility {
            return;
        }
        self.score_visibility = requested;
        debug!("Switching score visibility to {requested:?}");

        let stage = self.stage.clone();
        let animator = self.animator.clone();
        let lock = self.layout_lock.clone();
        let half = self.fade() / 2;
        let generation = self.generation;
        task::spawn(async move {
            let _guard = lock.lock().await;
            let scope = UpdateScope::new(generation);

            let background = animator.fade_to(Field::BackgroundLayer, 0.0, half, &scope);
            let text = animator.fade_to(Field::TextLayer, 0.0, half, &scope);
            let _ = tokio::join!(background, text);

            apply_layout(stage.as_ref(), requested);

            let background = animator.fade_to(Field::BackgroundLayer, 1.0, half, &scope);
            let text = animator.fade_to(Field::TextLayer, 1.0, half, &scope);
            let _ = tokio::join!(background, text);
        });
    }
}

impl Drop for Presenter {
    fn drop(&mut self) {
        if let Some(scope) = self.scope.take() {
            scope.cancel();
        }
    }
}

fn apply_layout(stage: &dyn Stage, visibility: ScoreVisibility) {
    match visibility {
        ScoreVisibility::Visible => {
            stage.set_visible(Field::NameBackground, true);
            stage.set_visible(Field::NameBackgroundWide, false);
            stage.set_visible(Field::ScoreBackground, true);

            stage.switch_class(Field::Player1Name, "name-text-wide", "name-text");
            stage.switch_class(Field::Player2Name, "name-text-wide", "name-text");

            stage.set_visible(Field::Player1ScoreBox, true);
            stage.set_visible(Field::Player2ScoreBox, true);
        }
        ScoreVisibility::Hidden => {
            stage.set_visible(Field::NameBackground, false);
            stage.set_visible(Field::NameBackgroundWide, true);
            stage.set_visible(Field::ScoreBackground, false);

            stage.switch_class(Field::Player1Name, "name-text", "name-text-wide");
            stage.switch_class(Field::Player2Name, "name-text", "name-text-wide");

            stage.set_visible(Field::Player1ScoreBox, false);
            stage.set_visible(Field::Player2ScoreBox, false);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::stage::testing::RecordingStage;
    use tokio::time::{Duration, Instant, sleep};

    fn durations() -> Durations {
        Durations {
            main_language: 1000,
            sub_language: 2000,
            fade: 200,
        }
    }

    fn snapshot(timestamp: &str) -> StreamSnapshot {
        StreamSnapshot {
            timestamp: timestamp.to_string(),
            match_event: "Winners Finals".to_string(),
            match_player1_name_main: "RED ARCUEID".to_string(),
            match_player1_name_sub: "赤アルクェイド".to_string(),
            match_player1_score: "2".to_string(),
            match_player2_name_main: "KOHAKU".to_string(),
            match_player2_name_sub: "琥珀".to_string(),
            match_player2_score: "1".to_string(),
            options_mode_score_visibility: Some("1".to_string()),
            ..Default::default()
        }
    }

    fn presenter(stage: &RecordingStage) -> Presenter {
        Presenter::new(Arc::new(stage.clone()), durations())
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_populates_all_fields() {
        let stage = RecordingStage::new();
        let mut presenter = presenter(&stage);

        presenter.update(&snapshot("1"));
        sleep(Duration::from_millis(300)).await;

        assert_eq!(stage.text(Field::Event), "Winners Finals");
        assert_eq!(stage.text(Field::Player1Name), "RED ARCUEID");
        assert_eq!(stage.text(Field::Player2Name), "KOHAKU");
        assert_eq!(stage.text(Field::Player1Score), "2");
        assert_eq!(stage.text(Field::Player2Score), "1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_identical_update_causes_no_transitions() {
        let stage = RecordingStage::new();
        let mut presenter = presenter(&stage);

        presenter.update(&snapshot("1"));
        sleep(Duration::from_millis(300)).await;
        let opacity_sets = stage.opacity_set_count();
        let commits = stage.commit_count();

        // Same field values under a fresh timestamp: every swap no-ops and
        // the restarted rotations pick up from the already-shown main text.
        presenter.update(&snapshot("2"));
        sleep(Duration::from_millis(300)).await;
        assert_eq!(stage.opacity_set_count(), opacity_sets);
        assert_eq!(stage.commit_count(), commits);
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_cancels_previous_generation() {
        let stage = RecordingStage::new();
        let mut presenter = presenter(&stage);

        presenter.update(&snapshot("1"));
        sleep(Duration::from_millis(300)).await;

        let mut changed = snapshot("2");
        changed.match_player1_name_main = "NECO-ARC".to_string();
        changed.match_player1_name_sub = "ネコアルク".to_string();
        presenter.update(&changed);
        let cutover = Instant::now();

        sleep(Duration::from_millis(8000)).await;

        let stale: Vec<_> = stage
            .commits(Field::Player1Name)
            .into_iter()
            .filter(|(_, at)| *at > cutover)
            .map(|(text, _)| text)
            .collect();
        assert!(!stale.is_empty());
        assert!(
            stale
                .iter()
                .all(|text| text == "NECO-ARC" || text == "ネコアルク"),
            "{stale:?}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_mode_toggle_fires_once_per_change() {
        let stage = RecordingStage::new();
        let mut presenter = presenter(&stage);

        // Matches the starting layout: no toggle.
        presenter.update(&snapshot("1"));
        sleep(Duration::from_millis(300)).await;
        assert_eq!(stage.class_switch_count(), 0);

        let mut hidden = snapshot("2");
        hidden.options_mode_score_visibility = Some("0".to_string());
        presenter.update(&hidden);
        sleep(Duration::from_millis(300)).await;

        assert_eq!(stage.class_switch_count(), 2);
        assert!(stage.has_class(Field::Player1Name, "name-text-wide"));
        assert!(stage.has_class(Field::Player2Name, "name-text-wide"));
        assert!(!stage.is_visible(Field::Player1ScoreBox));
        assert!(!stage.is_visible(Field::ScoreBackground));
        assert!(stage.is_visible(Field::NameBackgroundWide));
        assert_eq!(stage.opacity(Field::BackgroundLayer), 1.0);
        assert_eq!(stage.opacity(Field::TextLayer), 1.0);

        // Same flag again: a no-op for the layout.
        let mut still_hidden = snapshot("3");
        still_hidden.options_mode_score_visibility = Some("0".to_string());
        presenter.update(&still_hidden);
        sleep(Duration::from_millis(300)).await;
        assert_eq!(stage.class_switch_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mode_toggle_crossfades_layers() {
        let stage = RecordingStage::new();
        let mut presenter = presenter(&stage);
        let start = Instant::now();

        let mut hidden = snapshot("1");
        hidden.options_mode_score_visibility = Some("0".to_string());
        presenter.update(&hidden);
        sleep(Duration::from_millis(300)).await;

        // Half the fade down, layout swap, half the fade back up.
        let sets = stage.opacity_sets(Field::BackgroundLayer);
        assert_eq!(sets.first().map(|(_, at)| *at), Some(start + Duration::from_millis(25)));
        assert_eq!(sets.last().unwrap().0, 1.0);
        let low = sets.iter().map(|(v, _)| *v).fold(f32::INFINITY, f32::min);
        assert_eq!(low, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_duration_overrides_take_effect() {
        let stage = RecordingStage::new();
        let mut presenter = presenter(&stage);

        let mut snap = snapshot("1");
        snap.options_duration_fade = Some("400".to_string());
        presenter.update(&snap);
        sleep(Duration::from_millis(500)).await;

        // The crossfade now spans 400 ms, so the commit lands at 200.
        let commits = stage.commits(Field::Event);
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].1.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_initialize_reveals_header_then_updates() {
        let stage = RecordingStage::new();
        stage.seed(Field::Header, "", 0.0);
        let mut presenter = presenter(&stage);
        let start = Instant::now();

        presenter.initialize(&snapshot("1")).await;

        // The entrance fade ran to completion before the first update.
        assert_eq!(stage.opacity(Field::Header), 1.0);
        assert_eq!(Instant::now() - start, Duration::from_millis(200));

        sleep(Duration::from_millis(300)).await;
        assert_eq!(stage.text(Field::Event), "Winners Finals");
    }
}
