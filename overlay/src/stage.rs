use std::{
    collections::HashMap,
    fmt::Debug,
    sync::{Arc, Mutex},
};

/// On-screen elements addressed by the presenter and the draw loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Container for the whole overlay, faded in once at startup.
    Header,
    Event,
    Player1Name,
    Player2Name,
    Player1Score,
    Player2Score,
    /// Boxes around the score digits, hidden in score-free layouts.
    Player1ScoreBox,
    Player2ScoreBox,
    NameBackground,
    NameBackgroundWide,
    ScoreBackground,
    /// Group layers crossfaded as a unit by the layout toggle.
    BackgroundLayer,
    TextLayer,
}

/// The narrow contract the animation subsystem needs from a rendering
/// surface. Everything the core does goes through these calls, so tests can
/// substitute a recording surface and the draw loop can be swapped without
/// touching the scheduling code.
pub trait Stage: Send + Sync + Debug {
    fn set_text(&self, field: Field, text: &str);
    fn text(&self, field: Field) -> String;

    fn set_opacity(&self, field: Field, opacity: f32);
    fn opacity(&self, field: Field) -> f32;

    fn switch_class(&self, field: Field, from: &str, to: &str);
    fn has_class(&self, field: Field, class: &str) -> bool;

    fn set_visible(&self, field: Field, visible: bool);
    fn is_visible(&self, field: Field) -> bool;

    fn is_hidden(&self, field: Field) -> bool {
        self.opacity(field) == 0.0
    }
}

#[derive(Debug, Clone)]
struct ElementState {
    text: String,
    opacity: f32,
    visible: bool,
    classes: Vec<String>,
}

impl Default for ElementState {
    fn default() -> Self {
        Self {
            text: String::new(),
            opacity: 1.0,
            visible: true,
            classes: Vec::new(),
        }
    }
}

/// Element store shared between the animation tasks on the polling runtime
/// and the macroquad draw loop on the main thread.
#[derive(Debug, Clone, Default)]
pub struct SharedStage {
    elements: Arc<Mutex<HashMap<Field, ElementState>>>,
}

impl SharedStage {
    pub fn new() -> Self {
        let stage = Self::default();
        // The header is revealed by the entrance fade.
        stage.mutate(Field::Header, |el| el.opacity = 0.0);
        stage.mutate(Field::Player1Name, |el| {
            el.classes.push("name-text".to_string())
        });
        stage.mutate(Field::Player2Name, |el| {
            el.classes.push("name-text".to_string())
        });
        stage
    }

    fn mutate(&self, field: Field, f: impl FnOnce(&mut ElementState)) {
        let mut elements = self.elements.lock().unwrap();
        f(elements.entry(field).or_default());
    }

    fn read<T>(&self, field: Field, f: impl FnOnce(&ElementState) -> T) -> T {
        let elements = self.elements.lock().unwrap();
        match elements.get(&field) {
            Some(el) => f(el),
            None => f(&ElementState::default()),
        }
    }
}

impl Stage for SharedStage {
    fn set_text(&self, field: Field, text: &str) {
        self.mutate(field, |el| el.text = text.to_string());
    }

    fn text(&self, field: Field) -> String {
        self.read(field, |el| el.text.clone())
    }

    fn set_opacity(&self, field: Field, opacity: f32) {
        self.mutate(field, |el| el.opacity = opacity.clamp(0.0, 1.0));
    }

    fn opacity(&self, field: Field) -> f32 {
        self.read(field, |el| el.opacity)
    }

    fn switch_class(&self, field: Field, from: &str, to: &str) {
        self.mutate(field, |el| {
            el.classes.retain(|c| c != from);
            if !el.classes.iter().any(|c| c == to) {
                el.classes.push(to.to_string());
            }
        });
    }

    fn has_class(&self, field: Field, class: &str) -> bool {
        self.read(field, |el| el.classes.iter().any(|c| c == class))
    }

    fn set_visible(&self, field: Field, visible: bool) {
        self.mutate(field, |el| el.visible = visible);
    }

    fn is_visible(&self, field: Field) -> bool {
        self.read(field, |el| el.visible)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use tokio::time::Instant;

    #[derive(Debug, Default)]
    struct Recording {
        elements: HashMap<Field, ElementState>,
        commits: Vec<(Field, String, Instant)>,
        opacity_sets: Vec<(Field, f32, Instant)>,
        class_switches: Vec<(Field, String, String)>,
    }

    /// Stage double that logs every mutation with its virtual timestamp.
    #[derive(Debug, Clone, Default)]
    pub(crate) struct RecordingStage {
        inner: Arc<Mutex<Recording>>,
    }

    impl RecordingStage {
        pub fn new() -> Self {
            Self::default()
        }

        /// Puts an element into a known starting state without recording.
        pub fn seed(&self, field: Field, text: &str, opacity: f32) {
            let mut inner = self.inner.lock().unwrap();
            let el = inner.elements.entry(field).or_default();
            el.text = text.to_string();
            el.opacity = opacity;
        }

        /// Text commits for one field, in order, with virtual timestamps.
        pub fn commits(&self, field: Field) -> Vec<(String, Instant)> {
            self.inner
                .lock()
                .unwrap()
                .commits
                .iter()
                .filter(|(f, _, _)| *f == field)
                .map(|(_, text, at)| (text.clone(), *at))
                .collect()
        }

        pub fn commit_count(&self) -> usize {
            self.inner.lock().unwrap().commits.len()
        }

        pub fn opacity_set_count(&self) -> usize {
            self.inner.lock().unwrap().opacity_sets.len()
        }

        /// Opacity writes for one field, in order, with virtual timestamps.
        pub fn opacity_sets(&self, field: Field) -> Vec<(f32, Instant)> {
            self.inner
                .lock()
                .unwrap()
                .opacity_sets
                .iter()
                .filter(|(f, _, _)| *f == field)
                .map(|(_, value, at)| (*value, *at))
                .collect()
        }

        pub fn class_switch_count(&self) -> usize {
            self.inner.lock().unwrap().class_switches.len()
        }

        fn mutate(&self, field: Field, f: impl FnOnce(&mut ElementState)) {
            let mut inner = self.inner.lock().unwrap();
            f(inner.elements.entry(field).or_default());
        }

        fn read<T>(&self, field: Field, f: impl FnOnce(&ElementState) -> T) -> T {
            let inner = self.inner.lock().unwrap();
            match inner.elements.get(&field) {
                Some(el) => f(el),
                None => f(&ElementState::default()),
            }
        }
    }

    impl Stage for RecordingStage {
        fn set_text(&self, field: Field, text: &str) {
            let mut inner = self.inner.lock().unwrap();
            inner.elements.entry(field).or_default().text = text.to_string();
            inner.commits.push((field, text.to_string(), Instant::now()));
        }

        fn text(&self, field: Field) -> String {
            self.read(field, |el| el.text.clone())
        }

        fn set_opacity(&self, field: Field, opacity: f32) {
            let mut inner = self.inner.lock().unwrap();
            inner.elements.entry(field).or_default().opacity = opacity;
            inner.opacity_sets.push((field, opacity, Instant::now()));
        }

        fn opacity(&self, field: Field) -> f32 {
            self.read(field, |el| el.opacity)
        }

        fn switch_class(&self, field: Field, from: &str, to: &str) {
            let mut inner = self.inner.lock().unwrap();
            let el = inner.elements.entry(field).or_default();
            el.classes.retain(|c| c != from);
            el.classes.push(to.to_string());
            inner
                .class_switches
                .push((field, from.to_string(), to.to_string()));
        }

        fn has_class(&self, field: Field, class: &str) -> bool {
            self.read(field, |el| el.classes.iter().any(|c| c == class))
        }

        fn set_visible(&self, field: Field, visible: bool) {
            self.mutate(field, |el| el.visible = visible);
        }

        fn is_visible(&self, field: Field) -> bool {
            self.read(field, |el| el.visible)
        }
    }
}
