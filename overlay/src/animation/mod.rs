//! Animation scheduling for the overlay.
//!
//! Each accepted snapshot is one generation: everything started for it holds
//! an [`UpdateScope`] and stops advancing once that scope is cancelled by
//! the next generation. Fades and holds only ever observe cancellation at a
//! suspension point, so a cancelled generation issues no further writes to
//! the stage and two generations are never animating the same field at
//! once.

use std::sync::Arc;
use tokio::time::{Duration, Instant, sleep_until};

use crate::stage::{Field, Stage};

mod rotation;
mod scope;

pub use rotation::{RotationConfig, RotationLoop, RotationPhase};
pub use scope::{Outcome, UpdateScope};

/// Interval between opacity micro-steps while a fade is in flight.
const FRAME_INTERVAL: Duration = Duration::from_millis(25);

pub(crate) trait Interpolate {
    /// `value` must be a float normally varying from `0f32` to `1f32`
    fn interpolate_linear(&self, value: f32) -> f32;
}

impl Interpolate for (f32, f32) {
    fn interpolate_linear(&self, value: f32) -> f32 {
        (self.1 - self.0).mul_add(value, self.0)
    }
}

/// Applies opacity and text transitions to stage elements on behalf of one
/// update generation.
#[derive(Debug, Clone)]
pub struct Animator {
    stage: Arc<dyn Stage>,
}

impl Animator {
    pub fn new(stage: Arc<dyn Stage>) -> Self {
        Self { stage }
    }

    /// Fades `field` from its current opacity to `target` over `duration`.
    ///
    /// The fade advances in fixed micro-steps on absolute deadlines. A step
    /// that resumes after the scope went inactive writes nothing and
    /// schedules nothing further; the call reports [`Outcome::Cancelled`].
    /// A zero `duration` applies the target immediately.
    pub async fn fade_to(
        &self,
        field: Field,
        target: f32,
        duration: Duration,
        scope: &UpdateScope,
    ) -> Outcome {
        if !scope.is_active() {
            return Outcome::Cancelled;
        }
        if duration.is_zero() {
            self.stage.set_opacity(field, target);
            return Outcome::Completed;
        }

        let from = self.stage.opacity(field);
        let frames = (duration.as_millis() / FRAME_INTERVAL.as_millis()).max(1) as u32;
        let start = Instant::now();

        for frame in 1..=frames {
            sleep_until(start + (duration * frame) / frames).await;
            if !scope.is_active() {
                return Outcome::Cancelled;
            }
            let progress = frame as f32 / frames as f32;
            self.stage
                .set_opacity(field, (from, target).interpolate_linear(progress));
        }
        Outcome::Completed
    }

    /// Swaps `field`'s text with a fade-out/fade-in pair.
    ///
    /// Unchanged text is a no-op with zero stage calls. A fully transparent
    /// element gets the new text and full opacity applied directly, with no
    /// animation: in this design a text field is only ever transparent as
    /// the remnant of a crossfade interrupted by cancellation, and the
    /// direct set keeps it from staying invisible across generations.
    /// Otherwise the element fades out over half of `duration`, commits the
    /// text, and fades back in over the other half, consulting the scope
    /// before each fade.
    pub async fn set_text_with_fade(
        &self,
        field: Field,
        text: &str,
        duration: Duration,
        scope: &UpdateScope,
    ) -> Outcome {
        if self.stage.text(field) == text {
            return Outcome::Completed;
        }

        if self.stage.is_hidden(field) {
            self.stage.set_text(field, text);
            self.stage.set_opacity(field, 1.0);
            return Outcome::Completed;
        }

        let half = duration / 2;
        if self.fade_to(field, 0.0, half, scope).await.is_cancelled() {
            return Outcome::Cancelled;
        }
        self.stage.set_text(field, text);
        if !scope.is_active() {
            return Outcome::Cancelled;
        }
        self.fade_to(field, 1.0, half, scope).await
    }
}
