use tokio::time::{Duration, Instant};

use super::{Animator, UpdateScope};
use crate::stage::Field;

/// Texts and timing for one rotating field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationConfig {
    pub main_text: String,
    pub sub_text: String,
    pub main_duration: Duration,
    pub sub_duration: Duration,
    pub fade_duration: Duration,
}

/// Which of the two language texts a rotating field is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationPhase {
    MainVisible,
    SubVisible,
}

impl RotationPhase {
    fn next(self) -> Self {
        match self {
            Self::MainVisible => Self::SubVisible,
            Self::SubVisible => Self::MainVisible,
        }
    }
}

/// Perpetual two-phase loop alternating a field between its main and sub
/// language text. There is no terminal state: the loop runs until its scope
/// is cancelled, and cancellation is a structural loop exit, never an
/// unwind.
#[derive(Debug)]
pub struct RotationLoop {
    animator: Animator,
    field: Field,
    config: RotationConfig,
    scope: UpdateScope,
}

impl RotationLoop {
    pub fn new(
        animator: Animator,
        field: Field,
        config: RotationConfig,
        scope: UpdateScope,
    ) -> Self {
        Self {
            animator,
            field,
            config,
            scope,
        }
    }

    /// Drives the rotation, starting with `first`.
    ///
    /// Each phase fixes its deadline before the swap starts, so a phase
    /// always spans `fade_duration` plus its hold. Equal main and sub text
    /// makes every swap a no-op but keeps the full period, which
    /// downstream timing (and anyone watching the overlay breathe) relies
    /// on.
    pub async fn run(self, first: RotationPhase) {
        let mut phase = first;
        loop {
            if !self.scope.is_active() {
                break;
            }

            let (text, hold) = match phase {
                RotationPhase::MainVisible => {
                    (&self.config.main_text, self.config.main_duration)
                }
                RotationPhase::SubVisible => (&self.config.sub_text, self.config.sub_duration),
            };
            let deadline = Instant::now() + self.config.fade_duration + hold;

            if self
                .animator
                .set_text_with_fade(self.field, text, self.config.fade_duration, &self.scope)
                .await
                .is_cancelled()
            {
                break;
            }
            if self.scope.hold_until(deadline).await.is_cancelled() {
                break;
            }
            phase = phase.next();
        }
    }
}
