use borough_lens_protocol::{SlotStyle, StyleParams};
use serde::{Deserialize, Serialize};

use crate::config::{BreakoutConfig, StagePolicy};
use crate::model::Stage;
use crate::scroll::progress::clamp01;

const SLOT_STAGGER: f64 = 0.05;
const SLOT_TRAVEL_PX: f64 = 40.0;

/// Quintic ease-in-out.
pub fn ease_in_out_quint(t: f64) -> f64 {
    let t = clamp01(t);
    if t < 0.5 {
        16.0 * t.powi(5)
    } else {
        1.0 - (-2.0 * t + 2.0).powi(5) / 2.0
    }
}

/// Output of the classifier for one progress value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageState {
    pub stage: Stage,
    /// Raw transition value in [0,1] before easing.
    pub transition: f64,
    pub eased: f64,
}

impl StageState {
    pub fn style(&self) -> StyleParams {
        StyleParams::from_eased(self.eased)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageClassifier {
    pub policy: StagePolicy,
    pub start: f64,
    pub settle: f64,
    pub exit: f64,
}

impl StageClassifier {
    pub fn from_config(config: &BreakoutConfig) -> Self {
        Self {
            policy: config.policy,
            start: config.start,
            settle: config.settle,
            exit: config.exit,
        }
    }

    pub fn classify(&self, progress: f64) -> StageState {
        let p = clamp01(progress);
        let (stage, transition) = if p < self.start {
            (Stage::Inactive, 0.0)
        } else if p < self.exit {
            let t = match self.policy {
                StagePolicy::Discrete => 1.0,
                StagePolicy::Continuous => clamp01((p - self.start) / (self.settle - self.start)),
            };
            (Stage::Active, t)
        } else {
            let t = match self.policy {
                StagePolicy::Discrete => 0.0,
                StagePolicy::Continuous if self.exit < 1.0 => {
                    1.0 - clamp01((p - self.exit) / (1.0 - self.exit))
                }
                StagePolicy::Continuous => 0.0,
            };
            (Stage::Exiting, t)
        };
        StageState {
            stage,
            transition,
            eased: ease_in_out_quint(transition),
        }
    }
}

/// Staggered entrance for `count` slots: slot `i` starts `0.05 * i` later.
pub fn slot_styles(transition: f64, count: usize) -> Vec<SlotStyle> {
    (0..count)
        .map(|i| {
            let delay = i as f64 * SLOT_STAGGER;
            let local = if delay >= 1.0 {
                0.0
            } else {
                clamp01((transition - delay) / (1.0 - delay))
            };
            let eased = ease_in_out_quint(local);
            SlotStyle {
                offset_y: (1.0 - eased) * SLOT_TRAVEL_PX,
                opacity: eased,
            }
        })
        .collect()
}
