//! Pointer, pan and zoom state, and the cross-chart shared plot state.

pub mod plot_state;
pub mod zoom;

use serde::{Deserialize, Serialize};

pub use plot_state::{
    PlotState, PlotStateChanges, PlotStateUpdate, SharedPlotState, SubscriptionId,
};
pub use zoom::{ZoomBehavior, ZoomTransform, clamp_pan_translate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InteractionMode {
    Idle,
    Panning,
}

/// Per-chart pointer and drag tracking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionState {
    mode: InteractionMode,
    pointer: Option<(f64, f64)>,
    pan_last_x: f64,
}

impl Default for InteractionState {
    fn default() -> Self {
        Self {
            mode: InteractionMode::Idle,
            pointer: None,
            pan_last_x: 0.0,
        }
    }
}

impl InteractionState {
    #[must_use]
    pub fn mode(self) -> InteractionMode {
        self.mode
    }

    /// Last pointer position inside the plot frame, if the pointer is over it.
    #[must_use]
    pub fn pointer(self) -> Option<(f64, f64)> {
        self.pointer
    }

    pub fn on_pointer_move(&mut self, x: f64, y: f64) {
        self.pointer = Some((x, y));
    }

    pub fn on_pointer_leave(&mut self) {
        self.pointer = None;
    }

    pub fn on_pan_start(&mut self, x: f64) {
        self.mode = InteractionMode::Panning;
        self.pan_last_x = x;
    }

    /// Returns the horizontal delta since the previous pan position.
    pub fn on_pan_move(&mut self, x: f64) -> Option<f64> {
        if self.mode != InteractionMode::Panning {
            return None;
        }
        let delta = x - self.pan_last_x;
        self.pan_last_x = x;
        Some(delta)
    }

    pub fn on_pan_end(&mut self) {
        self.mode = InteractionMode::Idle;
    }
}
