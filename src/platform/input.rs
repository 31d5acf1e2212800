//! Pointer and key input
//!
//! Drags move a lateral target by `delta_px * sensitivity`, clamped to the
//! control bounds. Jump is edge-triggered: holding the key jumps once.

use crate::sim::TickInput;

/// Pointer drag tracker
#[derive(Debug, Clone)]
pub struct PointerDrag {
    sensitivity: f32,
    bounds: f32,
    target_x: f32,
    last_px: Option<f32>,
}

impl PointerDrag {
    pub fn new(sensitivity: f32, bounds: f32) -> Self {
        Self {
            sensitivity,
            bounds,
            target_x: 0.0,
            last_px: None,
        }
    }

    pub fn press(&mut self, px: f32) {
        self.last_px = Some(px);
    }

    /// Pointer moved; only drags (button held) move the target
    pub fn motion(&mut self, px: f32) {
        let Some(last) = self.last_px else {
            return;
        };
        self.target_x = (self.target_x + (px - last) * self.sensitivity).clamp(-self.bounds, self.bounds);
        self.last_px = Some(px);
    }

    pub fn release(&mut self) {
        self.last_px = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.last_px.is_some()
    }

    pub fn sensitivity(&self) -> f32 {
        self.sensitivity
    }

    pub fn target_x(&self) -> f32 {
        self.target_x
    }

    /// Back to the centre line (restart)
    pub fn reset(&mut self) {
        self.target_x = 0.0;
        self.last_px = None;
    }
}

/// Collected input between two frames
#[derive(Debug, Clone)]
pub struct InputState {
    pub drag: PointerDrag,
    jump_held: bool,
    jump_pending: bool,
    pause_pending: bool,
}

impl InputState {
    pub fn new(sensitivity: f32, bounds: f32) -> Self {
        Self {
            drag: PointerDrag::new(sensitivity, bounds),
            jump_held: false,
            jump_pending: false,
            pause_pending: false,
        }
    }

    pub fn jump_key(&mut self, down: bool) {
        if down && !self.jump_held {
            self.jump_pending = true;
        }
        self.jump_held = down;
    }

    pub fn pause_key(&mut self) {
        self.pause_pending = true;
    }

    /// Build the tick input and consume one-shot triggers
    pub fn take_tick_input(&mut self) -> TickInput {
        let input = TickInput {
            target_x: Some(self.drag.target_x()),
            jump: self.jump_pending,
            pause: self.pause_pending,
        };
        self.jump_pending = false;
        self.pause_pending = false;
        input
    }
}
