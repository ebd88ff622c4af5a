use glam::Vec2;

use crate::action::Action;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Turns pointer gestures over the viewport into camera actions.
///
/// Left drag orbits, right drag pans, the wheel zooms. Only one button is
/// tracked at a time; pressing another while dragging is ignored.
#[derive(Debug, Default, Clone)]
pub struct PointerMapper {
    held: Option<PointerButton>,
    last: Option<Vec2>,
}

impl PointerMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn held(&self) -> Option<PointerButton> {
        self.held
    }

    pub fn press(&mut self, button: PointerButton, position: Vec2) {
        if self.held.is_none() {
            self.held = Some(button);
            self.last = Some(position);
        }
    }

    pub fn release(&mut self, button: PointerButton) {
        if self.held == Some(button) {
            self.held = None;
            self.last = None;
        }
    }

    /// Pointer moved to `position`; emits an action while a button is held.
    pub fn moved(&mut self, position: Vec2) -> Action {
        let (Some(button), Some(last)) = (self.held, self.last) else {
            return Action::Noop;
        };
        self.last = Some(position);
        Self::drag(button, position - last)
    }

    /// Map a drag delta for `button` without tracking state.
    pub fn drag(button: PointerButton, delta: Vec2) -> Action {
        if delta == Vec2::ZERO || !delta.is_finite() {
            return Action::Noop;
        }
        match button {
            PointerButton::Primary => Action::Orbit {
                dx: delta.x,
                dy: delta.y,
            },
            PointerButton::Secondary => Action::Pan {
                dx: delta.x,
                dy: delta.y,
            },
            PointerButton::Middle => Action::Noop,
        }
    }

    /// Wheel steps; positive scrolls toward the scene.
    pub fn wheel(steps: f32) -> Action {
        if steps == 0.0 || !steps.is_finite() {
            Action::Noop
        } else {
            Action::Zoom(steps)
        }
    }
}
