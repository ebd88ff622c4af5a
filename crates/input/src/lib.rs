//! Input mapping: pointer gestures and control changes become [`Action`]s.
//!
//! # Invariants
//! - The viewer consumes actions, never raw window events.
//! - Desktop and headless shells share the same action vocabulary.

pub mod action;
mod pointer;

pub use action::Action;
pub use pointer::{PointerButton, PointerMapper};

pub fn crate_info() -> &'static str {
    "orbitview-input v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("input"));
    }
}
