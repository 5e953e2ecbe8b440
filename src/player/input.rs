//! Keyboard bindings for the player, with a legacy fallback source.
//!
//! The primary bindings always win. The legacy bindings are only consulted
//! when the primary source reports a neutral axis (or no jump press), which
//! means a held legacy key can never cancel a primary one.

use crate::settings::{ControlsSettings, Settings};
use bevy::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBindings {
    pub left: KeyCode,
    pub right: KeyCode,
    pub jump: KeyCode,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self { left: KeyCode::KeyA, right: KeyCode::KeyD, jump: KeyCode::KeyW }
    }
}

/// Fallback bindings; any action may be unbound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LegacyBindings {
    pub left: Option<KeyCode>,
    pub right: Option<KeyCode>,
    pub jump: Option<KeyCode>,
}

#[derive(Resource, Debug, Clone, Default, PartialEq, Eq)]
pub struct InputBindings {
    pub primary: KeyBindings,
    pub legacy: LegacyBindings,
}

impl InputBindings {
    #[must_use]
    pub fn from_controls(controls: &ControlsSettings) -> Self {
        let defaults = KeyBindings::default();
        Self {
            primary: KeyBindings {
                left: controls.key("left", defaults.left),
                right: controls.key("right", defaults.right),
                jump: controls.key("jump", defaults.jump),
            },
            legacy: LegacyBindings {
                left: controls.legacy_key("left"),
                right: controls.legacy_key("right"),
                jump: controls.legacy_key("jump"),
            },
        }
    }

    /// Horizontal axis in {-1, 0, 1}.
    ///
    /// On the primary source right overrides left when both are held. On the
    /// legacy source left is checked first.
    #[must_use]
    pub fn horizontal_axis(&self, kb: &ButtonInput<KeyCode>) -> f32 {
        let mut axis = 0.0;
        if kb.pressed(self.primary.left) {
            axis = -1.0;
        }
        if kb.pressed(self.primary.right) {
            axis = 1.0;
        }
        if axis != 0.0 {
            return axis;
        }

        let held = |key: Option<KeyCode>| key.is_some_and(|k| kb.pressed(k));
        if held(self.legacy.left) {
            -1.0
        } else if held(self.legacy.right) {
            1.0
        } else {
            0.0
        }
    }

    /// `true` on the frame a jump key goes down. Holding the key does not
    /// repeat the request.
    #[must_use]
    pub fn jump_requested(&self, kb: &ButtonInput<KeyCode>) -> bool {
        kb.just_pressed(self.primary.jump)
            || self.legacy.jump.is_some_and(|k| kb.just_pressed(k))
    }
}

/// Rebuild `InputBindings` whenever the settings resource changes.
#[allow(clippy::needless_pass_by_value)]
pub fn sync_input_bindings(settings: Res<Settings>, mut bindings: ResMut<InputBindings>) {
    if settings.is_changed() {
        let next = InputBindings::from_controls(&settings.controls);
        if *bindings != next {
            *bindings = next;
        }
    }
}
