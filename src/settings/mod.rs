//! Settings, types and defaults.
//!
//! Settings are stored as a RON file under `data/settings/` and are hot-reloadable
//! using the RON watcher utilities (see `ron::setup_ron_watcher`). Every field
//! carries a serde default so a settings file only needs the values it changes.
use avian2d::prelude::PhysicsLayer;
use bevy::prelude::{KeyCode, Resource, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::physics::GameLayer;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphicsSettings {
    #[serde(default = "GraphicsSettings::default_vsync")]
    pub vsync: bool, // Cap FPS to the display refresh rate.
}

impl GraphicsSettings {
    fn default_vsync() -> bool { true }
}

impl Default for GraphicsSettings {
    fn default() -> Self {
        Self { vsync: Self::default_vsync() }
    }
}

/// Audio related settings for the game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioSettings {
    #[serde(default = "AudioSettings::default_master")]
    pub master_volume: f32, // Master output volume
    #[serde(default = "AudioSettings::default_effects")]
    pub effects_volume: f32, // Sound effects volume multiplier
}

impl AudioSettings {
    fn default_master() -> f32 { 1.0 }
    fn default_effects() -> f32 { 0.8 }

    /// Volume applied to one-shot effects such as the barrel bounce.
    #[must_use]
    pub fn effective_effects_volume(&self) -> f32 {
        (self.master_volume * self.effects_volume).clamp(0.0, 1.0)
    }
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            master_volume: Self::default_master(),
            effects_volume: Self::default_effects(),
        }
    }
}

/// Controls / input settings.
///
/// `keybinds` is the primary input source. `legacy_keybinds` is consulted only
/// when the primary source reports no horizontal movement (and, for jumps, when
/// the primary jump key was not pressed). Leaving `legacy_keybinds` empty
/// disables the fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlsSettings {
    #[serde(default = "ControlsSettings::default_keybinds")]
    pub keybinds: HashMap<String, String>, // Map of action names to key identifiers
    #[serde(default = "ControlsSettings::default_legacy_keybinds")]
    pub legacy_keybinds: HashMap<String, String>, // Fallback bindings for left/right/jump
}

impl ControlsSettings {
    fn default_keybinds() -> HashMap<String, String> {
        let mut m = HashMap::new();
        m.insert("left".to_string(), "A".to_string());
        m.insert("right".to_string(), "D".to_string());
        m.insert("jump".to_string(), "W".to_string());
        m.insert("toggle_debug".to_string(), "F1".to_string());
        m.insert("toggle_gizmos".to_string(), "F2".to_string());
        m.insert("dump_debug".to_string(), "F3".to_string());
        m
    }

    fn default_legacy_keybinds() -> HashMap<String, String> {
        let mut m = HashMap::new();
        m.insert("left".to_string(), "Left".to_string());
        m.insert("right".to_string(), "Right".to_string());
        m.insert("jump".to_string(), "Up".to_string());
        m
    }

    /// Resolve an action from the primary bindings, falling back to `default`
    /// when the action is unbound or its key name is unknown.
    #[must_use]
    pub fn key(&self, action: &str, default: KeyCode) -> KeyCode {
        self.keybinds
            .get(action)
            .and_then(|s| Settings::keycode_from_str(s))
            .unwrap_or(default)
    }

    /// Resolve an action from the legacy bindings. No default: an unbound
    /// legacy action simply does not exist.
    #[must_use]
    pub fn legacy_key(&self, action: &str) -> Option<KeyCode> {
        self.legacy_keybinds
            .get(action)
            .and_then(|s| Settings::keycode_from_str(s))
    }
}

impl Default for ControlsSettings {
    fn default() -> Self {
        Self {
            keybinds: Self::default_keybinds(),
            legacy_keybinds: Self::default_legacy_keybinds(),
        }
    }
}

/// Player tuning. Distances are in world units, velocities in units/second.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSettings {
    #[serde(default = "PlayerSettings::default_move_speed")]
    pub move_speed: f32, // Horizontal speed while a direction is held
    #[serde(default = "PlayerSettings::default_jump_force")]
    pub jump_force: f32, // Vertical velocity assigned on a grounded jump
    #[serde(default = "PlayerSettings::default_ground_check_radius")]
    pub ground_check_radius: f32, // Radius of the overlap circle at the ground-check point
    #[serde(default = "PlayerSettings::default_ground_check_distance")]
    pub ground_check_distance: f32, // Length of the downward ray from the player origin
    #[serde(default = "PlayerSettings::default_ground_check_offset")]
    pub ground_check_offset: (f32, f32), // Ground-check point relative to the player origin
    #[serde(default = "PlayerSettings::default_grounded_velocity_threshold")]
    pub grounded_velocity_threshold: f32, // Max vertical velocity still considered grounded
    #[serde(default = "PlayerSettings::default_ground_layers")]
    pub ground_layers: u32, // Collider layer mask treated as walkable
    #[serde(default = "PlayerSettings::default_mass")]
    pub mass: f32, // Rigid body mass, divides impulses
}

impl PlayerSettings {
    fn default_move_speed() -> f32 { 5.0 }
    fn default_jump_force() -> f32 { 10.0 }
    fn default_ground_check_radius() -> f32 { 0.2 }
    fn default_ground_check_distance() -> f32 { 0.1 }
    fn default_ground_check_offset() -> (f32, f32) { (0.0, -0.5) }
    fn default_grounded_velocity_threshold() -> f32 { 0.1 }
    fn default_ground_layers() -> u32 { GameLayer::Ground.to_bits() }
    fn default_mass() -> f32 { 1.0 }

    #[must_use]
    pub fn ground_check_offset(&self) -> Vec2 {
        Vec2::new(self.ground_check_offset.0, self.ground_check_offset.1)
    }
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            move_speed: Self::default_move_speed(),
            jump_force: Self::default_jump_force(),
            ground_check_radius: Self::default_ground_check_radius(),
            ground_check_distance: Self::default_ground_check_distance(),
            ground_check_offset: Self::default_ground_check_offset(),
            grounded_velocity_threshold: Self::default_grounded_velocity_threshold(),
            ground_layers: Self::default_ground_layers(),
            mass: Self::default_mass(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicsSettings {
    #[serde(default = "PhysicsSettings::default_gravity")]
    pub gravity: f32, // Vertical gravity handed to the physics engine
    #[serde(default = "PhysicsSettings::default_max_fall_speed")]
    pub max_fall_speed: f32, // Terminal velocity (positive number)
}

impl PhysicsSettings {
    fn default_gravity() -> f32 { -25.0 }
    fn default_max_fall_speed() -> f32 { 30.0 }
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            gravity: Self::default_gravity(),
            max_fall_speed: Self::default_max_fall_speed(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraSettings {
    #[serde(default = "CameraSettings::default_smooth_speed")]
    pub smooth_speed: f32, // Fraction of the remaining distance covered each frame
    #[serde(default = "CameraSettings::default_projection_scale")]
    pub projection_scale: f32, // Orthographic scale (world units per pixel)
}

impl CameraSettings {
    fn default_smooth_speed() -> f32 { 0.125 }
    fn default_projection_scale() -> f32 { 0.02 }
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            smooth_speed: Self::default_smooth_speed(),
            projection_scale: Self::default_projection_scale(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarrelSettings {
    #[serde(default = "BarrelSettings::default_rising_velocity_threshold")]
    pub rising_velocity_threshold: f32, // Players rising faster than this are not bounced
}

impl BarrelSettings {
    fn default_rising_velocity_threshold() -> f32 { 3.0 }
}

impl Default for BarrelSettings {
    fn default() -> Self {
        Self { rising_velocity_threshold: Self::default_rising_velocity_threshold() }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DebugSettings {
    #[serde(default)]
    pub verbose: bool, // Per-entity diagnostic logging (contacts, ground changes, flips)
    #[serde(default)]
    pub gizmos: bool, // Start with gizmos visible
}

/// Top-level Settings
#[derive(Resource, Clone, Debug, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub graphics: GraphicsSettings,
    #[serde(default)]
    pub audio: AudioSettings,
    #[serde(default)]
    pub controls: ControlsSettings,
    #[serde(default)]
    pub player: PlayerSettings,
    #[serde(default)]
    pub physics: PhysicsSettings,
    #[serde(default)]
    pub camera: CameraSettings,
    #[serde(default)]
    pub barrel: BarrelSettings,
    #[serde(default)]
    pub debug: DebugSettings,
}

impl Settings {
    #[must_use]
    pub fn defaults() -> Self { Settings::default() }

    /// Convert a key identifier from `controls.keybinds` into a `KeyCode`.
    ///
    /// Matching is case-insensitive. Single letters and digits map to their
    /// keys; a handful of named keys are accepted as well.
    ///
    /// # Returns
    /// `None` if the identifier is not recognised.
    #[must_use]
    pub fn keycode_from_str(name: &str) -> Option<KeyCode> {
        const LETTERS: [KeyCode; 26] = [
            KeyCode::KeyA, KeyCode::KeyB, KeyCode::KeyC, KeyCode::KeyD, KeyCode::KeyE,
            KeyCode::KeyF, KeyCode::KeyG, KeyCode::KeyH, KeyCode::KeyI, KeyCode::KeyJ,
            KeyCode::KeyK, KeyCode::KeyL, KeyCode::KeyM, KeyCode::KeyN, KeyCode::KeyO,
            KeyCode::KeyP, KeyCode::KeyQ, KeyCode::KeyR, KeyCode::KeyS, KeyCode::KeyT,
            KeyCode::KeyU, KeyCode::KeyV, KeyCode::KeyW, KeyCode::KeyX, KeyCode::KeyY,
            KeyCode::KeyZ,
        ];
        const DIGITS: [KeyCode; 10] = [
            KeyCode::Digit0, KeyCode::Digit1, KeyCode::Digit2, KeyCode::Digit3, KeyCode::Digit4,
            KeyCode::Digit5, KeyCode::Digit6, KeyCode::Digit7, KeyCode::Digit8, KeyCode::Digit9,
        ];
        const FUNCTION: [KeyCode; 12] = [
            KeyCode::F1, KeyCode::F2, KeyCode::F3, KeyCode::F4, KeyCode::F5, KeyCode::F6,
            KeyCode::F7, KeyCode::F8, KeyCode::F9, KeyCode::F10, KeyCode::F11, KeyCode::F12,
        ];

        let s = name.trim().to_ascii_uppercase();
        let mut chars = s.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if c.is_ascii_uppercase() {
                return Some(LETTERS[(c as u8 - b'A') as usize]);
            }
            if c.is_ascii_digit() {
                return Some(DIGITS[(c as u8 - b'0') as usize]);
            }
        }

        if let Some(n) = s.strip_prefix('F').and_then(|n| n.parse::<usize>().ok()) {
            return (1..=FUNCTION.len()).contains(&n).then(|| FUNCTION[n - 1]);
        }

        Some(match s.as_str() {
            "LEFT" | "ARROWLEFT" => KeyCode::ArrowLeft,
            "RIGHT" | "ARROWRIGHT" => KeyCode::ArrowRight,
            "UP" | "ARROWUP" => KeyCode::ArrowUp,
            "DOWN" | "ARROWDOWN" => KeyCode::ArrowDown,
            "ESC" | "ESCAPE" => KeyCode::Escape,
            "SPACE" => KeyCode::Space,
            "TAB" => KeyCode::Tab,
            "ENTER" | "RETURN" => KeyCode::Enter,
            "LSHIFT" | "SHIFT" => KeyCode::ShiftLeft,
            "RSHIFT" => KeyCode::ShiftRight,
            "LCTRL" | "CTRL" => KeyCode::ControlLeft,
            "RCTRL" => KeyCode::ControlRight,
            _ => return None,
        })
    }
}

pub mod loader;
