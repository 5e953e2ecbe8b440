//! Player components and systems (ground detection, input, movement, pickups).
//!
//! The module provides the `PlayerController` component and convenience
//! re-exports for the player-related systems.
//!
//! # Example:
//!
//! ```ignore
//! commands.spawn((
//!     SpriteBundle::default(),
//!     PlayerController::from_settings(&settings),
//!     CoinPurse::default(),
//!     physics::character(Vec2::new(0.8, 1.0), settings.player.mass),
//!     AnimationParams::player(),
//!     Tag::Player,
//! ));
//! app.add_systems(Update, (update_ground_state, player_movement).chain());
//! app.add_systems(Update, player_contacts);
//! ```
pub mod ground;
pub mod input;
pub mod movement;
pub mod pickups;

use bevy::prelude::*;

use crate::settings::Settings;

pub use ground::*;
pub use input::*;
pub use movement::*;
pub use pickups::*;

/// Player tuning plus the per-frame state the controller recomputes.
#[derive(Component, Debug, Clone)]
pub struct PlayerController {
    /// Horizontal speed in units per second.
    pub move_speed: f32,
    /// Vertical velocity assigned by a grounded jump.
    pub jump_force: f32,
    /// Radius of the overlap circle at the ground-check point.
    pub ground_check_radius: f32,
    /// Length of the downward ray cast from the player origin.
    pub ground_check_distance: f32,
    /// Ground-check point relative to the player origin.
    pub ground_check_offset: Vec2,
    /// Highest vertical velocity at which the player still counts as grounded.
    pub grounded_velocity_threshold: f32,
    /// Collider layers treated as walkable.
    pub ground_layers: u32,
    /// Emit per-frame diagnostics.
    pub debug: bool,
    /// Recomputed every frame by `update_ground_state`.
    pub is_grounded: bool,
    pub facing_right: bool,
}

impl PlayerController {
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        let p = &settings.player;
        Self {
            move_speed: p.move_speed,
            jump_force: p.jump_force,
            ground_check_radius: p.ground_check_radius,
            ground_check_distance: p.ground_check_distance,
            ground_check_offset: p.ground_check_offset(),
            grounded_velocity_threshold: p.grounded_velocity_threshold,
            ground_layers: p.ground_layers,
            debug: settings.debug.verbose,
            is_grounded: false,
            facing_right: true,
        }
    }
}

impl Default for PlayerController {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// Set on players spawned without a rigid body. Per-frame player systems
/// skip marked entities.
#[derive(Component, Debug, Clone, Copy)]
pub struct MissingBody;

/// Coins picked up since the level was (re)loaded.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoinPurse {
    pub coins: u32,
}
