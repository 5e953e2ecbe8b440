//! Bouncing barrels.
//!
//! A barrel is a sensor volume. The first time the player drops onto it (or
//! touches it while barely rising) the player is launched upward, the barrel
//! plays its effects and a squash-and-stretch animation, and then either
//! removes itself after a delay or resets so it can be used again.
//!
//! ```text
//! Idle --valid contact--> Consumed --destroy_delay--> Removed
//!                           |
//!                           +--animation done (no auto-remove)--> Idle
//! ```
pub mod bounce;
pub mod squash;

use bevy::prelude::*;

use crate::settings::Settings;
use avian2d::prelude::{ExternalImpulse, LinearVelocity};

pub use bounce::*;
pub use squash::*;

#[derive(Component, Debug, Clone)]
pub struct Barrel {
    /// Upward impulse given to the player.
    pub bounce_force: f32,
    /// Remove the barrel `destroy_delay` seconds after a bounce. When false
    /// the barrel resets once its animation finishes.
    pub destroy_after_use: bool,
    pub destroy_delay: f32,
    /// Players rising faster than this pass through without bouncing.
    pub rising_velocity_threshold: f32,
    pub debug: bool,
    /// One-shot latch. Set before any bounce side effect runs.
    pub used: bool,
}

impl Barrel {
    #[must_use]
    pub fn new(bounce_force: f32, destroy_after_use: bool, destroy_delay: f32, settings: &Settings) -> Self {
        Self {
            bounce_force,
            destroy_after_use,
            destroy_delay,
            rising_velocity_threshold: settings.barrel.rising_velocity_threshold,
            debug: settings.debug.verbose,
            used: false,
        }
    }

    /// Decide what a contact does, without mutating anything.
    ///
    /// `player_velocity_y` is `None` when the contacting player has no rigid
    /// body to launch.
    #[must_use]
    pub fn evaluate(&self, is_player: bool, player_velocity_y: Option<f32>) -> BounceDecision {
        if !is_player {
            return BounceDecision::NotPlayer;
        }
        if self.used {
            return BounceDecision::AlreadyUsed;
        }
        match player_velocity_y {
            None => BounceDecision::MissingBody,
            Some(vy) if vy > self.rising_velocity_threshold => BounceDecision::RisingTooFast(vy),
            Some(_) => BounceDecision::Bounce,
        }
    }

    /// Latch `used`, cancel the player's vertical velocity and queue the
    /// upward impulse for the next physics step.
    pub fn launch(&mut self, velocity: &mut LinearVelocity, impulse: &mut ExternalImpulse) {
        self.used = true;
        velocity.y = 0.0;
        impulse.apply_impulse(Vec2::Y * self.bounce_force);
    }
}

impl Default for Barrel {
    fn default() -> Self {
        Self::new(15.0, true, 0.5, &Settings::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BounceDecision {
    Bounce,
    NotPlayer,
    AlreadyUsed,
    MissingBody,
    RisingTooFast(f32),
}

/// Optional fire-and-forget effects played on a bounce.
#[derive(Component, Debug, Clone, Default)]
pub struct BounceEffects {
    pub sound: Option<Handle<AudioSource>>,
    pub particles: bool,
}

/// Despawns the entity when the timer finishes.
#[derive(Component, Debug)]
pub struct ScheduledRemoval(pub Timer);
