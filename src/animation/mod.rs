//! Animation parameter tables and the sprite pose resolver.
//!
//! Gameplay code never drives animation directly; it writes named parameters
//! into an [`AnimationParams`] table, the same way a script would feed an
//! animator controller. The table is fixed when the entity is spawned, so
//! `has_parameter` is a capability check rather than a lookup that can grow.

use bevy::prelude::*;
use bevy::utils::HashMap;

use crate::barrel::Barrel;

pub const SPEED: &str = "Speed";
pub const VERTICAL_VELOCITY: &str = "VerticalVelocity";
pub const IS_GROUNDED: &str = "IsGrounded";
pub const EXPLODE: &str = "Explode";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Float(f32),
    Bool(bool),
    /// Set by `set_trigger`, cleared by whoever consumes it.
    Trigger(bool),
}

#[derive(Component, Debug, Clone, Default)]
pub struct AnimationParams {
    /// Disabled tables still accept writes; the presentation layer ignores them.
    pub enabled: bool,
    params: HashMap<String, ParamValue>,
}

impl AnimationParams {
    /// Build a table from `(name, initial value)` pairs.
    #[must_use]
    pub fn new<'a>(enabled: bool, params: impl IntoIterator<Item = (&'a str, ParamValue)>) -> Self {
        Self {
            enabled,
            params: params.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        }
    }

    /// Parameter table used by the player: speed, vertical velocity, grounded.
    #[must_use]
    pub fn player() -> Self {
        Self::new(
            true,
            [
                (SPEED, ParamValue::Float(0.0)),
                (VERTICAL_VELOCITY, ParamValue::Float(0.0)),
                (IS_GROUNDED, ParamValue::Bool(false)),
            ],
        )
    }

    /// Parameter table used by barrels: a single `Explode` trigger. Starts
    /// disabled and is switched on by the first bounce.
    #[must_use]
    pub fn barrel() -> Self {
        Self::new(false, [(EXPLODE, ParamValue::Trigger(false))])
    }

    #[must_use]
    pub fn has_parameter(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<ParamValue> {
        self.params.get(name).copied()
    }

    #[must_use]
    pub fn float(&self, name: &str) -> Option<f32> {
        match self.get(name)? {
            ParamValue::Float(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn bool(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            ParamValue::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn set_float(&mut self, name: &str, value: f32) {
        self.write(name, ParamValue::Float(value));
    }

    pub fn set_bool(&mut self, name: &str, value: bool) {
        self.write(name, ParamValue::Bool(value));
    }

    pub fn set_trigger(&mut self, name: &str) {
        self.write(name, ParamValue::Trigger(true));
    }

    /// Consume a trigger. Returns `true` once per `set_trigger`.
    pub fn take_trigger(&mut self, name: &str) -> bool {
        match self.params.get_mut(name) {
            Some(ParamValue::Trigger(fired)) => std::mem::replace(fired, false),
            _ => false,
        }
    }

    // Writes to unknown names, or with a mismatched type, are dropped.
    fn write(&mut self, name: &str, value: ParamValue) {
        match self.params.get_mut(name) {
            Some(slot) if std::mem::discriminant(slot) == std::mem::discriminant(&value) => {
                *slot = value;
            }
            Some(_) => debug!("animation parameter '{name}' has a different type, ignoring"),
            None => debug!("animation parameter '{name}' does not exist"),
        }
    }
}

/// Coarse pose derived from the player's animation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerPose {
    Idle,
    Run,
    Jump,
    Fall,
}

impl PlayerPose {
    #[must_use]
    pub fn resolve(params: &AnimationParams) -> Self {
        let grounded = params.bool(IS_GROUNDED).unwrap_or(true);
        let vy = params.float(VERTICAL_VELOCITY).unwrap_or(0.0);
        let speed = params.float(SPEED).unwrap_or(0.0);
        if !grounded {
            if vy > 0.0 { PlayerPose::Jump } else { PlayerPose::Fall }
        } else if speed > 0.01 {
            PlayerPose::Run
        } else {
            PlayerPose::Idle
        }
    }

    #[must_use]
    pub fn tint(self) -> Color {
        match self {
            PlayerPose::Idle => Color::srgb(0.25, 0.55, 0.95),
            PlayerPose::Run => Color::srgb(0.3, 0.75, 1.0),
            PlayerPose::Jump => Color::srgb(0.55, 0.9, 1.0),
            PlayerPose::Fall => Color::srgb(0.2, 0.4, 0.8),
        }
    }
}

/// Tint player sprites according to their resolved pose.
pub fn apply_player_pose(
    mut q: Query<(&AnimationParams, &mut Sprite), (With<crate::player::PlayerController>, Changed<AnimationParams>)>,
) {
    for (params, mut sprite) in &mut q {
        if !params.enabled {
            continue;
        }
        sprite.color = PlayerPose::resolve(params).tint();
    }
}

const EXPLODE_FLASH: Color = Color::srgb(1.0, 0.55, 0.1);

/// Sprite colour a barrel had before its explode flash.
#[derive(Component, Debug, Clone, Copy)]
pub struct ExplodeFlash(pub Color);

/// Consume `Explode` triggers and flash the barrel sprite. Every trigger is
/// consumed, so a barrel that resets can explode again.
pub fn play_barrel_explode(
    mut commands: Commands,
    mut q: Query<(Entity, &mut AnimationParams, &mut Sprite, Option<&ExplodeFlash>), With<Barrel>>,
) {
    for (entity, mut params, mut sprite, flash) in &mut q {
        if params.enabled && params.take_trigger(EXPLODE) {
            if flash.is_none() {
                commands.entity(entity).insert(ExplodeFlash(sprite.color));
            }
            sprite.color = EXPLODE_FLASH;
        }
    }
}

/// Put the original colour back once a flashed barrel is ready again.
pub fn clear_explode_flash(
    mut commands: Commands,
    mut q: Query<(Entity, &Barrel, &ExplodeFlash, &mut Sprite)>,
) {
    for (entity, barrel, flash, mut sprite) in &mut q {
        if !barrel.used {
            sprite.color = flash.0;
            commands.entity(entity).remove::<ExplodeFlash>();
        }
    }
}
