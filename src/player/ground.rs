//! Ground detection.
//!
//! A player is grounded when either the overlap circle at the ground-check
//! point or the short downward ray finds walkable geometry, and the player is
//! not moving upward faster than a small threshold. The threshold keeps a
//! player who is jumping up through a platform edge from being reported as
//! grounded on the way up.

use super::{MissingBody, PlayerController};
use crate::physics::layer_filter;
use avian2d::prelude::*;
use bevy::prelude::*;

/// The three sub-results that make up a ground check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroundCheck {
    pub circle: bool,
    pub ray: bool,
    pub velocity_ok: bool,
}

impl GroundCheck {
    #[must_use]
    pub fn new(circle: bool, ray: bool, vertical_velocity: f32, threshold: f32) -> Self {
        Self { circle, ray, velocity_ok: vertical_velocity <= threshold }
    }

    #[must_use]
    pub fn grounded(&self) -> bool {
        (self.circle || self.ray) && self.velocity_ok
    }
}

/// Run the circle and ray queries for a player standing at `origin`.
#[must_use]
pub fn check_ground(
    spatial: &SpatialQuery,
    controller: &PlayerController,
    origin: Vec2,
    vertical_velocity: f32,
) -> GroundCheck {
    let filter = layer_filter(controller.ground_layers);
    let circle = !spatial
        .shape_intersections(
            &Collider::circle(controller.ground_check_radius),
            origin + controller.ground_check_offset,
            0.0,
            filter.clone(),
        )
        .is_empty();
    let ray = spatial
        .cast_ray(origin, Dir2::NEG_Y, controller.ground_check_distance, true, filter)
        .is_some();
    GroundCheck::new(circle, ray, vertical_velocity, controller.grounded_velocity_threshold)
}

/// Recompute `is_grounded` for every player from this frame's geometry.
#[allow(clippy::needless_pass_by_value)]
pub fn update_ground_state(
    spatial: SpatialQuery,
    mut players: Query<(&Transform, &LinearVelocity, &mut PlayerController), Without<MissingBody>>,
) {
    for (tf, velocity, mut controller) in &mut players {
        let check = check_ground(&spatial, &controller, tf.translation.truncate(), velocity.y);
        let grounded = check.grounded();
        if controller.debug && grounded != controller.is_grounded {
            debug!(
                "ground state changed: {grounded} (circle: {}, ray: {}, velocity: {})",
                check.circle, check.ray, check.velocity_ok
            );
        }
        controller.is_grounded = grounded;
    }
}
