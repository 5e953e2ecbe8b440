//! Horizontal movement, facing and jumping.

use super::{InputBindings, MissingBody, PlayerController};
use crate::animation::{self, AnimationParams};
use avian2d::prelude::LinearVelocity;
use bevy::prelude::*;

/// What happened during one controller update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveOutcome {
    /// Facing changed; the caller mirrors the sprite.
    pub flipped: bool,
    pub jumped: bool,
    /// A jump was requested while airborne and dropped.
    pub jump_dropped: bool,
}

/// Apply one frame of player intent to `velocity`.
///
/// Horizontal velocity is replaced by `axis * move_speed`; vertical velocity
/// is left untouched unless a grounded jump assigns `jump_force` to it.
/// Airborne jump requests are dropped, not buffered.
pub fn drive(controller: &mut PlayerController, velocity: &mut Vec2, axis: f32, jump: bool) -> MoveOutcome {
    let mut out = MoveOutcome::default();

    velocity.x = axis * controller.move_speed;

    if (axis > 0.0 && !controller.facing_right) || (axis < 0.0 && controller.facing_right) {
        controller.facing_right = !controller.facing_right;
        out.flipped = true;
    }

    if jump {
        if controller.is_grounded {
            velocity.y = controller.jump_force;
            out.jumped = true;
        } else {
            out.jump_dropped = true;
        }
    }

    out
}

/// Read input and drive every player's rigid body.
///
/// Players without an `AnimationParams` table still move; only the
/// informational animation writes are skipped.
#[allow(clippy::needless_pass_by_value)]
pub fn player_movement(
    kb: Res<ButtonInput<KeyCode>>,
    bindings: Res<InputBindings>,
    mut players: Query<
        (&mut Transform, &mut LinearVelocity, &mut PlayerController, Option<&mut AnimationParams>),
        Without<MissingBody>,
    >,
) {
    let axis = bindings.horizontal_axis(&kb);
    let jump = bindings.jump_requested(&kb);

    for (mut tf, mut velocity, mut controller, anim) in &mut players {
        let out = drive(&mut controller, &mut velocity.0, axis, jump);

        if out.flipped {
            tf.scale.x = -tf.scale.x;
            if controller.debug {
                debug!("player flipped, now facing {}", if controller.facing_right { "right" } else { "left" });
            }
        }
        if controller.debug {
            if out.jumped {
                debug!("jumping from the ground");
            } else if out.jump_dropped {
                debug!("cannot jump: not on the ground");
            }
        }

        if let Some(mut params) = anim {
            params.set_float(animation::SPEED, axis.abs());
            params.set_float(animation::VERTICAL_VELOCITY, velocity.y);
            params.set_bool(animation::IS_GROUNDED, controller.is_grounded);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::ControlsSettings;

    fn grounded() -> PlayerController {
        PlayerController { is_grounded: true, ..default() }
    }

    #[test]
    fn grounded_jump_assigns_jump_force() {
        let mut c = grounded();
        let mut v = Vec2::new(0.0, -3.0);
        let out = drive(&mut c, &mut v, 0.0, true);
        assert!(out.jumped);
        assert_eq!(v.y, 10.0);
    }

    #[test]
    fn airborne_jump_is_dropped() {
        let mut c = PlayerController::default();
        let mut v = Vec2::new(0.0, -3.0);
        let out = drive(&mut c, &mut v, 0.0, true);
        assert!(out.jump_dropped);
        assert_eq!(v.y, -3.0);
    }

    #[test]
    fn horizontal_velocity_replaced_vertical_kept() {
        let mut c = grounded();
        let mut v = Vec2::new(42.0, -7.5);
        drive(&mut c, &mut v, -1.0, false);
        assert_eq!(v, Vec2::new(-5.0, -7.5));
        drive(&mut c, &mut v, 0.0, false);
        assert_eq!(v, Vec2::new(0.0, -7.5));
    }

    #[test]
    fn facing_flips_only_on_direction_change() {
        let mut c = grounded();
        let mut v = Vec2::ZERO;
        assert!(!drive(&mut c, &mut v, 1.0, false).flipped);
        assert!(drive(&mut c, &mut v, -1.0, false).flipped);
        assert!(!c.facing_right);
        assert!(!drive(&mut c, &mut v, 0.0, false).flipped);
        assert!(!drive(&mut c, &mut v, -1.0, false).flipped);
        assert!(drive(&mut c, &mut v, 1.0, false).flipped);
    }

    fn movement_app() -> App {
        let mut app = App::new();
        app.init_resource::<ButtonInput<KeyCode>>();
        app.insert_resource(InputBindings::from_controls(&ControlsSettings::default()));
        app.add_systems(Update, player_movement);
        app
    }

    #[test]
    fn system_mirrors_sprite_and_feeds_animation() {
        let mut app = movement_app();
        let player = app
            .world_mut()
            .spawn((Transform::default(), LinearVelocity::default(), grounded(), AnimationParams::player()))
            .id();
        app.world_mut().resource_mut::<ButtonInput<KeyCode>>().press(KeyCode::KeyA);
        app.update();

        let tf = app.world().get::<Transform>(player).unwrap();
        assert_eq!(tf.scale.x, -1.0);
        let params = app.world().get::<AnimationParams>(player).unwrap();
        assert_eq!(params.float(animation::SPEED), Some(1.0));
        assert_eq!(params.bool(animation::IS_GROUNDED), Some(true));
        assert_eq!(app.world().get::<LinearVelocity>(player).unwrap().x, -5.0);
    }

    #[test]
    fn system_runs_without_animation_table() {
        let mut app = movement_app();
        let player = app.world_mut().spawn((Transform::default(), LinearVelocity::default(), grounded())).id();
        app.world_mut().resource_mut::<ButtonInput<KeyCode>>().press(KeyCode::KeyW);
        app.update();
        assert_eq!(app.world().get::<LinearVelocity>(player).unwrap().y, 10.0);
    }
}
