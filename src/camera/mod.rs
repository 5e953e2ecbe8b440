//! Smooth 2D camera follow.
//!
//! Every frame, after movement has settled, the camera moves a fixed
//! fraction of the way from where it is toward `target + offset`, optionally
//! clamped to a rectangle. The camera's own depth never changes.

use bevy::prelude::*;
use serde::Deserialize;

use crate::physics::Tag;

/// Offset used when none is configured.
pub const DEFAULT_OFFSET: Vec3 = Vec3::new(0.0, 0.0, -10.0);

/// Rectangle the camera centre is kept inside.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct CameraBounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl CameraBounds {
    /// Clamp `x` and `y` independently. Inverted ranges collapse onto `min`.
    #[must_use]
    pub fn clamp(&self, p: Vec3) -> Vec3 {
        Vec3::new(
            p.x.max(self.min_x).min(self.max_x.max(self.min_x)),
            p.y.max(self.min_y).min(self.max_y.max(self.min_y)),
            p.z,
        )
    }
}

#[derive(Component, Debug, Clone)]
pub struct CameraFollow {
    /// Non-owning. A despawned target is treated as no target.
    pub target: Option<Entity>,
    pub offset: Vec3,
    /// Fraction of the remaining distance covered each frame, in `0..=1`.
    pub smooth_speed: f32,
    pub bounds: Option<CameraBounds>,
}

impl Default for CameraFollow {
    fn default() -> Self {
        Self { target: None, offset: DEFAULT_OFFSET, smooth_speed: 0.125, bounds: None }
    }
}

/// One smoothing step. `z` is always taken from `current`.
#[must_use]
pub fn follow_step(
    current: Vec3,
    target: Vec3,
    offset: Vec3,
    bounds: Option<&CameraBounds>,
    smooth_speed: f32,
) -> Vec3 {
    let mut desired = target + offset;
    if let Some(bounds) = bounds {
        desired = bounds.clamp(desired);
    }
    let mut next = current.lerp(desired, smooth_speed.clamp(0.0, 1.0));
    next.z = current.z;
    next
}

/// Fill in missing targets and offsets on newly added followers.
pub fn init_camera_follow(
    mut cameras: Query<(Entity, &mut CameraFollow), Added<CameraFollow>>,
    tagged: Query<(Entity, &Tag)>,
) {
    for (entity, mut follow) in &mut cameras {
        if follow.target.is_none() {
            match tagged.iter().find(|(_, tag)| **tag == Tag::Player) {
                Some((player, _)) => {
                    info!("camera {entity:?} following player {player:?}");
                    follow.target = Some(player);
                }
                None => warn!("camera {entity:?} has no target and no player was found"),
            }
        }
        if follow.offset == Vec3::ZERO {
            follow.offset = DEFAULT_OFFSET;
        }
    }
}

#[allow(clippy::needless_pass_by_value)]
pub fn camera_follow(
    mut cameras: Query<(&mut Transform, &CameraFollow)>,
    targets: Query<&Transform, Without<CameraFollow>>,
) {
    for (mut tf, follow) in &mut cameras {
        let Some(target) = follow.target.and_then(|e| targets.get(e).ok()) else { continue };
        tf.translation = follow_step(
            tf.translation,
            target.translation,
            follow.offset,
            follow.bounds.as_ref(),
            follow.smooth_speed,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converges_without_overshoot() {
        let target = Vec3::new(10.0, 4.0, 0.0);
        let mut cam = Vec3::new(0.0, 0.0, 999.0);
        let mut last_gap = f32::MAX;
        for _ in 0..200 {
            cam = follow_step(cam, target, DEFAULT_OFFSET, None, 0.125);
            let gap = cam.truncate().distance(target.truncate());
            assert!(gap < last_gap || gap < 1e-4);
            assert!(cam.x <= target.x && cam.y <= target.y);
            assert_eq!(cam.z, 999.0);
            last_gap = gap;
        }
        assert!(last_gap < 1e-3);
    }

    #[test]
    fn first_step_is_an_eighth_of_the_gap() {
        let next = follow_step(Vec3::ZERO, Vec3::new(8.0, -16.0, 0.0), DEFAULT_OFFSET, None, 0.125);
        assert_eq!(next, Vec3::new(1.0, -2.0, 0.0));
    }

    #[test]
    fn bounds_clamp_each_axis() {
        let bounds = CameraBounds { min_x: -5.0, max_x: 5.0, min_y: 0.0, max_y: 2.0 };
        let next = follow_step(Vec3::ZERO, Vec3::new(100.0, -100.0, 0.0), Vec3::ZERO, Some(&bounds), 1.0);
        assert_eq!(next, Vec3::new(5.0, 0.0, 0.0));
        let inside = follow_step(Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0), Vec3::ZERO, Some(&bounds), 1.0);
        assert_eq!(inside, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn adopts_player_and_default_offset() {
        let mut app = App::new();
        app.add_systems(Update, (init_camera_follow, camera_follow).chain());
        let player = app
            .world_mut()
            .spawn((Tag::Player, Transform::from_xyz(8.0, 0.0, 0.0)))
            .id();
        let cam = app
            .world_mut()
            .spawn((
                Transform::from_xyz(0.0, 0.0, 100.0),
                CameraFollow { offset: Vec3::ZERO, ..default() },
            ))
            .id();
        app.update();

        let follow = app.world().get::<CameraFollow>(cam).unwrap();
        assert_eq!(follow.target, Some(player));
        assert_eq!(follow.offset, DEFAULT_OFFSET);
        let tf = app.world().get::<Transform>(cam).unwrap();
        assert_eq!(tf.translation, Vec3::new(1.0, 0.0, 100.0));
    }

    #[test]
    fn despawned_target_leaves_camera_alone() {
        let mut app = App::new();
        app.add_systems(Update, camera_follow);
        let player = app.world_mut().spawn(Transform::from_xyz(8.0, 8.0, 0.0)).id();
        let cam = app
            .world_mut()
            .spawn((Transform::default(), CameraFollow { target: Some(player), ..default() }))
            .id();
        app.world_mut().despawn(player);
        app.update();
        assert_eq!(app.world().get::<Transform>(cam).unwrap().translation, Vec3::ZERO);
    }

    #[test]
    fn no_player_keeps_target_empty() {
        let mut app = App::new();
        app.add_systems(Update, init_camera_follow);
        let cam = app.world_mut().spawn((Transform::default(), CameraFollow::default())).id();
        app.update();
        assert!(app.world().get::<CameraFollow>(cam).unwrap().target.is_none());
    }
}
