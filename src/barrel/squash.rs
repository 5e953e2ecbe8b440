//! Squash-and-stretch played by a barrel after a bounce.
//!
//! The animation is a small per-frame state machine instead of a blocking
//! sequence: each call to [`SquashAnimation::advance`] produces the pose for
//! the current frame. Despawning the barrel simply drops the component.

use super::Barrel;
use bevy::prelude::*;

pub const COMPRESS_SECS: f32 = 0.15;
pub const EXPAND_SECS: f32 = 0.25;
pub const OSCILLATE_SECS: f32 = 0.2;

const COMPRESSED: Vec2 = Vec2::new(1.3, 0.6);
const EXPANDED: Vec2 = Vec2::new(1.4, 1.3);
const WOBBLE_RATE: f32 = 20.0;
const WOBBLE_DEGREES: f32 = 5.0;
const OSCILLATE_RATE: f32 = 30.0;
const OSCILLATE_AMPLITUDE: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SquashPhase {
    Compress,
    Expand,
    Oscillate,
    Done,
}

/// Pose for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SquashFrame {
    pub scale: Vec3,
    /// `None` leaves the current rotation alone.
    pub rotation: Option<Quat>,
    /// Last frame of the animation.
    pub finished: bool,
    /// The barrel should clear its `used` latch.
    pub reset_used: bool,
}

#[derive(Component, Debug, Clone)]
pub struct SquashAnimation {
    original: Vec3,
    /// Stay expanded at the end instead of oscillating back to normal.
    hold_expanded: bool,
    phase: SquashPhase,
    elapsed: f32,
}

impl SquashAnimation {
    #[must_use]
    pub fn new(original: Vec3, hold_expanded: bool) -> Self {
        Self { original, hold_expanded, phase: SquashPhase::Compress, elapsed: 0.0 }
    }

    #[must_use]
    pub fn phase(&self) -> SquashPhase {
        self.phase
    }

    fn compressed(&self) -> Vec3 {
        Vec3::new(self.original.x * COMPRESSED.x, self.original.y * COMPRESSED.y, self.original.z)
    }

    fn expanded(&self) -> Vec3 {
        Vec3::new(self.original.x * EXPANDED.x, self.original.y * EXPANDED.y, self.original.z)
    }

    /// Produce this frame's pose, then advance time by `dt`.
    ///
    /// A phase whose time has run out hands over to the next phase within the
    /// same call, so no frame is spent idle between phases. Returns `None`
    /// once the animation is done.
    pub fn advance(&mut self, dt: f32) -> Option<SquashFrame> {
        loop {
            let t = self.elapsed;
            match self.phase {
                SquashPhase::Compress => {
                    if t < COMPRESS_SECS {
                        self.elapsed += dt;
                        return Some(self.frame(self.original.lerp(self.compressed(), t / COMPRESS_SECS), None));
                    }
                    self.enter(SquashPhase::Expand);
                }
                SquashPhase::Expand => {
                    if t < EXPAND_SECS {
                        self.elapsed += dt;
                        let wobble = ((t * WOBBLE_RATE).sin() * WOBBLE_DEGREES).to_radians();
                        let scale = self.compressed().lerp(self.expanded(), t / EXPAND_SECS);
                        return Some(self.frame(scale, Some(Quat::from_rotation_z(wobble))));
                    }
                    if self.hold_expanded {
                        self.enter(SquashPhase::Done);
                        return Some(SquashFrame { finished: true, ..self.frame(self.expanded(), None) });
                    }
                    self.enter(SquashPhase::Oscillate);
                }
                SquashPhase::Oscillate => {
                    if t < OSCILLATE_SECS {
                        self.elapsed += dt;
                        let factor = (t * OSCILLATE_RATE).sin() * OSCILLATE_AMPLITUDE;
                        return Some(self.frame(self.original + Vec3::splat(factor), None));
                    }
                    self.enter(SquashPhase::Done);
                    return Some(SquashFrame {
                        scale: self.original,
                        rotation: Some(Quat::IDENTITY),
                        finished: true,
                        reset_used: true,
                    });
                }
                SquashPhase::Done => return None,
            }
        }
    }

    fn enter(&mut self, phase: SquashPhase) {
        self.phase = phase;
        self.elapsed = 0.0;
    }

    fn frame(&self, scale: Vec3, rotation: Option<Quat>) -> SquashFrame {
        SquashFrame { scale, rotation, finished: false, reset_used: false }
    }
}

/// Advance every running squash animation by the frame delta.
#[allow(clippy::needless_pass_by_value)]
pub fn animate_barrels(
    time: Res<Time>,
    mut commands: Commands,
    mut barrels: Query<(Entity, &mut Transform, &mut SquashAnimation, &mut Barrel)>,
) {
    let dt = time.delta_seconds();
    for (entity, mut tf, mut anim, mut barrel) in &mut barrels {
        let Some(frame) = anim.advance(dt) else {
            commands.entity(entity).remove::<SquashAnimation>();
            continue;
        };
        tf.scale = frame.scale;
        if let Some(rotation) = frame.rotation {
            tf.rotation = rotation;
        }
        if frame.finished {
            commands.entity(entity).remove::<SquashAnimation>();
            if frame.reset_used {
                barrel.used = false;
                if barrel.debug {
                    debug!("barrel {entity:?} reset, ready to bounce again");
                }
            } else if barrel.debug {
                debug!("barrel {entity:?} expansion done, waiting for removal");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn run(anim: &mut SquashAnimation) -> Vec<SquashFrame> {
        std::iter::from_fn(|| anim.advance(DT)).collect()
    }

    #[test]
    fn starts_at_original_scale() {
        let mut anim = SquashAnimation::new(Vec3::ONE, true);
        let first = anim.advance(DT).unwrap();
        assert_eq!(first.scale, Vec3::ONE);
        assert_eq!(anim.phase(), SquashPhase::Compress);
    }

    #[test]
    fn held_animation_ends_expanded_without_reset() {
        let mut anim = SquashAnimation::new(Vec3::new(2.0, 2.0, 1.0), true);
        let frames = run(&mut anim);
        let last = frames.last().unwrap();
        assert!(last.finished);
        assert!(!last.reset_used);
        assert!(last.scale.abs_diff_eq(Vec3::new(2.8, 2.6, 1.0), 1e-5));
        assert_eq!(anim.phase(), SquashPhase::Done);
        assert!(anim.advance(DT).is_none());
        // 0.15 s + 0.25 s at 60 fps, give or take a frame of rounding
        assert!((25..=27).contains(&frames.len()), "{} frames", frames.len());
    }

    #[test]
    fn resetting_animation_restores_scale_and_rotation() {
        let mut anim = SquashAnimation::new(Vec3::ONE, false);
        let frames = run(&mut anim);
        let last = frames.last().unwrap();
        assert!(last.finished && last.reset_used);
        assert_eq!(last.scale, Vec3::ONE);
        assert_eq!(last.rotation, Some(Quat::IDENTITY));
        assert_eq!(frames.iter().filter(|f| f.finished).count(), 1);
    }

    #[test]
    fn compression_squashes_then_expansion_stretches() {
        let mut anim = SquashAnimation::new(Vec3::ONE, true);
        let frames = run(&mut anim);
        let min_y = frames.iter().map(|f| f.scale.y).fold(f32::MAX, f32::min);
        let max_y = frames.iter().map(|f| f.scale.y).fold(f32::MIN, f32::max);
        assert!(min_y < 0.7);
        assert!(max_y > 1.25);
        assert!(frames.iter().all(|f| f.scale.z == 1.0));
    }

    #[test]
    fn system_clears_latch_after_reset_animation() {
        let mut app = App::new();
        app.init_resource::<Time>();
        app.add_systems(Update, animate_barrels);
        let barrel = app
            .world_mut()
            .spawn((
                Transform::default(),
                Barrel { used: true, destroy_after_use: false, ..default() },
                SquashAnimation::new(Vec3::ONE, false),
            ))
            .id();
        // Time never advances here, so drive the clock by hand.
        for _ in 0..60 {
            app.world_mut().resource_mut::<Time>().advance_by(std::time::Duration::from_millis(16));
            app.update();
        }
        assert!(!app.world().get::<Barrel>(barrel).unwrap().used);
        assert!(app.world().get::<SquashAnimation>(barrel).is_none());
        assert_eq!(app.world().get::<Transform>(barrel).unwrap().scale, Vec3::ONE);
    }
}
