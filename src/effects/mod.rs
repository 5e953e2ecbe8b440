//! Fire-and-forget particle bursts.
//!
//! Gameplay code sends a [`ParticleBurst`] and forgets about it. The burst is
//! turned into a handful of short-lived sprites that fly outward, fall and
//! fade; nothing else ever references them.

use bevy::prelude::*;

#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct ParticleBurst {
    pub origin: Vec2,
    pub color: Color,
    pub count: u32,
    pub speed: f32,
    pub lifetime: f32,
}

impl ParticleBurst {
    /// The splinter burst played when a barrel launches the player.
    #[must_use]
    pub fn bounce(origin: Vec2) -> Self {
        Self {
            origin,
            color: Color::srgb(0.75, 0.5, 0.25),
            count: 12,
            speed: 6.0,
            lifetime: 0.6,
        }
    }
}

#[derive(Component, Debug)]
pub struct Particle {
    pub velocity: Vec2,
    pub life: Timer,
}

const PARTICLE_GRAVITY: f32 = -20.0;
const PARTICLE_SIZE: f32 = 0.15;

/// Launch directions for a burst: an upward fan between 20 and 160 degrees.
#[must_use]
pub fn burst_directions(count: u32) -> Vec<Vec2> {
    let (lo, hi) = (20f32.to_radians(), 160f32.to_radians());
    (0..count)
        .map(|i| {
            let t = if count > 1 { i as f32 / (count - 1) as f32 } else { 0.5 };
            Vec2::from_angle(lo + (hi - lo) * t)
        })
        .collect()
}

#[allow(clippy::needless_pass_by_value)]
pub fn spawn_particle_bursts(mut commands: Commands, mut bursts: EventReader<ParticleBurst>) {
    for burst in bursts.read() {
        for (i, dir) in burst_directions(burst.count).into_iter().enumerate() {
            // alternate fast and slow splinters so the burst is not a perfect arc
            let speed = if i % 2 == 0 { burst.speed } else { burst.speed * 0.6 };
            commands.spawn((
                SpriteBundle {
                    sprite: Sprite {
                        color: burst.color,
                        custom_size: Some(Vec2::splat(PARTICLE_SIZE)),
                        ..default()
                    },
                    transform: Transform::from_translation(burst.origin.extend(5.0)),
                    ..default()
                },
                Particle {
                    velocity: dir * speed,
                    life: Timer::from_seconds(burst.lifetime, TimerMode::Once),
                },
            ));
        }
    }
}

#[allow(clippy::needless_pass_by_value)]
pub fn update_particles(
    time: Res<Time>,
    mut commands: Commands,
    mut particles: Query<(Entity, &mut Transform, &mut Particle, &mut Sprite)>,
) {
    let dt = time.delta_seconds();
    for (entity, mut tf, mut particle, mut sprite) in &mut particles {
        if particle.life.tick(time.delta()).finished() {
            commands.entity(entity).despawn();
            continue;
        }
        particle.velocity.y += PARTICLE_GRAVITY * dt;
        tf.translation += particle.velocity.extend(0.0) * dt;
        sprite.color.set_alpha(1.0 - particle.life.fraction());
    }
}
