//! Physics setup on top of avian2d: collision layers, gameplay tags, the
//! collider bundles used by level spawning, and the settings-driven gravity.
//!
//! Level geometry, coins, spikes and barrels are static bodies; the player is
//! the only dynamic body. Contact reactions read avian's `CollisionStarted`,
//! which fires once when a pair starts touching.
//!
//! ```ignore
//! commands.spawn((SpriteBundle::default(), character(Vec2::new(0.8, 1.0), 1.0), Tag::Player));
//! commands.spawn((SpriteBundle::default(), sensor(Vec2::splat(0.5), GameLayer::Pickup), Tag::Coin));
//! app.add_plugins(PhysicsPlugins::default());
//! app.add_systems(Update, (sync_gravity, clamp_fall_speed));
//! ```

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::settings::Settings;

/// Collision layers. The player collides with everything else; the other
/// layers only collide with the player.
#[derive(PhysicsLayer, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GameLayer {
    /// Walkable geometry (platforms, walls).
    #[default]
    Ground,
    Player,
    /// Coins and other things that are collected on touch.
    Pickup,
    /// Spikes.
    Hazard,
    /// Barrels.
    Obstacle,
}

/// Gameplay tag used by contact handlers to identify what they touched.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Player,
    Coin,
    Spikes,
    Barrel,
    Ground,
}

fn static_layers(layer: GameLayer) -> CollisionLayers {
    CollisionLayers::new(layer, GameLayer::Player)
}

/// Immovable box that blocks the player.
#[must_use]
pub fn solid(size: Vec2, layer: GameLayer) -> impl Bundle {
    (RigidBody::Static, Collider::rectangle(size.x, size.y), static_layers(layer))
}

/// Immovable box that reports contacts without blocking.
#[must_use]
pub fn sensor(size: Vec2, layer: GameLayer) -> impl Bundle {
    (RigidBody::Static, Collider::rectangle(size.x, size.y), Sensor, static_layers(layer))
}

/// Dynamic box for a character: no rotation, no friction or bounce, and a
/// mass that does not depend on the collider size.
#[must_use]
pub fn character(size: Vec2, mass: f32) -> impl Bundle {
    (
        RigidBody::Dynamic,
        Collider::rectangle(size.x, size.y),
        CollisionLayers::new(
            GameLayer::Player,
            [GameLayer::Ground, GameLayer::Pickup, GameLayer::Hazard, GameLayer::Obstacle],
        ),
        LockedAxes::ROTATION_LOCKED,
        Friction::ZERO.with_combine_rule(CoefficientCombine::Min),
        Restitution::ZERO.with_combine_rule(CoefficientCombine::Min),
        ColliderDensity(0.0),
        Mass(mass),
        ExternalImpulse::default(),
        SleepingDisabled,
    )
}

/// Spatial query filter that only sees colliders in `mask`.
#[must_use]
pub fn layer_filter(mask: u32) -> SpatialQueryFilter {
    SpatialQueryFilter::from_mask(LayerMask(mask))
}

/// Both orientations of a contact pair. `CollisionStarted` does not order its
/// entities, so handlers try each one as "the toucher".
#[must_use]
pub fn contact_pairs(event: &CollisionStarted) -> [(Entity, Entity); 2] {
    let CollisionStarted(a, b) = event;
    [(*a, *b), (*b, *a)]
}

/// Copy the configured gravity into avian whenever settings change.
#[allow(clippy::needless_pass_by_value)]
pub fn sync_gravity(settings: Res<Settings>, mut gravity: ResMut<Gravity>) {
    if !settings.is_changed() {
        return;
    }
    let wanted = Vec2::new(0.0, settings.physics.gravity);
    if gravity.0 != wanted {
        debug!("gravity set to {wanted}");
        gravity.0 = wanted;
    }
}

/// Cap the downward speed of dynamic bodies.
#[allow(clippy::needless_pass_by_value)]
pub fn clamp_fall_speed(settings: Res<Settings>, mut bodies: Query<(&RigidBody, &mut LinearVelocity)>) {
    let limit = settings.physics.max_fall_speed;
    for (body, mut velocity) in &mut bodies {
        if body.is_dynamic() && velocity.y < -limit {
            velocity.y = -limit;
        }
    }
}

/// Headless app with avian running one fixed step per 1/60 s update.
#[cfg(test)]
pub(crate) fn test_app() -> App {
    use bevy::time::TimeUpdateStrategy;
    use std::time::Duration;

    let mut app = App::new();
    // avian's `bevy_scene` feature reads this resource; DefaultPlugins provides it in the game
    app.init_resource::<bevy::scene::SceneSpawner>();
    app.add_plugins((MinimalPlugins, TransformPlugin, PhysicsPlugins::default()));
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(1.0 / 60.0)));
    app.insert_resource(Time::<Fixed>::from_hz(60.0));
    app
}
