//! Level descriptions and the scene lifecycle.
//!
//! A level is a RON file in `data/levels/` listing where the player starts,
//! how the camera behaves and which platforms, coins, spikes and barrels
//! exist. Everything spawned from a level carries [`LevelEntity`], so a
//! reload is "despawn all level entities, spawn the description again".
//!
//! ```ignore
//! app.insert_resource(loader::load_levels_from_dir(LEVELS_DIR))
//!     .insert_resource(ActiveLevel("level_1".into()))
//!     .add_event::<ReloadLevel>()
//!     .add_systems(Startup, spawn_active_level)
//!     .add_systems(Update, reload_level);
//! ```
pub mod loader;

use bevy::prelude::*;
use bevy::utils::HashMap;
use serde::Deserialize;

use crate::animation::AnimationParams;
use crate::barrel::{Barrel, BounceEffects};
use crate::camera::{CameraBounds, CameraFollow, DEFAULT_OFFSET};
use crate::physics::{self, GameLayer, Tag};
use crate::player::{CoinPurse, PlayerController};
use crate::settings::Settings;
use crate::ui::coin_counter_bundle;

pub const LEVELS_DIR: &str = "data/levels";

pub const PLAYER_SIZE: Vec2 = Vec2::new(0.8, 1.0);
pub const COIN_SIZE: f32 = 0.5;
pub const BARREL_SIZE: Vec2 = Vec2::new(1.0, 1.2);

/// Axis-aligned box placed in the level.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct BoxDescription {
    pub position: (f32, f32),
    pub size: (f32, f32),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BarrelDescription {
    pub position: (f32, f32),
    #[serde(default = "BarrelDescription::default_bounce_force")]
    pub bounce_force: f32,
    #[serde(default = "BarrelDescription::default_destroy_after_use")]
    pub destroy_after_use: bool,
    #[serde(default = "BarrelDescription::default_destroy_delay")]
    pub destroy_delay: f32,
    /// Asset path of a sound played on bounce.
    #[serde(default)]
    pub sound: Option<String>,
    #[serde(default)]
    pub particles: bool,
}

impl BarrelDescription {
    fn default_bounce_force() -> f32 { 15.0 }
    fn default_destroy_after_use() -> bool { true }
    fn default_destroy_delay() -> f32 { 0.5 }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CameraDescription {
    /// Zero or missing means the default follow offset.
    #[serde(default)]
    pub offset: Option<(f32, f32, f32)>,
    /// Overrides `settings.camera.smooth_speed`.
    #[serde(default)]
    pub smooth_speed: Option<f32>,
    #[serde(default)]
    pub bounds: Option<CameraBounds>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LevelDescription {
    pub name: String,
    #[serde(default)]
    pub player_spawn: (f32, f32),
    #[serde(default)]
    pub camera: CameraDescription,
    #[serde(default)]
    pub platforms: Vec<BoxDescription>,
    #[serde(default)]
    pub coins: Vec<(f32, f32)>,
    #[serde(default)]
    pub spikes: Vec<BoxDescription>,
    #[serde(default)]
    pub barrels: Vec<BarrelDescription>,
}

/// All known levels, keyed by name.
#[derive(Resource, Debug, Default)]
pub struct LevelRegistry {
    pub levels: HashMap<String, LevelDescription>,
}

impl LevelRegistry {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&LevelDescription> {
        self.levels.get(name)
    }

    pub fn insert(&mut self, level: LevelDescription) {
        self.levels.insert(level.name.clone(), level);
    }
}

/// Name of the level currently in play.
#[derive(Resource, Debug, Clone, PartialEq, Eq)]
pub struct ActiveLevel(pub String);

impl Default for ActiveLevel {
    fn default() -> Self {
        ActiveLevel("level_1".to_string())
    }
}

/// Ask for the named level to be torn down and spawned again.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct ReloadLevel {
    pub name: String,
}

/// Everything spawned from a level description carries this marker.
#[derive(Component, Debug, Clone, Copy)]
pub struct LevelEntity;

fn v2((x, y): (f32, f32)) -> Vec2 {
    Vec2::new(x, y)
}

fn solid_box(desc: BoxDescription, color: Color, layer: GameLayer, tag: Tag) -> impl Bundle {
    let size = v2(desc.size);
    (
        SpriteBundle {
            sprite: Sprite { color, custom_size: Some(size), ..default() },
            transform: Transform::from_translation(v2(desc.position).extend(0.0)),
            ..default()
        },
        physics::solid(size, layer),
        tag,
        LevelEntity,
    )
}

/// Spawn every entity described by `level`.
///
/// `assets` is only needed for barrel sounds; without it barrels stay silent.
pub fn spawn_level(
    commands: &mut Commands,
    level: &LevelDescription,
    settings: &Settings,
    assets: Option<&AssetServer>,
) {
    let mut camera = Camera2dBundle::default();
    camera.projection.scale = settings.camera.projection_scale;
    let spawn = v2(level.player_spawn);
    camera.transform.translation.x = spawn.x;
    camera.transform.translation.y = spawn.y;
    let offset = level.camera.offset.map_or(DEFAULT_OFFSET, |(x, y, z)| Vec3::new(x, y, z));
    commands.spawn((
        camera,
        CameraFollow {
            target: None,
            offset,
            smooth_speed: level.camera.smooth_speed.unwrap_or(settings.camera.smooth_speed),
            bounds: level.camera.bounds,
        },
        LevelEntity,
    ));

    commands.spawn((coin_counter_bundle(), LevelEntity));

    commands.spawn((
        SpriteBundle {
            sprite: Sprite { color: Color::srgb(0.3, 0.6, 1.0), custom_size: Some(PLAYER_SIZE), ..default() },
            transform: Transform::from_translation(spawn.extend(1.0)),
            ..default()
        },
        Name::new("player_character"),
        PlayerController::from_settings(settings),
        CoinPurse::default(),
        physics::character(PLAYER_SIZE, settings.player.mass),
        AnimationParams::player(),
        Tag::Player,
        LevelEntity,
    ));

    for platform in &level.platforms {
        commands.spawn(solid_box(*platform, Color::srgb(0.35, 0.3, 0.25), GameLayer::Ground, Tag::Ground));
    }
    for spikes in &level.spikes {
        commands.spawn(solid_box(*spikes, Color::srgb(0.85, 0.15, 0.15), GameLayer::Hazard, Tag::Spikes));
    }

    for &coin in &level.coins {
        commands.spawn((
            SpriteBundle {
                sprite: Sprite {
                    color: Color::srgb(1.0, 0.85, 0.1),
                    custom_size: Some(Vec2::splat(COIN_SIZE)),
                    ..default()
                },
                transform: Transform::from_translation(v2(coin).extend(0.5)),
                ..default()
            },
            physics::sensor(Vec2::splat(COIN_SIZE), GameLayer::Pickup),
            Tag::Coin,
            LevelEntity,
        ));
    }

    for desc in &level.barrels {
        let sound = desc.sound.as_ref().and_then(|path| assets.map(|a| a.load(path.clone())));
        commands.spawn((
            SpriteBundle {
                sprite: Sprite {
                    color: Color::srgb(0.55, 0.35, 0.15),
                    custom_size: Some(BARREL_SIZE),
                    ..default()
                },
                transform: Transform::from_translation(v2(desc.position).extend(0.5)),
                ..default()
            },
            Barrel::new(desc.bounce_force, desc.destroy_after_use, desc.destroy_delay, settings),
            BounceEffects { sound, particles: desc.particles },
            AnimationParams::barrel(),
            physics::sensor(BARREL_SIZE, GameLayer::Obstacle),
            Tag::Barrel,
            LevelEntity,
        ));
    }

    info!(
        "spawned level '{}': {} platforms, {} coins, {} spikes, {} barrels",
        level.name,
        level.platforms.len(),
        level.coins.len(),
        level.spikes.len(),
        level.barrels.len()
    );
}

/// Startup system: spawn the active level.
#[allow(clippy::needless_pass_by_value)]
pub fn spawn_active_level(
    mut commands: Commands,
    registry: Res<LevelRegistry>,
    active: Res<ActiveLevel>,
    settings: Res<Settings>,
    assets: Option<Res<AssetServer>>,
) {
    match registry.get(&active.0) {
        Some(level) => spawn_level(&mut commands, level, &settings, assets.as_deref()),
        None => error!("level '{}' not found in {LEVELS_DIR}", active.0),
    }
}

/// Tear down and respawn a level on [`ReloadLevel`].
///
/// Several requests in one frame collapse into the last one. An unknown
/// level name is logged and leaves the current scene untouched.
#[allow(clippy::needless_pass_by_value)]
pub fn reload_level(
    mut commands: Commands,
    mut requests: EventReader<ReloadLevel>,
    registry: Res<LevelRegistry>,
    mut active: ResMut<ActiveLevel>,
    settings: Res<Settings>,
    assets: Option<Res<AssetServer>>,
    spawned: Query<Entity, With<LevelEntity>>,
) {
    let Some(request) = requests.read().last() else { return };
    let Some(level) = registry.get(&request.name) else {
        error!("cannot reload unknown level '{}'", request.name);
        return;
    };

    info!("reloading level '{}'", level.name);
    for entity in &spawned {
        commands.entity(entity).despawn_recursive();
    }
    spawn_level(&mut commands, level, &settings, assets.as_deref());
    if active.0 != level.name {
        active.0.clone_from(&level.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ron_loader::parse_ron;

    const LEVEL: &str = r#"(
        name: "test",
        player_spawn: (1.0, 2.0),
        camera: (bounds: Some((min_x: 0.0, max_x: 20.0, min_y: -2.0, max_y: 6.0))),
        platforms: [(position: (0.0, -1.0), size: (20.0, 1.0))],
        coins: [(3.0, 0.5), (4.0, 0.5)],
        spikes: [(position: (8.0, -0.25), size: (2.0, 0.5))],
        barrels: [(position: (6.0, 0.1), sound: Some("sounds/boing.wav"), particles: true)],
    )"#;

    fn level_app() -> App {
        let mut registry = LevelRegistry::default();
        registry.insert(parse_ron(LEVEL).unwrap());
        let mut app = App::new();
        app.insert_resource(registry);
        app.insert_resource(ActiveLevel("test".into()));
        app.insert_resource(Settings::default());
        app.add_event::<ReloadLevel>();
        app.add_systems(Startup, spawn_active_level);
        app.add_systems(Update, reload_level);
        app
    }

    fn count<T: Component>(app: &mut App) -> usize {
        app.world_mut().query_filtered::<Entity, With<T>>().iter(app.world()).count()
    }

    #[test]
    fn parses_with_defaults() {
        let level: LevelDescription = parse_ron(LEVEL).unwrap();
        assert_eq!(level.player_spawn, (1.0, 2.0));
        assert_eq!(level.camera.offset, None);
        assert_eq!(level.camera.bounds.unwrap().max_x, 20.0);
        let barrel = &level.barrels[0];
        assert_eq!(barrel.bounce_force, 15.0);
        assert!(barrel.destroy_after_use);
        assert_eq!(barrel.destroy_delay, 0.5);
        assert_eq!(barrel.sound.as_deref(), Some("sounds/boing.wav"));

        let bare: LevelDescription = parse_ron(r#"(name: "empty")"#).unwrap();
        assert!(bare.platforms.is_empty() && bare.barrels.is_empty());
    }

    #[test]
    fn spawns_every_described_entity() {
        let mut app = level_app();
        app.update();

        assert_eq!(count::<PlayerController>(&mut app), 1);
        assert_eq!(count::<CameraFollow>(&mut app), 1);
        assert_eq!(count::<Barrel>(&mut app), 1);
        let tags: Vec<Tag> = app.world_mut().query::<&Tag>().iter(app.world()).copied().collect();
        assert_eq!(tags.iter().filter(|t| **t == Tag::Coin).count(), 2);
        assert_eq!(tags.iter().filter(|t| **t == Tag::Spikes).count(), 1);
        assert_eq!(tags.iter().filter(|t| **t == Tag::Ground).count(), 1);

        let follow = app.world_mut().query::<&CameraFollow>().single(app.world()).clone();
        assert_eq!(follow.offset, DEFAULT_OFFSET);
        assert_eq!(follow.smooth_speed, 0.125);
        assert!(follow.bounds.is_some());

        // no asset server in this app, so the sound is dropped
        let effects = app.world_mut().query::<&BounceEffects>().single(app.world()).clone();
        assert!(effects.sound.is_none() && effects.particles);
    }

    #[test]
    fn reload_resets_transient_state() {
        let mut app = level_app();
        app.update();
        let before = count::<LevelEntity>(&mut app);

        let (player, mut tf, mut purse) = {
            let mut q = app.world_mut().query::<(Entity, &Transform, &CoinPurse)>();
            let (e, tf, purse) = q.single(app.world());
            (e, *tf, *purse)
        };
        tf.translation.x = 50.0;
        purse.coins = 4;
        app.world_mut().entity_mut(player).insert((tf, purse));

        app.world_mut().send_event(ReloadLevel { name: "test".into() });
        app.update();

        assert_eq!(count::<LevelEntity>(&mut app), before);
        assert!(app.world().get_entity(player).is_none());
        let (tf, purse) = app
            .world_mut()
            .query::<(&Transform, &CoinPurse)>()
            .single(app.world());
        assert_eq!(tf.translation.truncate(), Vec2::new(1.0, 2.0));
        assert_eq!(purse.coins, 0);
    }

    #[test]
    fn unknown_level_leaves_scene_alone() {
        let mut app = level_app();
        app.update();
        let before = count::<LevelEntity>(&mut app);
        app.world_mut().send_event(ReloadLevel { name: "nope".into() });
        app.update();
        assert_eq!(count::<LevelEntity>(&mut app), before);
        assert_eq!(app.world().resource::<ActiveLevel>().0, "test");
    }
}
