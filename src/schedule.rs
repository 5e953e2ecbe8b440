//! Frame ordering for the gameplay systems.
//!
//! avian steps the simulation in the fixed schedule before `Update`. Each
//! `Update` then runs input and ground checks, the physics settings, the
//! contact reactions, the camera and presentation, in that order.
//! `GameplayPlugin` adds avian and wires all gameplay systems into these
//! sets; windowing, file watchers and debug tooling are added by the binary.

use bevy::prelude::*;

use avian2d::prelude::PhysicsPlugins;

use crate::animation::{apply_player_pose, clear_explode_flash, play_barrel_explode};
use crate::barrel::{animate_barrels, barrel_contacts, tick_scheduled_removals};
use crate::camera::{camera_follow, init_camera_follow};
use crate::effects::{spawn_particle_bursts, update_particles, ParticleBurst};
use crate::level::{reload_level, ActiveLevel, ReloadLevel};
use crate::physics::{clamp_fall_speed, sync_gravity};
use crate::player::{
    player_contacts, player_movement, sync_input_bindings, update_ground_state, validate_player,
    InputBindings,
};
use crate::ui::refresh_coin_text;

#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameSet {
    Input,
    Physics,
    Reactions,
    Camera,
    Presentation,
}

pub struct GameplayPlugin;

impl Plugin for GameplayPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(PhysicsPlugins::default())
            .init_resource::<InputBindings>()
            .init_resource::<ActiveLevel>()
            .add_event::<ReloadLevel>()
            .add_event::<ParticleBurst>()
            .configure_sets(
                Update,
                (
                    GameSet::Input,
                    GameSet::Physics,
                    GameSet::Reactions,
                    GameSet::Camera,
                    GameSet::Presentation,
                )
                    .chain(),
            )
            .add_systems(
                Update,
                (sync_input_bindings, validate_player, update_ground_state, player_movement)
                    .chain()
                    .in_set(GameSet::Input),
            )
            .add_systems(Update, (sync_gravity, clamp_fall_speed).in_set(GameSet::Physics))
            .add_systems(
                Update,
                (
                    player_contacts,
                    barrel_contacts,
                    play_barrel_explode,
                    animate_barrels,
                    clear_explode_flash,
                    tick_scheduled_removals,
                    spawn_particle_bursts,
                    update_particles,
                    // last, so nothing above queues commands for entities it despawns
                    reload_level,
                )
                    .chain()
                    .in_set(GameSet::Reactions),
            )
            .add_systems(
                Update,
                (init_camera_follow, camera_follow).chain().in_set(GameSet::Camera),
            )
            .add_systems(
                Update,
                (apply_player_pose, refresh_coin_text).in_set(GameSet::Presentation),
            );
    }
}
