//! Player contact reactions: coins and spikes, plus spawn-time wiring checks.

use super::{CoinPurse, MissingBody, PlayerController};
use crate::animation::AnimationParams;
use crate::level::{ActiveLevel, ReloadLevel};
use crate::physics::{contact_pairs, Tag};
use avian2d::prelude::*;
use bevy::prelude::*;
use bevy::utils::HashSet;

/// Report players spawned without their required or optional components.
///
/// A missing `RigidBody` is fatal for that player: it is marked with
/// [`MissingBody`] and the per-frame player systems skip it from then on. A
/// missing animation table only disables the animation writes.
pub fn validate_player(
    mut commands: Commands,
    players: Query<(Entity, Has<RigidBody>, Has<AnimationParams>), Added<PlayerController>>,
) {
    for (entity, has_body, has_anim) in &players {
        if !has_body {
            error!("player {entity:?} needs a RigidBody component; movement and jumping are disabled");
            commands.entity(entity).insert(MissingBody);
        }
        if !has_anim {
            warn!("player {entity:?} has no AnimationParams; animations will not play");
        }
    }
}

/// React to coin and spike contacts.
///
/// Coins are counted at most once, even when several contacts with the same
/// coin are reported before its despawn is applied. Touching spikes asks for
/// the active level to be reloaded.
#[allow(clippy::needless_pass_by_value)]
pub fn player_contacts(
    mut commands: Commands,
    mut contacts: EventReader<CollisionStarted>,
    mut players: Query<(&PlayerController, &mut CoinPurse)>,
    tags: Query<&Tag>,
    active: Res<ActiveLevel>,
    mut reload: EventWriter<ReloadLevel>,
) {
    let mut taken: HashSet<Entity> = HashSet::default();
    let mut reload_requested = false;

    for (player, other) in contacts.read().flat_map(contact_pairs) {
        let Ok((controller, mut purse)) = players.get_mut(player) else { continue };
        let Ok(tag) = tags.get(other) else { continue };

        match tag {
            Tag::Coin => {
                if !taken.insert(other) {
                    continue;
                }
                purse.coins += 1;
                if controller.debug {
                    debug!("coin collected, total: {}", purse.coins);
                }
                commands.entity(other).despawn_recursive();
            }
            Tag::Spikes => {
                if controller.debug {
                    debug!("touched spikes, restarting level");
                }
                reload_requested = true;
            }
            _ => {}
        }
    }

    if reload_requested {
        reload.send(ReloadLevel { name: active.0.clone() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics;
    use crate::player::{player_movement, update_ground_state, InputBindings};

    fn contact_app() -> App {
        let mut app = App::new();
        app.add_event::<CollisionStarted>();
        app.add_event::<ReloadLevel>();
        app.insert_resource(ActiveLevel("level_1".into()));
        app.add_systems(Update, player_contacts);
        app
    }

    fn spawn_player(app: &mut App) -> Entity {
        app.world_mut()
            .spawn((PlayerController::default(), CoinPurse::default(), LinearVelocity::default(), Tag::Player))
            .id()
    }

    #[test]
    fn coin_increments_once_and_despawns() {
        let mut app = contact_app();
        let player = spawn_player(&mut app);
        let coin = app.world_mut().spawn(Tag::Coin).id();

        app.world_mut().send_event(CollisionStarted(player, coin));
        app.world_mut().send_event(CollisionStarted(coin, player));
        app.update();

        assert_eq!(app.world().get::<CoinPurse>(player).unwrap().coins, 1);
        assert!(app.world().get_entity(coin).is_none());
    }

    #[test]
    fn spikes_request_reload_of_active_level() {
        let mut app = contact_app();
        let player = spawn_player(&mut app);
        let spikes = app.world_mut().spawn(Tag::Spikes).id();

        app.world_mut().send_event(CollisionStarted(spikes, player));
        app.update();

        let reloads: Vec<ReloadLevel> = app
            .world_mut()
            .resource_mut::<Events<ReloadLevel>>()
            .drain()
            .collect();
        assert_eq!(reloads, vec![ReloadLevel { name: "level_1".into() }]);
    }

    #[test]
    fn non_player_contacts_are_ignored() {
        let mut app = contact_app();
        let crate_box = app.world_mut().spawn(LinearVelocity::default()).id();
        let coin = app.world_mut().spawn(Tag::Coin).id();
        app.world_mut().send_event(CollisionStarted(crate_box, coin));
        app.update();
        assert!(app.world().get_entity(coin).is_some());
    }

    #[test]
    fn player_without_rigid_body_is_marked_and_left_alone() {
        let mut app = physics::test_app();
        app.init_resource::<ButtonInput<KeyCode>>();
        app.init_resource::<InputBindings>();
        app.add_systems(Update, (validate_player, update_ground_state, player_movement).chain());
        app.world_mut().spawn((
            TransformBundle::from_transform(Transform::from_xyz(0.0, -1.0, 0.0)),
            physics::solid(Vec2::new(10.0, 1.0), physics::GameLayer::Ground),
        ));
        let player = app
            .world_mut()
            .spawn((
                TransformBundle::default(),
                LinearVelocity::default(),
                PlayerController::default(),
                AnimationParams::player(),
            ))
            .id();

        app.world_mut().resource_mut::<ButtonInput<KeyCode>>().press(KeyCode::KeyA);
        for _ in 0..3 {
            app.update();
        }

        assert!(app.world().get::<MissingBody>(player).is_some());
        let controller = app.world().get::<PlayerController>(player).unwrap();
        assert!(!controller.is_grounded);
        assert!(controller.facing_right);
        assert_eq!(app.world().get::<Transform>(player).unwrap().scale, Vec3::ONE);
        assert_eq!(app.world().get::<LinearVelocity>(player).unwrap().0, Vec2::ZERO);
    }

    #[test]
    fn player_without_animation_table_still_gets_a_body() {
        let mut app = App::new();
        app.add_systems(Update, validate_player);
        let player = app
            .world_mut()
            .spawn((RigidBody::Dynamic, PlayerController::default()))
            .id();
        app.update();
        assert!(app.world().get::<MissingBody>(player).is_none());
    }
}
