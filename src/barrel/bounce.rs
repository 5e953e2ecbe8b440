//! Barrel contact handling and scheduled removal.

use super::{Barrel, BounceDecision, BounceEffects, ScheduledRemoval, SquashAnimation};
use crate::animation::{self, AnimationParams};
use crate::effects::ParticleBurst;
use crate::physics::{contact_pairs, Tag};
use crate::settings::Settings;
use avian2d::prelude::*;
use bevy::audio::Volume;
use bevy::prelude::*;

/// Entities named like the player's sprite count as the player even without
/// a tag, so hand-built test scenes keep working.
#[must_use]
pub fn looks_like_player(tag: Option<&Tag>, name: Option<&Name>) -> bool {
    tag == Some(&Tag::Player) || name.is_some_and(|n| n.as_str().contains("character"))
}

/// Bounce players that land on barrels.
#[allow(clippy::needless_pass_by_value)]
pub fn barrel_contacts(
    mut commands: Commands,
    settings: Res<Settings>,
    mut contacts: EventReader<CollisionStarted>,
    mut barrels: Query<(&mut Barrel, &Transform, Option<&BounceEffects>, Option<&mut AnimationParams>)>,
    identities: Query<(Option<&Tag>, Option<&Name>)>,
    mut bodies: Query<(&mut LinearVelocity, &mut ExternalImpulse), Without<Barrel>>,
    mut bursts: EventWriter<ParticleBurst>,
) {
    for (toucher, barrel_entity) in contacts.read().flat_map(contact_pairs) {
        let Ok((mut barrel, tf, effects, anim)) = barrels.get_mut(barrel_entity) else { continue };
        let (tag, name) = identities.get(toucher).unwrap_or((None, None));
        let is_player = looks_like_player(tag, name);
        let velocity_y = bodies.get(toucher).ok().map(|(v, _)| v.y);

        if barrel.debug {
            debug!(
                "barrel {barrel_entity:?} touched by {toucher:?} (name: {:?}, tag: {:?}, used: {})",
                name.map(Name::as_str),
                tag,
                barrel.used
            );
        }

        match barrel.evaluate(is_player, velocity_y) {
            BounceDecision::Bounce => {}
            BounceDecision::MissingBody => {
                error!("player {toucher:?} touched a barrel but has no rigid body");
                continue;
            }
            other => {
                if barrel.debug {
                    debug!("barrel {barrel_entity:?} did not bounce: {other:?}");
                }
                continue;
            }
        }

        let Ok((mut velocity, mut impulse)) = bodies.get_mut(toucher) else { continue };
        barrel.launch(&mut velocity, &mut impulse);
        if barrel.debug {
            debug!("barrel {barrel_entity:?} launched player with impulse {}", impulse.impulse());
        }

        if let Some(effects) = effects {
            if let Some(sound) = &effects.sound {
                commands.spawn(AudioBundle {
                    source: sound.clone(),
                    settings: PlaybackSettings::DESPAWN
                        .with_volume(Volume::new(settings.audio.effective_effects_volume())),
                });
            }
            if effects.particles {
                bursts.send(ParticleBurst::bounce(tf.translation.truncate()));
            }
        }

        match anim {
            Some(mut params) => {
                params.enabled = true;
                if params.has_parameter(animation::EXPLODE) {
                    params.set_trigger(animation::EXPLODE);
                }
            }
            None => warn!("barrel {barrel_entity:?} has no AnimationParams"),
        }

        let mut entity = commands.entity(barrel_entity);
        entity.insert(SquashAnimation::new(tf.scale, barrel.destroy_after_use));
        if barrel.destroy_after_use {
            if barrel.debug {
                debug!("barrel {barrel_entity:?} removal scheduled in {}s", barrel.destroy_delay);
            }
            entity.insert(ScheduledRemoval(Timer::from_seconds(barrel.destroy_delay.max(0.0), TimerMode::Once)));
        }
    }
}

/// Despawn entities whose removal timer has run out.
#[allow(clippy::needless_pass_by_value)]
pub fn tick_scheduled_removals(
    time: Res<Time>,
    mut commands: Commands,
    mut pending: Query<(Entity, &mut ScheduledRemoval)>,
) {
    for (entity, mut removal) in &mut pending {
        if removal.0.tick(time.delta()).finished() {
            debug!("removing {entity:?}");
            commands.entity(entity).despawn_recursive();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{clear_explode_flash, play_barrel_explode};
    use crate::barrel::animate_barrels;
    use crate::effects::ParticleBurst;
    use std::time::Duration;

    fn barrel_app() -> App {
        let mut app = App::new();
        app.init_resource::<Time>();
        app.insert_resource(Settings::default());
        app.add_event::<CollisionStarted>();
        app.add_event::<ParticleBurst>();
        app.add_systems(
            Update,
            (
                barrel_contacts,
                play_barrel_explode,
                animate_barrels,
                clear_explode_flash,
                tick_scheduled_removals,
            )
                .chain(),
        );
        app
    }

    fn spawn_player(app: &mut App, vy: f32) -> Entity {
        app.world_mut()
            .spawn((Tag::Player, LinearVelocity(Vec2::new(1.0, vy)), ExternalImpulse::default()))
            .id()
    }

    fn spawn_barrel(app: &mut App, barrel: Barrel) -> Entity {
        app.world_mut()
            .spawn((
                barrel,
                SpriteBundle::default(),
                AnimationParams::barrel(),
                BounceEffects { sound: None, particles: true },
            ))
            .id()
    }

    fn touch(app: &mut App, player: Entity, barrel: Entity) {
        app.world_mut().send_event(CollisionStarted(player, barrel));
    }

    fn step(app: &mut App, millis: u64) {
        app.world_mut().resource_mut::<Time>().advance_by(Duration::from_millis(millis));
        app.update();
    }

    fn impulse_y(app: &App, player: Entity) -> f32 {
        app.world().get::<ExternalImpulse>(player).unwrap().impulse().y
    }

    #[test]
    fn falling_player_is_launched_and_barrel_removed_after_delay() {
        let mut app = barrel_app();
        let player = spawn_player(&mut app, -2.0);
        let barrel = spawn_barrel(&mut app, Barrel::default());

        touch(&mut app, player, barrel);
        app.update();

        assert_eq!(app.world().get::<LinearVelocity>(player).unwrap().0, Vec2::new(1.0, 0.0));
        assert_eq!(impulse_y(&app, player), 15.0);
        assert!(app.world().get::<Barrel>(barrel).unwrap().used);
        assert!(app.world().get::<SquashAnimation>(barrel).is_some());
        assert!(app.world().get::<AnimationParams>(barrel).unwrap().enabled);
        assert_eq!(app.world().resource::<Events<ParticleBurst>>().len(), 1);

        step(&mut app, 300);
        assert!(app.world().get_entity(barrel).is_some());
        step(&mut app, 300);
        assert!(app.world().get_entity(barrel).is_none());
    }

    #[test]
    fn contact_order_does_not_matter() {
        let mut app = barrel_app();
        let player = spawn_player(&mut app, -2.0);
        let barrel = spawn_barrel(&mut app, Barrel::default());
        app.world_mut().send_event(CollisionStarted(barrel, player));
        app.update();
        assert_eq!(impulse_y(&app, player), 15.0);
    }

    #[test]
    fn second_contact_does_nothing() {
        let mut app = barrel_app();
        let player = spawn_player(&mut app, -2.0);
        let barrel = spawn_barrel(&mut app, Barrel::default());

        touch(&mut app, player, barrel);
        touch(&mut app, player, barrel);
        app.update();
        assert_eq!(impulse_y(&app, player), 15.0);

        app.world_mut().get_mut::<LinearVelocity>(player).unwrap().y = -4.0;
        touch(&mut app, player, barrel);
        app.update();
        assert_eq!(app.world().get::<LinearVelocity>(player).unwrap().y, -4.0);
        assert_eq!(impulse_y(&app, player), 15.0);
    }

    #[test]
    fn fast_rising_player_passes_through() {
        let mut app = barrel_app();
        let player = spawn_player(&mut app, 8.0);
        let barrel = spawn_barrel(&mut app, Barrel::default());
        touch(&mut app, player, barrel);
        app.update();
        assert_eq!(app.world().get::<LinearVelocity>(player).unwrap().y, 8.0);
        assert_eq!(impulse_y(&app, player), 0.0);
        assert!(!app.world().get::<Barrel>(barrel).unwrap().used);
    }

    #[test]
    fn named_character_counts_as_player() {
        let mut app = barrel_app();
        let player = app
            .world_mut()
            .spawn((Name::new("main_character"), LinearVelocity::default(), ExternalImpulse::default()))
            .id();
        let barrel = spawn_barrel(&mut app, Barrel::default());
        touch(&mut app, player, barrel);
        app.update();
        assert_eq!(impulse_y(&app, player), 15.0);
    }

    #[test]
    fn player_without_rigid_body_is_not_launched() {
        let mut app = barrel_app();
        let player = app.world_mut().spawn(Tag::Player).id();
        let barrel = spawn_barrel(&mut app, Barrel::default());
        touch(&mut app, player, barrel);
        app.update();
        assert!(!app.world().get::<Barrel>(barrel).unwrap().used);
    }

    #[test]
    fn reusable_barrel_explodes_on_every_bounce() {
        let mut app = barrel_app();
        let player = spawn_player(&mut app, -2.0);
        let barrel = spawn_barrel(&mut app, Barrel { destroy_after_use: false, ..default() });
        let idle = app.world().get::<Sprite>(barrel).unwrap().color;

        for bounce in 0..2 {
            app.world_mut().get_mut::<LinearVelocity>(player).unwrap().y = -2.0;
            touch(&mut app, player, barrel);
            app.update();
            assert!(app.world().get::<Barrel>(barrel).unwrap().used, "bounce {bounce}");
            assert!(app.world().get::<ScheduledRemoval>(barrel).is_none());
            let params = app.world().get::<AnimationParams>(barrel).unwrap();
            assert_eq!(
                params.get(animation::EXPLODE),
                Some(animation::ParamValue::Trigger(false)),
                "explode trigger not consumed on bounce {bounce}"
            );
            assert_ne!(app.world().get::<Sprite>(barrel).unwrap().color, idle);

            // compress, expand and oscillate take 0.6 s
            for _ in 0..50 {
                step(&mut app, 16);
            }
            assert!(!app.world().get::<Barrel>(barrel).unwrap().used, "barrel did not reset after bounce {bounce}");
            assert_eq!(app.world().get::<Sprite>(barrel).unwrap().color, idle);
        }
        assert_eq!(impulse_y(&app, player), 30.0);
    }
}
