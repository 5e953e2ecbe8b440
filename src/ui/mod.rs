//! User interface helpers: the coin counter HUD and the debug overlay.
//!
//! The coin counter is part of the level (it is despawned and respawned with
//! it). The overlay is spawned once at startup and refreshed on a timer with
//! FPS and the player's physics state.

use avian2d::prelude::LinearVelocity;
use crate::player::{CoinPurse, PlayerController};
use crate::settings::Settings;
use bevy::diagnostic::{Diagnostic, DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;

/// Marks the text element showing the coin count.
#[derive(Component)]
pub struct CoinCounterText;

#[must_use]
pub fn coin_text(coins: u32) -> String {
    format!("Coins: {coins}")
}

/// HUD text showing the coin counter in the top-right corner.
#[must_use]
pub fn coin_counter_bundle() -> (TextBundle, CoinCounterText) {
    (
        TextBundle {
            text: Text::from_section(
                coin_text(0),
                TextStyle { font_size: 28.0, color: Color::WHITE, ..default() },
            ),
            style: Style {
                position_type: PositionType::Absolute,
                right: Val::Px(16.0),
                top: Val::Px(12.0),
                ..default()
            },
            ..default()
        },
        CoinCounterText,
    )
}

/// Write the coin count into the HUD whenever a purse changes.
#[allow(clippy::needless_pass_by_value)]
pub fn refresh_coin_text(
    purses: Query<&CoinPurse, Changed<CoinPurse>>,
    mut texts: Query<&mut Text, With<CoinCounterText>>,
) {
    let Some(purse) = purses.iter().next() else { return };
    for mut text in &mut texts {
        text.sections[0].value = coin_text(purse.coins);
    }
}

/// State for the debug overlay visibility.
#[derive(Resource, Default)]
pub struct DebugOverlayState {
    /// Whether the overlay is currently visible.
    pub visible: bool,
}

#[derive(Resource, Default)]
pub struct DebugOverlayTimer(pub Timer);

#[derive(Component)]
pub struct DebugOverlayText;

pub fn setup_debug_overlay(mut commands: Commands) {
    commands.insert_resource(DebugOverlayTimer(Timer::from_seconds(
        0.25,
        TimerMode::Repeating,
    )));
    commands.insert_resource(DebugOverlayState::default());
}

pub fn spawn_debug_overlay(mut commands: Commands) {
    commands.spawn((
        TextBundle {
            text: Text::from_section(
                "",
                TextStyle { font_size: 18.0, color: Color::srgb(1.0, 1.0, 0.0), ..default() },
            ),
            style: Style {
                position_type: PositionType::Absolute,
                left: Val::Px(10.0),
                top: Val::Px(10.0),
                ..default()
            },
            ..default()
        },
        DebugOverlayText,
    ));
}

/// Toggle the debug overlay on the `toggle_debug` key (F1 by default).
#[allow(clippy::needless_pass_by_value)]
pub fn toggle_debug_overlay(
    mut state: ResMut<DebugOverlayState>,
    settings: Res<Settings>,
    input: Res<ButtonInput<KeyCode>>,
) {
    if input.just_pressed(settings.controls.key("toggle_debug", KeyCode::F1)) {
        state.visible = !state.visible;
    }
}

/// Snapshot of the player shown by the overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerReadout {
    pub position: Vec2,
    pub velocity: Vec2,
    pub grounded: bool,
    pub coins: u32,
}

#[must_use]
pub fn overlay_text(fps: f64, frame_time: f64, player: Option<PlayerReadout>) -> String {
    let player = player.map_or_else(
        || "Player: N/A".to_string(),
        |p| {
            format!(
                "Pos: ({:.2}, {:.2})\nVel: ({:.2}, {:.2})\nGrounded: {}\nCoins: {}",
                p.position.x, p.position.y, p.velocity.x, p.velocity.y, p.grounded, p.coins
            )
        },
    );
    format!("FPS: {fps:.1}\nFrame Time: {:.2} ms\n{player}", frame_time * 1000.0)
}

#[derive(bevy::ecs::system::SystemParam)]
pub struct DebugOverlayCtx<'w, 's> {
    pub diagnostics: Option<Res<'w, DiagnosticsStore>>,
    pub state: Res<'w, DebugOverlayState>,
    pub time: Res<'w, Time>,
    pub timer: ResMut<'w, DebugOverlayTimer>,
    pub query: Query<'w, 's, &'static mut Text, With<DebugOverlayText>>,
    pub player_query: Query<
        'w,
        's,
        (&'static Transform, &'static LinearVelocity, &'static PlayerController, &'static CoinPurse),
    >,
}

/// Refresh the overlay text once every timer interval.
pub fn update_debug_overlay(mut ctx: DebugOverlayCtx<'_, '_>) {
    if !ctx.timer.0.tick(ctx.time.delta()).just_finished() {
        return;
    }

    let Ok(mut text) = ctx.query.get_single_mut() else { return };

    if !ctx.state.visible {
        text.sections[0].value = String::new();
        return;
    }

    let smoothed = |path: &bevy::diagnostic::DiagnosticPath| {
        ctx.diagnostics
            .as_ref()
            .and_then(|d| d.get(path))
            .and_then(Diagnostic::smoothed)
            .unwrap_or(0.0)
    };
    let fps = smoothed(&FrameTimeDiagnosticsPlugin::FPS);
    let frame_time = smoothed(&FrameTimeDiagnosticsPlugin::FRAME_TIME);

    let player = ctx.player_query.iter().next().map(|(tf, velocity, controller, purse)| PlayerReadout {
        position: tf.translation.truncate(),
        velocity: velocity.0,
        grounded: controller.is_grounded,
        coins: purse.coins,
    });

    text.sections[0].value = overlay_text(fps, frame_time, player);
}
