//! Debug utilities: gizmos for ground checks and barrel areas (F2 default),
//! and a system (F3 default) that dumps diagnostics, gameplay state and
//! memory usage to a timestamped text file in './debug-dumps/'.
//!
//! The dump is a quick way to capture what the game thinks is going on
//! without attaching a debugger.
use bevy::diagnostic::{Diagnostic, DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;
use avian2d::prelude::{ColliderAabb, LinearVelocity};
use chrono::{DateTime, Utc};
use std::fmt::Write;
use std::fs;
use sysinfo::{Pid, PidExt, ProcessExt, System, SystemExt};

use crate::barrel::Barrel;
use crate::level::ActiveLevel;
use crate::player::{CoinPurse, PlayerController};
use crate::settings::Settings;

pub const DUMP_DIR: &str = "debug-dumps";

/// Whether debug gizmos are drawn.
#[derive(Resource, Debug, Default)]
pub struct GizmoState {
    pub visible: bool,
}

#[allow(clippy::needless_pass_by_value)]
pub fn toggle_gizmos(
    mut state: ResMut<GizmoState>,
    settings: Res<Settings>,
    input: Res<ButtonInput<KeyCode>>,
) {
    if input.just_pressed(settings.controls.key("toggle_gizmos", KeyCode::F2)) {
        state.visible = !state.visible;
    }
}

/// Ground-check circle (green grounded, red airborne) and ray (blue) for
/// each player, plus the bounce area of each barrel (yellow idle, red used).
#[allow(clippy::needless_pass_by_value)]
pub fn draw_gizmos(
    state: Res<GizmoState>,
    mut gizmos: Gizmos,
    players: Query<(&Transform, &PlayerController)>,
    barrels: Query<(&ColliderAabb, &Barrel)>,
) {
    if !state.visible {
        return;
    }

    for (tf, controller) in &players {
        let origin = tf.translation.truncate();
        let color = if controller.is_grounded {
            Color::srgb(0.0, 1.0, 0.0)
        } else {
            Color::srgb(1.0, 0.0, 0.0)
        };
        gizmos.circle_2d(origin + controller.ground_check_offset, controller.ground_check_radius, color);
        gizmos.line_2d(
            origin,
            origin - Vec2::Y * controller.ground_check_distance,
            Color::srgb(0.0, 0.0, 1.0),
        );
    }

    for (aabb, barrel) in &barrels {
        let color = if barrel.used { Color::srgb(1.0, 0.0, 0.0) } else { Color::srgb(1.0, 1.0, 0.0) };
        gizmos.rect_2d((aabb.min + aabb.max) * 0.5, 0.0, aabb.max - aabb.min, color);
    }
}

pub struct DebugDumpPlugin;

impl Plugin for DebugDumpPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GizmoState>()
            .add_systems(Update, (toggle_gizmos, draw_gizmos).chain())
            .add_systems(Update, debug_input_system);
    }
}

fn bytes_to_mb(bytes: u64) -> String {
    format!("{:.2} MB", (bytes as f64) / 1024.0 / 1024.0)
}

/// Everything written to a dump, gathered before formatting.
#[derive(Debug, Clone, Default)]
pub struct DumpSnapshot {
    pub timestamp: DateTime<Utc>,
    pub fps: f64,
    pub frame_time: f64,
    pub entities: usize,
    pub level: String,
    pub barrels_idle: usize,
    pub barrels_used: usize,
    /// position, velocity, grounded, facing right, coins
    pub players: Vec<(Vec3, Vec2, bool, bool, u32)>,
    pub process_memory: u64,
    pub process_virtual: u64,
    pub system_total: u64,
    pub system_used: u64,
}

#[must_use]
pub fn format_dump(s: &DumpSnapshot) -> String {
    let mut out = String::new();
    writeln!(out, "Debug dump: {}", s.timestamp.timestamp()).ok();
    writeln!(out, "Timestamp: {}", s.timestamp.format("%Y-%m-%d %H:%M:%S")).ok();
    writeln!(out, "FPS: {:.1}, frame_time: {:.4} ms", s.fps, s.frame_time * 1000.0).ok();
    writeln!(out, "Entities: {}", s.entities).ok();
    writeln!(out, "Level: {}", s.level).ok();
    writeln!(out, "Barrels: idle={} used={}", s.barrels_idle, s.barrels_used).ok();
    if s.players.is_empty() {
        writeln!(out, "Player: (none)").ok();
    }
    for (pos, vel, grounded, facing_right, coins) in &s.players {
        writeln!(
            out,
            "Player: pos=({:.2}, {:.2}) vel=({:.2}, {:.2}) grounded={} facing={} coins={}",
            pos.x,
            pos.y,
            vel.x,
            vel.y,
            grounded,
            if *facing_right { "right" } else { "left" },
            coins
        )
        .ok();
    }
    writeln!(
        out,
        "Process memory: {} (virtual {})",
        bytes_to_mb(s.process_memory),
        bytes_to_mb(s.process_virtual)
    )
    .ok();
    writeln!(
        out,
        "System memory: total={} used={}",
        bytes_to_mb(s.system_total),
        bytes_to_mb(s.system_used)
    )
    .ok();
    out
}

/// Write a dump when the `dump_debug` key (F3 by default) is pressed.
#[allow(clippy::needless_pass_by_value)]
fn debug_input_system(
    keys: Res<ButtonInput<KeyCode>>,
    settings: Res<Settings>,
    diagnostics: Option<Res<DiagnosticsStore>>,
    active: Option<Res<ActiveLevel>>,
    entities: Query<Entity>,
    barrels: Query<&Barrel>,
    players: Query<(&Transform, &LinearVelocity, &PlayerController, &CoinPurse)>,
) {
    if !keys.just_pressed(settings.controls.key("dump_debug", KeyCode::F3)) {
        return;
    }

    let smoothed = |path: &bevy::diagnostic::DiagnosticPath| {
        diagnostics
            .as_ref()
            .and_then(|d| d.get(path))
            .and_then(Diagnostic::smoothed)
            .unwrap_or(0.0)
    };

    let mut sys = System::new_all();
    sys.refresh_all();
    let proc = sys.process(Pid::from_u32(std::process::id()));

    let used = barrels.iter().filter(|b| b.used).count();
    let snapshot = DumpSnapshot {
        timestamp: Utc::now(),
        fps: smoothed(&FrameTimeDiagnosticsPlugin::FPS),
        frame_time: smoothed(&FrameTimeDiagnosticsPlugin::FRAME_TIME),
        entities: entities.iter().count(),
        level: active.map_or_else(|| "(none)".to_string(), |a| a.0.clone()),
        barrels_idle: barrels.iter().count() - used,
        barrels_used: used,
        players: players
            .iter()
            .map(|(tf, velocity, c, purse)| (tf.translation, velocity.0, c.is_grounded, c.facing_right, purse.coins))
            .collect(),
        process_memory: proc.map_or(0, ProcessExt::memory),
        process_virtual: proc.map_or(0, ProcessExt::virtual_memory),
        system_total: sys.total_memory(),
        system_used: sys.used_memory(),
    };

    let fname = format!("{DUMP_DIR}/debug-{}.txt", snapshot.timestamp.timestamp());
    if let Err(e) = fs::create_dir_all(DUMP_DIR) {
        error!("debug dump: failed to create dir '{DUMP_DIR}': {e}");
        return;
    }
    if let Err(e) = fs::write(&fname, format_dump(&snapshot)) {
        error!("debug dump: failed to write {fname}: {e}");
    } else {
        info!("wrote debug dump: {fname}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump_lists_gameplay_state() {
        let snapshot = DumpSnapshot {
            entities: 12,
            level: "level_1".into(),
            barrels_idle: 2,
            barrels_used: 1,
            players: vec![(Vec3::new(1.0, 2.0, 1.0), Vec2::new(5.0, 0.0), true, false, 3)],
            process_memory: 2 * 1024 * 1024,
            ..default()
        };
        let text = format_dump(&snapshot);
        assert!(text.contains("Entities: 12"));
        assert!(text.contains("Level: level_1"));
        assert!(text.contains("Barrels: idle=2 used=1"));
        assert!(text.contains("pos=(1.00, 2.00) vel=(5.00, 0.00) grounded=true facing=left coins=3"));
        assert!(text.contains("Process memory: 2.00 MB"));
    }

    #[test]
    fn dump_without_player() {
        assert!(format_dump(&DumpSnapshot::default()).contains("Player: (none)"));
    }

    #[test]
    fn f2_toggles_gizmos() {
        let mut app = App::new();
        app.insert_resource(Settings::default());
        app.init_resource::<ButtonInput<KeyCode>>();
        app.init_resource::<GizmoState>();
        app.add_systems(Update, toggle_gizmos);
        app.world_mut().resource_mut::<ButtonInput<KeyCode>>().press(KeyCode::F2);
        app.update();
        assert!(app.world().resource::<GizmoState>().visible);
    }
}
