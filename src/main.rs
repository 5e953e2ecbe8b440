use bevy::diagnostic::FrameTimeDiagnosticsPlugin;
use bevy::log::{Level, LogPlugin};
use bevy::prelude::*;
use bevy::window::{Window, WindowPlugin};
use hopper::debug::{DebugDumpPlugin, GizmoState};
use hopper::level::loader as level_loader;
use hopper::level::{spawn_active_level, ActiveLevel, LEVELS_DIR};
use hopper::player::InputBindings;
use hopper::schedule::{GameSet, GameplayPlugin};
use hopper::settings::loader::{self as settings_loader, SETTINGS_DIR};
use hopper::ui::{
    setup_debug_overlay, spawn_debug_overlay, toggle_debug_overlay, update_debug_overlay,
};

mod app;
use app::{sync_vsync_settings, window_present_mode};

fn main() {
    let settings = settings_loader::load_settings_from_dir(SETTINGS_DIR);
    let settings_watcher = settings_loader::setup_settings_watcher(SETTINGS_DIR)
        .unwrap_or_else(|_| settings_loader::SettingsWatcher::stub());

    let mut app = App::new();

    app.add_plugins(
        DefaultPlugins
            .set(WindowPlugin {
                primary_window: Some(Window {
                    title: "hopper".into(),
                    position: WindowPosition::Centered(MonitorSelection::Primary),
                    present_mode: window_present_mode(settings.graphics.vsync),
                    ..default()
                }),
                ..default()
            })
            .set(LogPlugin {
                level: if settings.debug.verbose { Level::DEBUG } else { Level::INFO },
                filter: "wgpu=error,naga=warn".into(),
                ..default()
            }),
    )
    .add_plugins(FrameTimeDiagnosticsPlugin)
    .add_plugins(GameplayPlugin)
    .add_plugins(DebugDumpPlugin);

    app.insert_resource(ClearColor(Color::srgb(0.08, 0.09, 0.14)));
    app.insert_resource(InputBindings::from_controls(&settings.controls));
    app.insert_resource(GizmoState { visible: settings.debug.gizmos });

    app.insert_resource(level_loader::load_levels_from_dir(LEVELS_DIR));
    app.insert_resource(
        level_loader::setup_level_watcher(LEVELS_DIR)
            .unwrap_or_else(|_| level_loader::LevelWatcher::stub()),
    );
    app.insert_resource(ActiveLevel::default());

    app.insert_resource(settings.clone());
    app.insert_resource(settings_watcher);

    app.add_systems(Startup, setup_debug_overlay);
    app.add_systems(Startup, spawn_debug_overlay);
    app.add_systems(Startup, spawn_active_level);

    app.add_systems(Update, settings_loader::check_settings_changes.before(GameSet::Input));
    app.add_systems(Update, level_loader::check_level_changes.before(GameSet::Reactions));
    app.add_systems(Update, sync_vsync_settings);
    app.add_systems(Update, toggle_debug_overlay);
    app.add_systems(Update, update_debug_overlay.after(GameSet::Physics));

    app.run();
}
