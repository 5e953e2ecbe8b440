//! Settings loading and hot-reloading.
//!
//! Settings are loaded from RON files in the `data/settings` directory. If multiple
//! RON files are present, the first successfully parsed `Settings` (in file-name
//! order) is used. If none parse, default settings are used.
use crate::ron_loader::{load_ron_files, setup_ron_watcher};
use crate::settings::Settings;
use bevy::prelude::{info, Res, ResMut, Resource};

pub const SETTINGS_DIR: &str = "data/settings";

#[derive(Resource)]
pub struct SettingsWatcher(pub crate::ron::RonWatcher);

/// Load settings from `path` (directory).
///
/// # Returns
/// The first successfully parsed `Settings` in the directory, or defaults.
#[must_use]
pub fn load_settings_from_dir(path: &str) -> Settings {
    let items: Vec<Settings> = load_ron_files(path);
    items.into_iter().next().unwrap_or_else(Settings::defaults)
}

/// Create a watcher for the settings directory (hot-reload).
///
/// # Errors
/// Propagates the `notify::Error` raised when the directory cannot be watched.
pub fn setup_settings_watcher(path: &str) -> Result<SettingsWatcher, notify::Error> {
    setup_ron_watcher(path).map(SettingsWatcher)
}

/// Reload the `Settings` resource when the watcher reports a change.
///
/// Components that copied values out of `Settings` at spawn time (player
/// tuning, barrel thresholds) pick up the new values on the next level reload.
#[allow(clippy::needless_pass_by_value)]
pub fn check_settings_changes(watcher: Res<SettingsWatcher>, mut settings: ResMut<Settings>) {
    if watcher.0.take_changed() {
        info!("settings changed, reloading");
        *settings = load_settings_from_dir(SETTINGS_DIR);
    }
}

impl SettingsWatcher {
    #[must_use]
    pub fn stub() -> Self {
        SettingsWatcher(crate::ron::RonWatcher::stub())
    }
}
