//! Loading and hot-reloading of level descriptions.
//!
//! Every `.ron` file in `data/levels` holds one [`LevelDescription`]. Editing
//! a level while the game runs reloads the registry and respawns the active
//! level, so tweaks show up without restarting.

use super::{ActiveLevel, LevelDescription, LevelRegistry, ReloadLevel, LEVELS_DIR};
use crate::ron_loader::{load_ron_files, setup_ron_watcher};
use bevy::prelude::{info, warn, EventWriter, Res, ResMut, Resource};

#[derive(Resource)]
pub struct LevelWatcher(pub crate::ron::RonWatcher);

/// Load every level in `path` into a registry.
///
/// Later files win when two levels share a name.
#[must_use]
pub fn load_levels_from_dir(path: &str) -> LevelRegistry {
    let mut registry = LevelRegistry::default();
    let levels: Vec<LevelDescription> = load_ron_files(path);
    for level in levels {
        if registry.levels.contains_key(&level.name) {
            warn!("duplicate level name '{}', replacing earlier definition", level.name);
        }
        registry.insert(level);
    }
    registry
}

/// Create a watcher for the level directory.
///
/// # Errors
/// Propagates the `notify::Error` raised when the directory cannot be watched.
pub fn setup_level_watcher(path: &str) -> Result<LevelWatcher, notify::Error> {
    setup_ron_watcher(path).map(LevelWatcher)
}

/// Reload the registry and respawn the active level when a level file changes.
#[allow(clippy::needless_pass_by_value)]
pub fn check_level_changes(
    watcher: Res<LevelWatcher>,
    mut registry: ResMut<LevelRegistry>,
    active: Res<ActiveLevel>,
    mut reload: EventWriter<ReloadLevel>,
) {
    if watcher.0.take_changed() {
        info!("levels changed, reloading");
        *registry = load_levels_from_dir(LEVELS_DIR);
        reload.send(ReloadLevel { name: active.0.clone() });
    }
}

impl LevelWatcher {
    #[must_use]
    pub fn stub() -> Self {
        LevelWatcher(crate::ron::RonWatcher::stub())
    }
}
