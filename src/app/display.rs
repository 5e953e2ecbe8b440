//! Display-related systems, such as syncing vsync
//! settings from the main `Settings` resource to the primary window's present mode.
use bevy::prelude::*;
use bevy::window::{PresentMode, PrimaryWindow};
use hopper::settings::Settings;

#[must_use]
pub fn window_present_mode(vsync: bool) -> PresentMode {
    if vsync { PresentMode::Fifo } else { PresentMode::AutoNoVsync }
}

/// Sync `Settings.graphics.vsync` into the present mode of the primary window.
/// Allows the user to toggle vsync at runtime without restarting.
///
/// # Arguments
/// - `settings`: The current settings resource, from which the vsync preference is read.
/// - `windows`: Query for the primary window to update its present mode.
/// - `last`: A local cache of the last applied vsync state to avoid redundant updates.
#[allow(clippy::needless_pass_by_value)]
pub fn sync_vsync_settings(
    settings: Res<Settings>,
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
    mut last: Local<Option<bool>>,
) {
    let desired = settings.graphics.vsync;
    if *last == Some(desired) { return; }

    for mut w in &mut windows {
        w.present_mode = window_present_mode(desired);
    }
    *last = Some(desired);
}
