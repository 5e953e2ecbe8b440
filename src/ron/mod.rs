//! Utilities for loading RON files and watching directories for changes.
//!
//! Settings and level descriptions are both plain RON files on disk. This
//! module reads every `.ron` file in a directory and provides a watcher
//! resource that raises a shared flag when something in the directory is
//! modified, which the hot-reload systems poll once per frame.

use bevy::log::{error, warn};
use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// File-watcher handle for RON hot-reload.
pub struct RonWatcher {
    pub changed: Arc<Mutex<bool>>, // Set to `true` by the OS watcher thread when a watched file changes.
    _watcher: Option<RecommendedWatcher>, // kept alive for as long as the resource exists
}

impl RonWatcher {
    /// Create a `RonWatcher` without an OS watcher behind it.
    ///
    /// Used when watcher creation fails (missing directory, unsupported
    /// platform) so the rest of the app can keep polling a flag that never
    /// flips.
    #[must_use]
    pub fn stub() -> Self {
        RonWatcher {
            changed: Arc::new(Mutex::new(false)),
            _watcher: None,
        }
    }

    /// Read and clear the change flag.
    ///
    /// # Returns
    /// `true` when at least one modification was observed since the last call.
    /// A poisoned mutex is recovered rather than propagated; the flag is a
    /// plain bool so there is no invariant to lose.
    pub fn take_changed(&self) -> bool {
        let mut flag = match self.changed.lock() {
            Ok(flag) => flag,
            Err(poisoned) => {
                warn!("ron watcher mutex poisoned, recovering");
                poisoned.into_inner()
            }
        };
        std::mem::replace(&mut *flag, false)
    }
}

/// Parse a single RON document.
///
/// # Errors
/// Returns the `ron` span error when `content` does not deserialize into `T`.
pub fn parse_ron<T: DeserializeOwned>(content: &str) -> Result<T, ron::error::SpannedError> {
    ron::from_str::<T>(content)
}

/// Load all `.ron` files from a directory and deserialize them into `T`.
///
/// Files are visited in file-name order so "the first file" is stable across
/// platforms. Files that fail to parse are skipped with a warning.
///
/// # Arguments
/// * `path` - Directory path to scan for `.ron` files.
#[must_use]
pub fn load_ron_files<T: DeserializeOwned>(path: &str) -> Vec<T> {
    let Ok(entries) = std::fs::read_dir(path) else {
        warn!("ron directory '{path}' is not readable, using defaults");
        return Vec::new();
    };

    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "ron"))
        .collect();
    files.sort();

    let mut items = Vec::new();
    for file in files {
        let Ok(content) = std::fs::read_to_string(&file) else {
            warn!("failed to read {}", file.display());
            continue;
        };
        match parse_ron::<T>(&content) {
            Ok(item) => items.push(item),
            Err(e) => warn!("failed to parse {}: {e}", file.display()),
        }
    }

    items
}

/// Create a `RonWatcher` that watches a directory for modifications.
///
/// # Arguments
/// * `path` - Directory path to watch for `.ron` file changes.
///
/// # Errors
/// Returns a `notify::Error` if the underlying watcher cannot be created or
/// cannot be registered for `path`.
pub fn setup_ron_watcher(path: &str) -> Result<RonWatcher, notify::Error> {
    let changed = Arc::new(Mutex::new(false));
    let changed_clone = changed.clone();
    let watched_path: PathBuf = std::fs::canonicalize(path).unwrap_or_else(|_| PathBuf::from(path));

    let mut watcher: RecommendedWatcher = Watcher::new(
        move |res: Result<notify::Event, notify::Error>| match res {
            Ok(event) => {
                if !matches!(event.kind, notify::EventKind::Modify(_)) {
                    return;
                }
                let relevant = event.paths.iter().any(|p| {
                    let p_canon = std::fs::canonicalize(p).unwrap_or_else(|_| p.clone());
                    p_canon.starts_with(&watched_path)
                });
                if relevant {
                    match changed_clone.lock() {
                        Ok(mut flag) => *flag = true,
                        Err(poisoned) => *poisoned.into_inner() = true,
                    }
                }
            }
            Err(e) => error!("watch error: {e:?}"),
        },
        Config::default(),
    )?;

    watcher.watch(Path::new(path), RecursiveMode::NonRecursive)?;
    Ok(RonWatcher { changed, _watcher: Some(watcher) })
}
