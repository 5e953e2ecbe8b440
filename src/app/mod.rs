pub mod display;

pub use display::{sync_vsync_settings, window_present_mode};
