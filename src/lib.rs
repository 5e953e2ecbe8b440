pub mod animation;
pub mod barrel;
pub mod camera;
pub mod effects;
pub mod level;
pub mod physics;
pub mod player;
pub mod ron;
pub use crate::ron as ron_loader;
pub mod schedule;
pub mod ui;

pub mod settings;
pub mod debug;
