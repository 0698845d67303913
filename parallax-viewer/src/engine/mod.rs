pub mod camera;
pub mod core;
pub mod loading;
pub mod locomotion;
pub mod render;
pub mod scene;
pub mod settings;
pub mod systems;
