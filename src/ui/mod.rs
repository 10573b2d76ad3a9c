pub mod camera;
pub mod input;
pub mod renderer;
pub mod sound;
pub mod theme;
pub mod vision;
