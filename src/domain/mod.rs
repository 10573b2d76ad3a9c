pub mod state;
pub mod tile;
