mod world;
mod spatial_hash;
pub mod map;

pub use world::{SimUnit, SimWorld};
pub use spatial_hash::SpatialHash;
pub use map::{generate_map, load_map, save_map, MapData, MAP_VERSION};
