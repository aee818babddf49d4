use fixedbitset::FixedBitSet;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read};
use flate2::write::ZlibEncoder;
use flate2::read::ZlibDecoder;
use flate2::Compression;
use tracing::info;
use crate::bot::config::SimConfig;
use crate::bot::grid::{Cell, Grid};
use crate::bot::pathfinding::Symmetry;

pub const MAP_VERSION: u32 = 1;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MapData {
    pub version: u32,
    pub symmetry: Symmetry,
    pub grid: Grid,
    pub friendly_starts: Vec<Cell>,
    pub enemy_starts: Vec<Cell>,
}

pub fn save_map(path: &str, map_data: &MapData) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let mut encoder = ZlibEncoder::new(writer, Compression::default());
    bincode::serialize_into(&mut encoder, map_data)?;
    encoder.finish()?;
    Ok(())
}

pub fn load_map(path: &str) -> Result<MapData, Box<dyn std::error::Error>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut decoder = ZlibDecoder::new(reader);
    // FixedBitSet only deserializes from borrowed bytes.
    let mut bytes = Vec::new();
    decoder.read_to_end(&mut bytes)?;
    let map_data: MapData = bincode::deserialize(&bytes)?;
    if map_data.version != MAP_VERSION {
        return Err(format!("map version {} (expected {})", map_data.version, MAP_VERSION).into());
    }
    Ok(map_data)
}

/// Deterministic symmetric map from `config.seed`.
///
/// Walls and resource patches are scattered over the whole raw map, then
/// every cell copies the value of the smaller of itself and its mirror
/// image, so the result satisfies `config.symmetry` exactly. Friendly
/// workers start in the lower-left third and enemies on the mirrored cells.
pub fn generate_map(config: &SimConfig) -> MapData {
    let width = config.map_width.max(4);
    let height = config.map_height.max(4);
    let size = width * height;
    let mut rng = StdRng::seed_from_u64(config.seed);

    let mut raw_walls = vec![false; size];
    let mut raw_resources = vec![0u32; size];

    let blob_count = ((size as f32 * config.obstacle_density) / 9.0).ceil() as usize;
    for _ in 0..blob_count {
        let cx = rng.random_range(0..width as i32);
        let cy = rng.random_range(0..height as i32);
        let radius = rng.random_range(0..=1);
        stamp(width, height, Cell::new(cx, cy), radius, |idx| raw_walls[idx] = true);
    }

    for _ in 0..config.resource_patches {
        let cx = rng.random_range(0..width as i32);
        let cy = rng.random_range(0..height as i32);
        let amount = rng.random_range(10..=40);
        stamp(width, height, Cell::new(cx, cy), 1, |idx| raw_resources[idx] += amount);
    }

    // Keep the starting area open.
    let anchor = Cell::new(
        rng.random_range(1..(width as i32 / 3).max(2)),
        rng.random_range(1..(height as i32 / 3).max(2)),
    );
    stamp(width, height, anchor, 2, |idx| raw_walls[idx] = false);

    let mut passable = FixedBitSet::with_capacity(size);
    let mut resources = vec![0u32; size];
    for idx in 0..size {
        let cell = Cell::new((idx % width) as i32, (idx / width) as i32);
        let image = config.symmetry.mirror_cell(cell, width, height);
        let source = cell.min(image);
        let source_idx = source.y as usize * width + source.x as usize;
        if !raw_walls[source_idx] {
            passable.insert(idx);
            resources[idx] = raw_resources[source_idx];
        }
    }
    let grid = Grid::new(width, height, passable, resources);

    let mut friendly_starts = Vec::new();
    'rings: for ring in 0..=2i32 {
        for dy in -ring..=ring {
            for dx in -ring..=ring {
                if dx.abs().max(dy.abs()) != ring {
                    continue;
                }
                let cell = Cell::new(anchor.x + dx, anchor.y + dy);
                if grid.is_passable(cell) && config.symmetry.mirror_cell(cell, width, height) != cell {
                    friendly_starts.push(cell);
                    if friendly_starts.len() >= config.workers_per_side {
                        break 'rings;
                    }
                }
            }
        }
    }
    let enemy_starts = friendly_starts
        .iter()
        .map(|cell| config.symmetry.mirror_cell(*cell, width, height))
        .collect();

    info!(
        "[SIM] Generated {}x{} {:?} map (seed {}), {} workers per side",
        width,
        height,
        config.symmetry,
        config.seed,
        friendly_starts.len()
    );

    MapData { version: MAP_VERSION, symmetry: config.symmetry, grid, friendly_starts, enemy_starts }
}

fn stamp(width: usize, height: usize, center: Cell, radius: i32, mut apply: impl FnMut(usize)) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let x = center.x + dx;
            let y = center.y + dy;
            if x >= 0 && y >= 0 && (x as usize) < width && (y as usize) < height {
                apply(y as usize * width + x as usize);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::pathfinding::SymmetryFlags;

    #[test]
    fn test_generated_map_has_requested_symmetry() {
        for symmetry in Symmetry::ALL {
            let config = SimConfig { symmetry, seed: 3, ..Default::default() };
            let map = generate_map(&config);
            let flags = SymmetryFlags::detect(&map.grid);
            assert!(flags.holds(symmetry), "{:?} map should satisfy {:?}", symmetry, symmetry);

            for cell in map.grid.cells() {
                let image = symmetry.mirror_cell(cell, map.grid.width(), map.grid.height());
                assert_eq!(map.grid.initial_resources(cell), map.grid.initial_resources(image));
            }
        }
    }

    #[test]
    fn test_same_seed_same_map() {
        let config = SimConfig::default();
        let a = generate_map(&config);
        let b = generate_map(&config);
        assert_eq!(a.grid.passable_bits(), b.grid.passable_bits());
        assert_eq!(a.grid.resources(), b.grid.resources());
        assert_eq!(a.friendly_starts, b.friendly_starts);
    }

    #[test]
    fn test_starts_are_passable_and_mirrored() {
        let config = SimConfig { workers_per_side: 4, ..Default::default() };
        let map = generate_map(&config);
        assert_eq!(map.friendly_starts.len(), 4);
        for (friendly, enemy) in map.friendly_starts.iter().zip(&map.enemy_starts) {
            assert!(map.grid.is_passable(*friendly));
            assert!(map.grid.is_passable(*enemy));
            assert!(!map.friendly_starts.contains(enemy), "Start cells must not overlap");
        }
    }

    #[test]
    fn test_saved_map_reloads_walls_and_resources() {
        let grid = Grid::from_ascii(&["..#.", ".5#.", "...."]);
        let map = MapData {
            version: MAP_VERSION,
            symmetry: Symmetry::Horizontal,
            grid,
            friendly_starts: vec![Cell::new(0, 0)],
            enemy_starts: vec![Cell::new(3, 0)],
        };
        let path = std::env::temp_dir().join(format!("lodestar_walls_{}.bin", std::process::id()));
        let path_str = path.to_string_lossy().to_string();

        save_map(&path_str, &map).expect("map saves");
        let loaded = load_map(&path_str);
        let _ = std::fs::remove_file(&path);
        let loaded = loaded.expect("map with a wall bitset loads back");

        assert_eq!(loaded.grid.passable_bits(), map.grid.passable_bits());
        assert!(!loaded.grid.is_passable(Cell::new(2, 1)));
        assert_eq!(loaded.grid.initial_resources(Cell::new(1, 1)), 50);
        assert_eq!(loaded.enemy_starts, vec![Cell::new(3, 0)]);
    }
}
