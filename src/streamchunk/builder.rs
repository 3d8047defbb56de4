//! Resolves a stream-chunk coordinate to its containing super chunk,
//! slices out its 32x32 column footprint, and fills each column's voxel
//! profile before SVDAG construction.

use crate::material::{MaterialTable, AIR};
use crate::streamchunk::voxel_grid::{VoxelGrid, CHUNK_SIZE};
use crate::superchunk::raster::SuperChunkRasters;
use crate::superchunk::region::{RegionCoord, REGION_SIZE};
use crate::svdag::{Dag, SvdagBuilder};

/// Default solid material used where the block-map sink didn't supply one.
const DEFAULT_SOLID: u16 = 1;

/// Water material id, matching the default-transparent material id used
/// when no world material table overrides it (spec.md §4.3, §4.5).
const WATER: u16 = 6;

/// Maximum world-space height a normalized `[0,1]` heightmap sample scales
/// to (spec.md §4.3).
const H_MAX: f32 = 256.0;

/// Sea level sits halfway up the world height range.
const SEA_LEVEL: f32 = 0.5 * H_MAX;

/// River surface cells stay submerged up to this many voxels above
/// terrain height, even above sea level.
const RIVER_SURFACE_DEPTH: f32 = 5.0;

/// Which stream chunk a chunk coordinate identifies, and how to resolve
/// its containing super chunk and column footprint within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamChunkCoord {
    pub cx: i64,
    pub cy: i64,
    pub cz: i64,
}

impl StreamChunkCoord {
    pub fn new(cx: i64, cy: i64, cz: i64) -> Self {
        Self { cx, cy, cz }
    }

    pub fn region(&self) -> RegionCoord {
        RegionCoord::containing(self.cx, self.cz)
    }

    /// Column offset of this chunk's origin within its containing region's
    /// rasters. Global column coordinates are taken modulo the region
    /// size (clamped at the last valid index), per spec.md §4.3.
    pub fn local_origin(&self) -> (usize, usize) {
        let global_x = self.cx * CHUNK_SIZE as i64;
        let global_z = self.cz * CHUNK_SIZE as i64;
        let lx = global_x.rem_euclid(REGION_SIZE as i64) as usize;
        let lz = global_z.rem_euclid(REGION_SIZE as i64) as usize;
        (lx.min(REGION_SIZE - 1), lz.min(REGION_SIZE - 1))
    }
}

/// Builds a dense voxel grid for one stream chunk out of its region's
/// rasters, applying the solid/water/river/air vertical fill rule of
/// spec.md §4.3.
///
/// Each column is strictly monotone bottom-up: solid material below the
/// terrain height, water up to sea level, water again if a river crosses
/// this column and the terrain pokes above sea level, then air.
pub fn build_voxel_grid(rasters: &SuperChunkRasters, coord: &StreamChunkCoord) -> VoxelGrid {
    let mut grid = VoxelGrid::new(CHUNK_SIZE);
    let (ox, oz) = coord.local_origin();

    for lz in 0..CHUNK_SIZE {
        for lx in 0..CHUNK_SIZE {
            let rx = (ox + lx).min(REGION_SIZE - 1);
            let rz = (oz + lz).min(REGION_SIZE - 1);

            let h = rasters.height_map.get(rx, rz).clamp(0.0, 1.0) * H_MAX;
            let block = rasters.block_map.get(rx, rz);
            let river = rasters.river_map.get(rx, rz) != 0;
            let solid_material = if block != AIR { block } else { DEFAULT_SOLID };

            for y in 0..CHUNK_SIZE {
                let world_y = (coord.cy * CHUNK_SIZE as i64 + y as i64) as f32;
                let material = if world_y < h {
                    solid_material
                } else if world_y < SEA_LEVEL {
                    WATER
                } else if river && world_y < h + RIVER_SURFACE_DEPTH {
                    WATER
                } else {
                    AIR
                };
                grid.set(lx, y, lz, material);
            }
        }
    }

    grid
}

/// Builds the material DAG (every voxel) and, if any voxel in the grid is
/// transparent, the opaque DAG (transparent materials replaced with air).
pub fn build_chunk_dags(grid: &VoxelGrid, materials: &MaterialTable) -> (Dag, Option<Dag>) {
    let sample = grid.sample();
    let material_dag = SvdagBuilder::new().build_dag(grid.size, &sample);

    let has_transparent = (0..grid.size)
        .flat_map(|y| (0..grid.size).flat_map(move |z| (0..grid.size).map(move |x| (x, y, z))))
        .any(|(x, y, z)| materials.is_transparent(grid.get(x, y, z)));

    let opaque_dag = if has_transparent {
        let opaque_sample = |x: usize, y: usize, z: usize| {
            let m = grid.get(x, y, z);
            if materials.is_transparent(m) {
                AIR
            } else {
                m
            }
        };
        Some(SvdagBuilder::new().build_dag(grid.size, opaque_sample))
    } else {
        None
    };

    (material_dag, opaque_dag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::MaterialEntry;

    fn coord(cy: i64) -> StreamChunkCoord {
        StreamChunkCoord::new(0, cy, 0)
    }

    #[test]
    fn ground_chunk_is_solid_below_terrain_then_water_to_sea_level() {
        let mut rasters = SuperChunkRasters::empty();
        rasters.height_map.set(0, 0, 0.1); // h = 25.6, inside chunk cy=0
        let grid = build_voxel_grid(&rasters, &coord(0));
        for y in 0..CHUNK_SIZE {
            let world_y = y as f32;
            let expected = if world_y < 0.1 * H_MAX {
                DEFAULT_SOLID
            } else if world_y < SEA_LEVEL {
                WATER
            } else {
                AIR
            };
            assert_eq!(grid.get(0, y, 0), expected, "mismatch at y={y}");
        }
    }

    #[test]
    fn chunk_entirely_above_sea_level_and_terrain_is_air() {
        // Empty-graph defaults: heightMap all zero, so h=0; chunk cy=4
        // covers worldY in [128, 160), at/above sea level (128) and above
        // terrain (0), with no river -> entirely air.
        let rasters = SuperChunkRasters::empty();
        let grid = build_voxel_grid(&rasters, &coord(4));
        let all_air = (0..CHUNK_SIZE)
            .flat_map(|x| (0..CHUNK_SIZE).flat_map(move |y| (0..CHUNK_SIZE).map(move |z| (x, y, z))))
            .all(|(x, y, z)| grid.get(x, y, z) == AIR);
        assert!(all_air);
    }

    #[test]
    fn river_keeps_column_submerged_above_sea_level_near_terrain() {
        let mut rasters = SuperChunkRasters::empty();
        // h = 0.6 * H_MAX = 153.6, above sea level (128); river crosses.
        rasters.height_map.set(0, 0, 0.6);
        rasters.river_map.set(0, 0, 1);
        let grid = build_voxel_grid(&rasters, &coord(4));
        // worldY 150 < h (153.6) -> solid; 154 is >= h, >= sea level, but
        // within h+5 and river -> water; 159 is beyond h+5 -> air.
        assert_eq!(grid.get(0, 150 - 128, 0), DEFAULT_SOLID);
        assert_eq!(grid.get(0, 154 - 128, 0), WATER);
        assert_eq!(grid.get(0, 159 - 128, 0), AIR);
    }

    #[test]
    fn opaque_dag_is_none_when_nothing_is_transparent() {
        let grid = VoxelGrid::new(4);
        let materials = MaterialTable::default();
        let (_material, opaque) = build_chunk_dags(&grid, &materials);
        assert!(opaque.is_none());
    }

    #[test]
    fn opaque_dag_replaces_transparent_material_with_air() {
        let mut grid = VoxelGrid::new(2);
        grid.set(0, 0, 0, 6);
        let materials = MaterialTable::new(vec![MaterialEntry { id: 6, name: "glass".into(), color: [200, 230, 255], transparency: 1.0 }]);
        let (material, opaque) = build_chunk_dags(&grid, &materials);
        assert!(!material.leaves.is_empty());
        let opaque = opaque.expect("transparent voxel present");
        assert_eq!(opaque.leaves, vec![AIR]);
    }
}
