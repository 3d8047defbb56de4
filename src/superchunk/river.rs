//! Deterministic river carving over a super chunk's height/river rasters.
//!
//! Peaks (local height maxima at or above `PEAK_THRESHOLD`) are the
//! candidate river sources; sinks (cells below `SINK_THRESHOLD`) are the
//! candidate outlets. Each peak independently rolls a seeded coin to
//! decide whether it spawns a river, targets its Manhattan-nearest sink,
//! and carves a steepest-descent path toward it. Rivers are carved in
//! raster-scan peak order, so a later river's path sees the channel an
//! earlier river has already cut into the height map.

use crate::superchunk::raster::SuperChunkRasters;

const PEAK_THRESHOLD: f32 = 0.7;
const SINK_THRESHOLD: f32 = 0.3;
const SPAWN_PROBABILITY: f64 = 0.3;
const CARVE_EPSILON: f32 = 0.002;
const MAX_PATH_STEPS: usize = 1000;

/// A small, fast, splittable PRNG. Not cryptographic; chosen only for
/// reproducibility given a fixed seed, matching the deterministic-rebuild
/// requirement on every raster this pipeline produces.
struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform sample in `[0, 1)`.
    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

fn region_seed(world_seed: u64, sx: i64, sz: i64) -> u64 {
    world_seed ^ (sx as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ (sz as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F)
}

fn is_local_peak(height: &crate::graph::port::RasterF32, x: usize, z: usize) -> bool {
    let w = height.width;
    let h = height.height;
    if x == 0 || z == 0 || x + 1 >= w || z + 1 >= h {
        return false;
    }
    let center = height.get(x, z);
    if center < PEAK_THRESHOLD {
        return false;
    }
    for dz in -1i32..=1 {
        for dx in -1i32..=1 {
            if dx == 0 && dz == 0 {
                continue;
            }
            let nx = (x as i32 + dx) as usize;
            let nz = (z as i32 + dz) as usize;
            if height.get(nx, nz) >= center {
                return false;
            }
        }
    }
    true
}

fn find_peaks(height: &crate::graph::port::RasterF32) -> Vec<(usize, usize)> {
    let mut peaks = Vec::new();
    for z in 0..height.height {
        for x in 0..height.width {
            if is_local_peak(height, x, z) {
                peaks.push((x, z));
            }
        }
    }
    peaks
}

fn find_sinks(height: &crate::graph::port::RasterF32) -> Vec<(usize, usize)> {
    let mut sinks = Vec::new();
    for z in 0..height.height {
        for x in 0..height.width {
            if height.get(x, z) < SINK_THRESHOLD {
                sinks.push((x, z));
            }
        }
    }
    sinks
}

fn nearest_sink(from: (usize, usize), sinks: &[(usize, usize)]) -> Option<(usize, usize)> {
    sinks
        .iter()
        .copied()
        .min_by_key(|&(sx, sz)| from.0.abs_diff(sx) + from.1.abs_diff(sz))
}

/// Greedy steepest-descent path from `start` toward `target`, stepping to
/// whichever 8-connected neighbor has the lowest current height. Stops at
/// the target, when no neighbor is strictly lower (a local pit), or after
/// `MAX_PATH_STEPS` steps — this is a descent heuristic, not a shortest-
/// path search (spec.md §4.2 candidly notes the source isn't true A*).
fn trace_path(
    height: &crate::graph::port::RasterF32,
    start: (usize, usize),
    target: (usize, usize),
) -> Vec<(usize, usize)> {
    let w = height.width;
    let h = height.height;
    let mut path = vec![start];
    let mut current = start;

    for _ in 0..MAX_PATH_STEPS {
        if current == target {
            break;
        }
        let mut best: Option<((usize, usize), f32)> = None;
        let candidates = [
            (-1i32, -1i32), (0, -1), (1, -1),
            (-1, 0), (1, 0),
            (-1, 1), (0, 1), (1, 1),
        ];
        for (dx, dz) in candidates {
            let nx = current.0 as i32 + dx;
            let nz = current.1 as i32 + dz;
            if nx < 0 || nz < 0 || nx as usize >= w || nz as usize >= h {
                continue;
            }
            let next = (nx as usize, nz as usize);
            let next_height = height.get(next.0, next.1);
            let better = match best {
                Some((_, h)) => next_height < h,
                None => true,
            };
            if better {
                best = Some((next, next_height));
            }
        }
        match best {
            Some((next, next_height)) if next_height < height.get(current.0, current.1) => {
                current = next;
                path.push(current);
            }
            _ => break,
        }
    }

    path
}

/// Carves rivers into `rasters.height_map` and marks `rasters.river_map`
/// in place, deterministically for a given `(world_seed, sx, sz)`.
pub fn carve_rivers(rasters: &mut SuperChunkRasters, world_seed: u64, sx: i64, sz: i64) {
    let mut rng = SplitMix64::new(region_seed(world_seed, sx, sz));

    let peaks = find_peaks(&rasters.height_map);
    let sinks = find_sinks(&rasters.height_map);
    if sinks.is_empty() {
        return;
    }

    for peak in peaks {
        let roll = rng.next_f64();
        if roll >= SPAWN_PROBABILITY {
            continue;
        }
        let Some(sink) = nearest_sink(peak, &sinks) else {
            continue;
        };
        let path = trace_path(&rasters.height_map, peak, sink);
        for (x, z) in path {
            let carved = (rasters.height_map.get(x, z) - CARVE_EPSILON).max(0.0);
            rasters.height_map.set(x, z, carved);
            rasters.river_map.set(x, z, 1);
        }
    }
}
