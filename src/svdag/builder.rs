//! Builds a structurally-deduplicated SVDAG from a dense voxel grid.
//!
//! Dedup uses FNV-1a content hashes as `HashMap` keys, the same technique
//! the brick/node interning in a conventional SVO-to-SVDAG compressor uses
//! for its own structural hashing.

use std::collections::HashMap;

use crate::material::AIR;
use crate::svdag::node::{encode_interior, encode_leaf};

const FNV_OFFSET: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

fn hash_leaf(material: u16) -> u64 {
    fnv1a(&material.to_le_bytes())
}

fn hash_interior(mask: u8, children: &[u32]) -> u64 {
    let mut bytes = Vec::with_capacity(1 + children.len() * 4);
    bytes.push(mask);
    for c in children {
        bytes.extend_from_slice(&c.to_le_bytes());
    }
    fnv1a(&bytes)
}

/// The outcome of building a single material/opaque DAG over a chunk.
#[derive(Debug, Clone)]
pub struct Dag {
    /// Flattened node word stream (interior and leaf entries together).
    pub nodes: Vec<u32>,
    /// Distinct material values referenced by leaf nodes.
    pub leaves: Vec<u16>,
    /// Word offset of the root entry within `nodes`.
    pub root_idx: u32,
}

impl Dag {
    /// Decodes this DAG back into a dense `size x size x size` grid of
    /// material ids, the inverse of [`SvdagBuilder::build_dag`]. Used to
    /// check the decode round-trip and the material/opaque masking
    /// invariant (spec.md §8).
    pub fn materialize(&self, size: usize) -> Vec<u16> {
        let mut grid = vec![crate::material::AIR; size * size * size];
        self.fill(self.root_idx, (0, 0, 0), size, &mut grid, size);
        grid
    }

    fn fill(&self, offset: u32, origin: (usize, usize, usize), size: usize, grid: &mut [u16], grid_size: usize) {
        match crate::svdag::node::decode_at(&self.nodes, offset) {
            crate::svdag::node::DecodedNode::Leaf { leaf_index } => {
                let material = self.leaves[leaf_index as usize];
                for z in origin.2..origin.2 + size {
                    for y in origin.1..origin.1 + size {
                        for x in origin.0..origin.0 + size {
                            grid[z * grid_size * grid_size + y * grid_size + x] = material;
                        }
                    }
                }
            }
            crate::svdag::node::DecodedNode::Interior { child_mask, children } => {
                let half = size / 2;
                for octant in 0..8u8 {
                    let Some(slot) = crate::svdag::node::child_slot(child_mask, octant) else { continue };
                    let child_origin = (
                        origin.0 + if octant & 1 != 0 { half } else { 0 },
                        origin.1 + if octant & 2 != 0 { half } else { 0 },
                        origin.2 + if octant & 4 != 0 { half } else { 0 },
                    );
                    self.fill(children[slot], child_origin, half, grid, grid_size);
                }
            }
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Child {
    Air,
    /// Offset of a leaf node. Only children in this variant are eligible
    /// for the "all 8 octants identical" collapse (spec.md §4.4 says this
    /// applies when "all 8 children are the *same leaf index*" — an
    /// interior subtree repeated in all 8 octants must NOT collapse, or
    /// the parent would claim to be a size-`s` subtree while actually
    /// spanning `2s`).
    Leaf(u32),
    Interior(u32),
}

impl Child {
    fn offset(self) -> Option<u32> {
        match self {
            Child::Air => None,
            Child::Leaf(offset) | Child::Interior(offset) => Some(offset),
        }
    }
}

pub struct SvdagBuilder {
    nodes: Vec<u32>,
    leaves: Vec<u16>,
    leaf_values: HashMap<u64, u32>,
    leaf_nodes: HashMap<u64, u32>,
    interior_nodes: HashMap<u64, u32>,
}

impl SvdagBuilder {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            leaves: Vec::new(),
            leaf_values: HashMap::new(),
            leaf_nodes: HashMap::new(),
            interior_nodes: HashMap::new(),
        }
    }

    fn intern_leaf_value(&mut self, material: u16) -> u32 {
        let key = hash_leaf(material);
        if let Some(&idx) = self.leaf_values.get(&key) {
            return idx;
        }
        let idx = self.leaves.len() as u32;
        self.leaves.push(material);
        self.leaf_values.insert(key, idx);
        idx
    }

    fn intern_leaf_node(&mut self, material: u16) -> u32 {
        let leaf_index = self.intern_leaf_value(material);
        let key = hash_leaf(material);
        if let Some(&offset) = self.leaf_nodes.get(&key) {
            return offset;
        }
        let offset = encode_leaf(&mut self.nodes, leaf_index);
        self.leaf_nodes.insert(key, offset);
        offset
    }

    fn intern_interior_node(&mut self, mask: u8, children: &[u32]) -> u32 {
        let key = hash_interior(mask, children);
        if let Some(&offset) = self.interior_nodes.get(&key) {
            return offset;
        }
        let offset = encode_interior(&mut self.nodes, mask, children);
        self.interior_nodes.insert(key, offset);
        offset
    }

    /// Recursively builds the octree over a `size x size x size` cube whose
    /// corner is `origin`, sampling materials through `sample`.
    fn build(
        &mut self,
        origin: (usize, usize, usize),
        size: usize,
        sample: &dyn Fn(usize, usize, usize) -> u16,
    ) -> Child {
        if size == 1 {
            let material = sample(origin.0, origin.1, origin.2);
            if material == AIR {
                return Child::Air;
            }
            return Child::Leaf(self.intern_leaf_node(material));
        }

        let half = size / 2;
        let mut children = [Child::Air; 8];
        for (octant, slot) in children.iter_mut().enumerate() {
            let ox = origin.0 + if octant & 1 != 0 { half } else { 0 };
            let oy = origin.1 + if octant & 2 != 0 { half } else { 0 };
            let oz = origin.2 + if octant & 4 != 0 { half } else { 0 };
            *slot = self.build((ox, oy, oz), half, sample);
        }

        if children.iter().all(|c| matches!(c, Child::Air)) {
            return Child::Air;
        }

        // Only a uniform leaf fills all 8 octants identically (spec.md
        // §4.4); a repeated interior subtree keeps its own level instead
        // of being hoisted up to claim this node's (twice as large) extent.
        if let Child::Leaf(first) = children[0] {
            if children.iter().all(|c| matches!(c, Child::Leaf(n) if *n == first)) {
                return Child::Leaf(first);
            }
        }

        let mut mask = 0u8;
        let mut packed = Vec::with_capacity(8);
        for (octant, child) in children.iter().enumerate() {
            if let Some(offset) = child.offset() {
                mask |= 1 << octant;
                packed.push(offset);
            }
        }

        Child::Interior(self.intern_interior_node(mask, &packed))
    }

    /// Builds a complete DAG over a `size x size x size` cube (size must be
    /// a power of two) using `sample` to fetch each voxel's material id.
    pub fn build_dag(mut self, size: usize, sample: impl Fn(usize, usize, usize) -> u16) -> Dag {
        let root = self.build((0, 0, 0), size, &sample);
        let root_idx = match root {
            Child::Leaf(offset) | Child::Interior(offset) => offset,
            Child::Air => self.intern_leaf_node(AIR),
        };
        Dag { nodes: self.nodes, leaves: self.leaves, root_idx }
    }
}

impl Default for SvdagBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::svdag::node::{decode_at, DecodedNode};

    #[test]
    fn all_air_chunk_collapses_to_single_leaf() {
        let dag = SvdagBuilder::new().build_dag(8, |_, _, _| AIR);
        assert_eq!(dag.nodes.len(), 2);
        assert_eq!(dag.leaves, vec![AIR]);
        match decode_at(&dag.nodes, dag.root_idx) {
            DecodedNode::Leaf { leaf_index } => assert_eq!(leaf_index, 0),
            _ => panic!("expected leaf root"),
        }
    }

    #[test]
    fn uniform_solid_chunk_collapses_to_single_leaf() {
        let dag = SvdagBuilder::new().build_dag(8, |_, _, _| 3);
        assert_eq!(dag.leaves, vec![3]);
        match decode_at(&dag.nodes, dag.root_idx) {
            DecodedNode::Leaf { leaf_index } => assert_eq!(dag.leaves[leaf_index as usize], 3),
            _ => panic!("expected leaf root"),
        }
    }

    #[test]
    fn checkerboard_dedups_identical_subtrees() {
        // Two materials alternating by octant at every depth: every octant
        // below the root looks the same, so only a handful of distinct
        // interior/leaf nodes should exist despite covering 8^3 voxels.
        let dag = SvdagBuilder::new().build_dag(8, |x, y, z| if (x + y + z) % 2 == 0 { 1 } else { 2 });
        assert!(dag.nodes.len() < 40, "expected heavy dedup, got {} words", dag.nodes.len());
        assert_eq!(dag.leaves.len(), 2);
    }

    #[test]
    fn identical_materials_produce_identical_dags() {
        let sample = |x: usize, y: usize, z: usize| ((x + y * 2 + z * 3) % 4) as u16;
        let a = SvdagBuilder::new().build_dag(16, sample);
        let b = SvdagBuilder::new().build_dag(16, sample);
        assert_eq!(a.nodes, b.nodes);
        assert_eq!(a.leaves, b.leaves);
        assert_eq!(a.root_idx, b.root_idx);
    }

    #[test]
    fn materialize_round_trips_an_arbitrary_grid() {
        let sample = |x: usize, y: usize, z: usize| ((x + y * 2 + z * 3) % 4) as u16;
        let dag = SvdagBuilder::new().build_dag(8, sample);
        let grid = dag.materialize(8);
        for z in 0..8 {
            for y in 0..8 {
                for x in 0..8 {
                    assert_eq!(grid[z * 64 + y * 8 + x], sample(x, y, z), "mismatch at ({x},{y},{z})");
                }
            }
        }
    }

    #[test]
    fn repeated_interior_subtree_does_not_collapse_to_one_level_up() {
        // Every size-2 octant of this size-4 grid is the identical interior
        // node (x even -> 1, x odd -> 2 within each 2-wide column), but the
        // size-4 root must still resolve each octant independently instead
        // of hoisting that interior node up to span the full size-4 cube.
        let dag = SvdagBuilder::new().build_dag(4, |x, _, _| if x % 2 == 0 { 1 } else { 2 });
        let grid = dag.materialize(4);
        for z in 0..4 {
            for y in 0..4 {
                for x in 0..4 {
                    let expected = if x % 2 == 0 { 1 } else { 2 };
                    assert_eq!(grid[z * 16 + y * 4 + x], expected, "mismatch at ({x},{y},{z})");
                }
            }
        }
    }

    #[test]
    fn material_dag_masked_by_transparency_equals_opaque_dag() {
        // Material 6 is transparent; building an opaque DAG by replacing it
        // with air before construction must materialize identically to
        // masking the material DAG's decoded grid afterward (spec.md §8).
        let sample = |x: usize, y: usize, z: usize| if (x + y + z) % 3 == 0 { 6 } else { 1 };
        let material = SvdagBuilder::new().build_dag(8, sample);
        let opaque = SvdagBuilder::new().build_dag(8, |x, y, z| if sample(x, y, z) == 6 { AIR } else { sample(x, y, z) });

        let material_grid = material.materialize(8);
        let opaque_grid = opaque.materialize(8);
        let masked: Vec<u16> = material_grid.iter().map(|&m| if m == 6 { AIR } else { m }).collect();
        assert_eq!(masked, opaque_grid);
    }
}
