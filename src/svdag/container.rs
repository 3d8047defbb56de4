//! The on-disk chunk binary container: a 40-byte header followed by the
//! material DAG's node/leaf word streams and, when present, the opaque
//! DAG's. The trailing opaque-leaf array's length is never stored; it is
//! inferred from how many bytes remain once every other field is known.
//!
//! Every stream on the wire is 32-bit words (spec.md §6.1), including the
//! leaf streams: a leaf's material id is a `u16` in memory ([`Dag::leaves`])
//! but is widened to a `u32` word when written so the node/leaf/node/leaf
//! layout stays word-aligned for an external reader walking the format.

use bytemuck::{Pod, Zeroable};

use crate::core::{Error, Result};
use crate::svdag::builder::Dag;

pub const MAGIC: u32 = 0x41445653; // "SVDA", little-endian
pub const VERSION: u32 = 2;

const FLAG_HAS_OPAQUE: u32 = 1 << 0;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct Header {
    magic: u32,
    version: u32,
    chunk_size: u32,
    mat_node_count: u32,
    mat_leaf_count: u32,
    mat_root_idx: u32,
    flags: u32,
    checksum: u32,
    opq_root_idx: u32,
    opq_node_count: u32,
}

const HEADER_LEN: usize = std::mem::size_of::<Header>();

/// A decoded chunk container: the material DAG (always present) and the
/// opaque DAG (present whenever any voxel in the chunk is transparent).
#[derive(Debug, Clone)]
pub struct ChunkContainer {
    pub chunk_size: u32,
    pub material: Dag,
    pub opaque: Option<Dag>,
}

pub fn encode(container: &ChunkContainer) -> Vec<u8> {
    let has_opaque = container.opaque.is_some();
    let opaque = container.opaque.as_ref();

    let header = Header {
        magic: MAGIC,
        version: VERSION,
        chunk_size: container.chunk_size,
        mat_node_count: container.material.nodes.len() as u32,
        mat_leaf_count: container.material.leaves.len() as u32,
        mat_root_idx: container.material.root_idx,
        flags: if has_opaque { FLAG_HAS_OPAQUE } else { 0 },
        checksum: 0,
        opq_root_idx: opaque.map(|d| d.root_idx).unwrap_or(0),
        opq_node_count: opaque.map(|d| d.nodes.len() as u32).unwrap_or(0),
    };

    let mut bytes = Vec::new();
    bytes.extend_from_slice(bytemuck::bytes_of(&header));
    bytes.extend_from_slice(bytemuck::cast_slice(&container.material.nodes));
    bytes.extend_from_slice(bytemuck::cast_slice(&widen_leaves(&container.material.leaves)));
    if let Some(dag) = opaque {
        bytes.extend_from_slice(bytemuck::cast_slice(&dag.nodes));
        bytes.extend_from_slice(bytemuck::cast_slice(&widen_leaves(&dag.leaves)));
    }
    bytes
}

/// Widens each material id to a 32-bit wire word (spec.md §6.1).
fn widen_leaves(leaves: &[u16]) -> Vec<u32> {
    leaves.iter().map(|&m| m as u32).collect()
}

pub fn decode(bytes: &[u8]) -> Result<ChunkContainer> {
    if bytes.len() < HEADER_LEN {
        return Err(Error::InternalError("chunk container shorter than header".into()));
    }
    let header: Header = *bytemuck::from_bytes(&bytes[..HEADER_LEN]);
    if header.magic != MAGIC {
        return Err(Error::InternalError(format!("bad chunk container magic {:#x}", header.magic)));
    }
    if header.version != VERSION {
        return Err(Error::InternalError(format!("unsupported chunk container version {}", header.version)));
    }

    let mut cursor = HEADER_LEN;

    let mat_node_bytes = header.mat_node_count as usize * 4;
    let mat_nodes: Vec<u32> =
        bytemuck::cast_slice(slice(bytes, cursor, mat_node_bytes)?).to_vec();
    cursor += mat_node_bytes;

    let mat_leaf_bytes = header.mat_leaf_count as usize * 4;
    let mat_leaf_words: &[u32] = bytemuck::cast_slice(slice(bytes, cursor, mat_leaf_bytes)?);
    let mat_leaves = narrow_leaves(mat_leaf_words);
    cursor += mat_leaf_bytes;

    let material = Dag { nodes: mat_nodes, leaves: mat_leaves, root_idx: header.mat_root_idx };

    let opaque = if header.flags & FLAG_HAS_OPAQUE != 0 {
        let opq_node_bytes = header.opq_node_count as usize * 4;
        let opq_nodes: Vec<u32> =
            bytemuck::cast_slice(slice(bytes, cursor, opq_node_bytes)?).to_vec();
        cursor += opq_node_bytes;

        let remaining = bytes.len() - cursor;
        if remaining % 4 != 0 {
            return Err(Error::InternalError("trailing opaque leaf bytes are not word-aligned".into()));
        }
        let opq_leaf_words: &[u32] = bytemuck::cast_slice(&bytes[cursor..]);
        let opq_leaves = narrow_leaves(opq_leaf_words);

        Some(Dag { nodes: opq_nodes, leaves: opq_leaves, root_idx: header.opq_root_idx })
    } else {
        None
    };

    Ok(ChunkContainer { chunk_size: header.chunk_size, material, opaque })
}

/// Narrows each 32-bit wire word back down to a material id. Values that
/// don't fit a `u16` indicate a corrupt stream; they truncate rather than
/// fail here, the same way a bad magic/version is the signal that sends
/// the caller down the quarantine-and-recompute path instead.
fn narrow_leaves(words: &[u32]) -> Vec<u16> {
    words.iter().map(|&w| w as u16).collect()
}

fn slice(bytes: &[u8], start: usize, len: usize) -> Result<&[u8]> {
    bytes
        .get(start..start + len)
        .ok_or_else(|| Error::InternalError("chunk container truncated".into()))
}
