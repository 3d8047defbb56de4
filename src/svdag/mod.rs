//! Sparse voxel directed acyclic graph construction and binary encoding.

pub mod builder;
pub mod container;
pub mod node;

pub use builder::{Dag, SvdagBuilder};
pub use container::{decode, encode, ChunkContainer};
