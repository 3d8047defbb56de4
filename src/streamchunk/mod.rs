//! Stream-chunk construction: resolving a chunk coordinate to its
//! containing super chunk, filling its voxel profile, and building the
//! dual material/opaque SVDAGs.

pub mod builder;
pub mod voxel_grid;

pub use builder::{build_chunk_dags, build_voxel_grid, StreamChunkCoord};
pub use voxel_grid::{VoxelGrid, CHUNK_SIZE};
