//! The public API surface an external HTTP layer calls (spec.md §6.5):
//! GET chunk, GET manifest, and cache invalidation, as plain library
//! functions rather than an HTTP server.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cache::{StreamChunkCache, SuperChunkCache};
use crate::core::Result;
use crate::graph::builtin::register_defaults;
use crate::graph::{GraphDescriptor, NodeRegistry};
use crate::material::{MaterialEntry, MaterialTable};
use crate::streamchunk::builder::StreamChunkCoord;
use crate::streamchunk::voxel_grid::CHUNK_SIZE;
use crate::superchunk::region::{RegionCoord, REGION_SIZE};

/// On-disk world configuration (spec.md §6.4). Missing fields fall back
/// to their documented defaults (spec.md §4.5: "missing config file
/// falls back to... default material palette").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub materials: Vec<MaterialEntry>,
    #[serde(rename = "spawnPoint", default)]
    pub spawn_point: [f32; 3],
    #[serde(rename = "erosionIterations", default)]
    pub erosion_iterations: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self { seed: 0, materials: Vec::new(), spawn_point: [0.0, 0.0, 0.0], erosion_iterations: 0 }
    }
}

/// The manifest an external client fetches before streaming chunks
/// (spec.md §6.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(rename = "worldId")]
    pub world_id: String,
    pub seed: u64,
    #[serde(rename = "chunkSize")]
    pub chunk_size: u32,
    #[serde(rename = "superChunkSize")]
    pub super_chunk_size: u32,
    pub materials: Vec<MaterialEntry>,
    #[serde(rename = "spawnPoint")]
    pub spawn_point: [f32; 3],
    pub version: u32,
}

/// Binds one procedural world: its config, node graph, registry, material
/// table, and two-tier caches, rooted at `world_dir`.
pub struct World {
    world_id: String,
    config: WorldConfig,
    graph: GraphDescriptor,
    registry: NodeRegistry,
    materials: MaterialTable,
    super_chunks: SuperChunkCache,
    stream_chunks: StreamChunkCache,
}

/// In-memory residency budgets (spec.md §5 "cap in-memory super-chunk
/// residency"); a super chunk is ~2 MiB, so 64 entries is ~128 MiB.
const DEFAULT_SUPERCHUNK_CAPACITY: usize = 64;
/// Stream chunks are tiny by comparison (~20 KiB of SVDAG buffers).
const DEFAULT_STREAMCHUNK_CAPACITY: usize = 1024;

impl World {
    /// Opens (or creates) a world rooted at `world_dir`. Reads
    /// `world_dir/world.json` and `world_dir/graph.json` if present;
    /// absent files fall back to an empty graph and a default (empty)
    /// material palette, per spec.md §4.5.
    pub async fn open(world_id: impl Into<String>, world_dir: impl Into<PathBuf>) -> Result<Self> {
        let world_dir = world_dir.into();
        let config = load_json_or_default::<WorldConfig>(&world_dir.join("world.json")).await?;
        let graph = load_json_or_default::<GraphDescriptor>(&world_dir.join("graph.json")).await?;

        let mut registry = NodeRegistry::new();
        register_defaults(&mut registry)?;

        let materials = MaterialTable::new(config.materials.clone());

        Ok(Self {
            world_id: world_id.into(),
            config,
            graph,
            registry,
            materials,
            super_chunks: SuperChunkCache::new(&world_dir, DEFAULT_SUPERCHUNK_CAPACITY),
            stream_chunks: StreamChunkCache::new(&world_dir, DEFAULT_STREAMCHUNK_CAPACITY),
        })
    }

    pub fn world_id(&self) -> &str {
        &self.world_id
    }

    /// Resolves `(cx, cy, cz)` to its encoded chunk container bytes
    /// (spec.md §6.1), consulting cache before recomputing.
    pub async fn get_chunk(&self, cx: i64, cy: i64, cz: i64) -> Result<Arc<Vec<u8>>> {
        let coord = StreamChunkCoord::new(cx, cy, cz);
        self.stream_chunks
            .get_or_generate(coord, &self.super_chunks, &self.graph, &self.registry, &self.materials, self.config.seed)
            .await
    }

    pub fn manifest(&self) -> Manifest {
        Manifest {
            world_id: self.world_id.clone(),
            seed: self.config.seed,
            chunk_size: CHUNK_SIZE as u32,
            super_chunk_size: REGION_SIZE as u32,
            materials: self.materials.entries().cloned().collect(),
            spawn_point: self.config.spawn_point,
            version: crate::svdag::container::VERSION,
        }
    }

    /// Drops `(cx, cy, cz)`'s cached container (spec.md §6.5
    /// invalidation).
    pub async fn invalidate_chunk(&self, cx: i64, cy: i64, cz: i64) -> Result<()> {
        self.stream_chunks.invalidate(StreamChunkCoord::new(cx, cy, cz)).await
    }

    /// Drops `(sx, sz)`'s cached rasters (spec.md §6.5 invalidation).
    pub async fn invalidate_superchunk(&self, sx: i64, sz: i64) -> Result<()> {
        self.super_chunks.invalidate(RegionCoord::new(sx, sz)).await
    }
}

async fn load_json_or_default<T>(path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned + Default,
{
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(crate::core::Error::Io(e)),
    }
}
