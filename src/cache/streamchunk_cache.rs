//! Two-tier cache for encoded stream-chunk containers, mirroring
//! [`crate::cache::superchunk_cache::SuperChunkCache`]'s single-flight
//! shape but keyed on chunk coordinate and storing finished container
//! bytes rather than rasters (spec.md §4.3 step 1, §5).

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};

use crate::cache::disk;
use crate::cache::memory::LruCache;
use crate::cache::superchunk_cache::SuperChunkCache;
use crate::core::{Error, Result};
use crate::graph::{GraphDescriptor, NodeRegistry};
use crate::material::MaterialTable;
use crate::streamchunk::builder::{build_chunk_dags, build_voxel_grid, StreamChunkCoord};
use crate::svdag::container::{decode, encode, ChunkContainer};

type Slot = Arc<OnceCell<Arc<Vec<u8>>>>;

pub struct StreamChunkCache {
    world_dir: PathBuf,
    memory: Mutex<LruCache<(i64, i64, i64), Arc<Vec<u8>>>>,
    inflight: Mutex<HashMap<(i64, i64, i64), Slot>>,
}

impl StreamChunkCache {
    pub fn new(world_dir: impl Into<PathBuf>, memory_capacity: usize) -> Self {
        Self {
            world_dir: world_dir.into(),
            memory: Mutex::new(LruCache::new(memory_capacity)),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    fn chunk_path(&self, coord: StreamChunkCoord) -> PathBuf {
        self.world_dir.join("chunks").join(format!("{}_{}_{}.svdag", coord.cx, coord.cy, coord.cz))
    }

    fn key(coord: StreamChunkCoord) -> (i64, i64, i64) {
        (coord.cx, coord.cy, coord.cz)
    }

    /// Resolves the encoded container bytes for `coord`: memory, then
    /// disk, then a full super-chunk-resolve + voxel-fill + dual-SVDAG
    /// build, single-flighted per chunk coordinate.
    #[allow(clippy::too_many_arguments)]
    pub async fn get_or_generate(
        &self,
        coord: StreamChunkCoord,
        super_chunks: &SuperChunkCache,
        graph: &GraphDescriptor,
        registry: &NodeRegistry,
        materials: &MaterialTable,
        world_seed: u64,
    ) -> Result<Arc<Vec<u8>>> {
        let key = Self::key(coord);
        if let Some(hit) = self.memory.lock().await.get(&key) {
            return Ok(hit.clone());
        }

        let slot = {
            let mut inflight = self.inflight.lock().await;
            inflight.entry(key).or_insert_with(|| Arc::new(OnceCell::new())).clone()
        };

        let result = slot
            .get_or_try_init(|| async {
                self.load_or_generate(coord, super_chunks, graph, registry, materials, world_seed).await
            })
            .await
            .map(|r| r.clone());

        self.inflight.lock().await.remove(&key);

        let bytes = result?;
        self.memory.lock().await.insert(key, bytes.clone());
        Ok(bytes)
    }

    async fn load_or_generate(
        &self,
        coord: StreamChunkCoord,
        super_chunks: &SuperChunkCache,
        graph: &GraphDescriptor,
        registry: &NodeRegistry,
        materials: &MaterialTable,
        world_seed: u64,
    ) -> Result<Arc<Vec<u8>>> {
        let path = self.chunk_path(coord);
        match disk::read_if_exists(&path).await {
            Ok(Some(bytes)) => match decode(&bytes) {
                Ok(_) => {
                    log::info!("chunk {}_{}_{} cache hit", coord.cx, coord.cy, coord.cz);
                    return Ok(Arc::new(bytes));
                }
                Err(e) => {
                    log::warn!("chunk {}_{}_{} corrupt, quarantining: {e}", coord.cx, coord.cy, coord.cz);
                    let _ = disk::quarantine(&path).await;
                }
            },
            Ok(None) => {}
            Err(e) => {
                log::warn!("chunk {}_{}_{} cache read failed, recomputing: {e}", coord.cx, coord.cy, coord.cz);
            }
        }

        log::info!("chunk {}_{}_{} generating", coord.cx, coord.cy, coord.cz);
        let region = coord.region();
        let rasters = super_chunks.get_or_generate(region, graph, registry, world_seed).await?;
        let grid = build_voxel_grid(&rasters, &coord);
        let (material, opaque) = build_chunk_dags(&grid, materials);

        let container = ChunkContainer { chunk_size: crate::streamchunk::voxel_grid::CHUNK_SIZE as u32, material, opaque };
        let bytes = encode(&container);

        disk::write_atomic(&path, &bytes).await?;
        Ok(Arc::new(bytes))
    }

    /// Removes `coord`'s cached container from memory and disk (spec.md
    /// §6.5 invalidation endpoint).
    pub async fn invalidate(&self, coord: StreamChunkCoord) -> Result<()> {
        self.memory.lock().await.remove(&Self::key(coord));
        let path = self.chunk_path(coord);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tokio::fs::remove_file(&path).await.map_err(Error::Io)?;
        }
        Ok(())
    }
}
