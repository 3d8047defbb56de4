//! The four regional rasters a super chunk's node-graph run produces, and
//! their little-endian on-disk byte encoding (spec.md §6.2).

use crate::graph::port::{RasterF32, RasterU16, RasterU8};
use crate::superchunk::region::REGION_SIZE;

#[derive(Debug, Clone)]
pub struct SuperChunkRasters {
    pub height_map: RasterF32,
    pub biome_map: RasterU8,
    pub river_map: RasterU8,
    pub block_map: RasterU16,
}

impl SuperChunkRasters {
    pub fn empty() -> Self {
        Self {
            height_map: RasterF32::filled(REGION_SIZE, REGION_SIZE, 0.0),
            biome_map: RasterU8::filled(REGION_SIZE, REGION_SIZE, 0),
            river_map: RasterU8::filled(REGION_SIZE, REGION_SIZE, 0),
            block_map: RasterU16::filled(REGION_SIZE, REGION_SIZE, 0),
        }
    }

    pub fn heightmap_bytes(&self) -> Vec<u8> {
        bytemuck::cast_slice(&self.height_map.data).to_vec()
    }

    pub fn biomemap_bytes(&self) -> Vec<u8> {
        self.biome_map.data.clone()
    }

    pub fn rivermap_bytes(&self) -> Vec<u8> {
        self.river_map.data.clone()
    }

    pub fn blockmap_bytes(&self) -> Vec<u8> {
        bytemuck::cast_slice(&self.block_map.data).to_vec()
    }

    /// Reconstructs a full raster set from the four `REGION_SIZE^2`
    /// on-disk byte buffers, in the same field order the generator
    /// produces them.
    pub fn from_bytes(
        heightmap: &[u8],
        biomemap: &[u8],
        rivermap: &[u8],
        blockmap: &[u8],
    ) -> crate::core::Result<Self> {
        let cells = REGION_SIZE * REGION_SIZE;
        let height: &[f32] = bytemuck::try_cast_slice(heightmap)
            .map_err(|_| crate::core::Error::InternalError("malformed heightmap bytes".into()))?;
        let block: &[u16] = bytemuck::try_cast_slice(blockmap)
            .map_err(|_| crate::core::Error::InternalError("malformed blockmap bytes".into()))?;
        if height.len() != cells || biomemap.len() != cells || rivermap.len() != cells || block.len() != cells {
            return Err(crate::core::Error::InternalError("super-chunk raster has wrong cell count".into()));
        }
        Ok(Self {
            height_map: RasterF32 { width: REGION_SIZE, height: REGION_SIZE, data: height.to_vec() },
            biome_map: RasterU8 { width: REGION_SIZE, height: REGION_SIZE, data: biomemap.to_vec() },
            river_map: RasterU8 { width: REGION_SIZE, height: REGION_SIZE, data: rivermap.to_vec() },
            block_map: RasterU16 { width: REGION_SIZE, height: REGION_SIZE, data: block.to_vec() },
        })
    }
}
