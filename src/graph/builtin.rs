//! A small set of concrete node kinds sufficient to exercise the executor
//! end-to-end. Integrators register their own kinds through the same
//! [`NodeRegistry::register`] API; this module is not an exhaustive node
//! library.

use std::collections::HashMap;
use std::sync::Arc;

use noise::{Fbm, MultiFractal, NoiseFn, Perlin, Seedable};
use rayon::prelude::*;

use crate::core::{Error, Result};
use crate::graph::node::{param_f32, param_u32, Node, NodeContext};
use crate::graph::port::{PortValue, RasterF32, RasterU16, RasterU8};
use crate::graph::registry::NodeRegistry;

pub fn register_defaults(registry: &mut NodeRegistry) -> Result<()> {
    registry.register("constant-f32", Arc::new(ConstantF32))?;
    registry.register("constant-u8", Arc::new(ConstantU8))?;
    registry.register("constant-u16", Arc::new(ConstantU16))?;
    registry.register("perlin-height", Arc::new(PerlinHeight))?;
    registry.register("normalize", Arc::new(Normalize))?;
    registry.register("threshold-biome", Arc::new(ThresholdBiome))?;
    registry.register("constant-block", Arc::new(ConstantBlock))?;
    Ok(())
}

struct ConstantF32;
impl Node for ConstantF32 {
    fn process(
        &self,
        _inputs: &HashMap<String, PortValue>,
        params: &serde_json::Value,
        ctx: &NodeContext,
    ) -> Result<HashMap<String, PortValue>> {
        let value = param_f32(params, "value", 0.0);
        let mut out = HashMap::new();
        out.insert("out".to_string(), PortValue::F32Raster(RasterF32::filled(ctx.width, ctx.height, value)));
        Ok(out)
    }
}

struct ConstantU8;
impl Node for ConstantU8 {
    fn process(
        &self,
        _inputs: &HashMap<String, PortValue>,
        params: &serde_json::Value,
        ctx: &NodeContext,
    ) -> Result<HashMap<String, PortValue>> {
        let value = param_u32(params, "value", 0) as u8;
        let mut out = HashMap::new();
        out.insert("out".to_string(), PortValue::U8Raster(RasterU8::filled(ctx.width, ctx.height, value)));
        Ok(out)
    }
}

struct ConstantU16;
impl Node for ConstantU16 {
    fn process(
        &self,
        _inputs: &HashMap<String, PortValue>,
        params: &serde_json::Value,
        ctx: &NodeContext,
    ) -> Result<HashMap<String, PortValue>> {
        let value = param_u32(params, "value", 0) as u16;
        let mut out = HashMap::new();
        out.insert("out".to_string(), PortValue::U16Raster(RasterU16::filled(ctx.width, ctx.height, value)));
        Ok(out)
    }
}

/// Alias of `constant-u16`, named for the block-id use case at the end of
/// a voxel-material wiring.
struct ConstantBlock;
impl Node for ConstantBlock {
    fn process(
        &self,
        inputs: &HashMap<String, PortValue>,
        params: &serde_json::Value,
        ctx: &NodeContext,
    ) -> Result<HashMap<String, PortValue>> {
        ConstantU16.process(inputs, params, ctx)
    }
}

/// Fractal Brownian motion height field, grounded in the same
/// octaves/persistence/lacunarity/scale parameterization as a conventional
/// terrain height generator.
struct PerlinHeight;
impl Node for PerlinHeight {
    fn process(
        &self,
        _inputs: &HashMap<String, PortValue>,
        params: &serde_json::Value,
        ctx: &NodeContext,
    ) -> Result<HashMap<String, PortValue>> {
        let octaves = param_u32(params, "octaves", 4) as usize;
        let persistence = param_f32(params, "persistence", 0.5) as f64;
        let lacunarity = param_f32(params, "lacunarity", 2.0) as f64;
        let scale = param_f32(params, "scale", 0.01) as f64;

        let fbm: Fbm<Perlin> = Fbm::new(ctx.world_seed as u32)
            .set_octaves(octaves)
            .set_persistence(persistence)
            .set_lacunarity(lacunarity);

        let mut raster = RasterF32::filled(ctx.width, ctx.height, 0.0);
        let width = ctx.width;
        raster.data.par_chunks_mut(width).enumerate().for_each(|(z, row)| {
            for (x, cell) in row.iter_mut().enumerate() {
                let wx = (ctx.origin_x + x as i64) as f64 * scale;
                let wz = (ctx.origin_z + z as i64) as f64 * scale;
                let sample = fbm.get([wx, wz]) as f32;
                // noise output is roughly in [-1, 1]; rescale to [0, 1].
                *cell = (sample + 1.0) * 0.5;
            }
        });

        let mut out = HashMap::new();
        out.insert("out".to_string(), PortValue::F32Raster(raster));
        Ok(out)
    }
}

/// Rescales its `in` input raster into `[0, 1]`. This is the "last
/// Normalize" node a sink falls back to when it has no explicit wiring.
struct Normalize;
impl Node for Normalize {
    fn process(
        &self,
        inputs: &HashMap<String, PortValue>,
        _params: &serde_json::Value,
        ctx: &NodeContext,
    ) -> Result<HashMap<String, PortValue>> {
        let input = inputs
            .get("in")
            .and_then(PortValue::as_f32_raster)
            .ok_or_else(|| Error::MissingInputError { node: "normalize".into(), port: "in".into() })?;

        let (mut lo, mut hi) = (f32::INFINITY, f32::NEG_INFINITY);
        for &v in &input.data {
            lo = lo.min(v);
            hi = hi.max(v);
        }
        let span = (hi - lo).max(f32::EPSILON);

        let mut raster = RasterF32::filled(ctx.width, ctx.height, 0.0);
        for (dst, &src) in raster.data.iter_mut().zip(&input.data) {
            *dst = (src - lo) / span;
        }

        let mut out = HashMap::new();
        out.insert("out".to_string(), PortValue::F32Raster(raster));
        Ok(out)
    }
}

/// Classifies a height raster into a handful of biome indices around a sea
/// level threshold, the minimal case of a height-driven biome classifier.
struct ThresholdBiome;
impl Node for ThresholdBiome {
    fn process(
        &self,
        inputs: &HashMap<String, PortValue>,
        params: &serde_json::Value,
        ctx: &NodeContext,
    ) -> Result<HashMap<String, PortValue>> {
        let height = inputs
            .get("height")
            .and_then(PortValue::as_f32_raster)
            .ok_or_else(|| Error::MissingInputError { node: "threshold-biome".into(), port: "height".into() })?;

        let sea_level = param_f32(params, "sea_level", 0.3);
        let mountain_level = param_f32(params, "mountain_level", 0.75);

        let mut raster = RasterU8::filled(ctx.width, ctx.height, 0);
        for (dst, &h) in raster.data.iter_mut().zip(&height.data) {
            *dst = if h < sea_level {
                0 // ocean
            } else if h < mountain_level {
                1 // plains
            } else {
                2 // mountain
            };
        }

        let mut out = HashMap::new();
        out.insert("out".to_string(), PortValue::U8Raster(raster));
        Ok(out)
    }
}
