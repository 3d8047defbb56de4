//! Typed values that flow between node-graph ports.

use serde::{Deserialize, Serialize};

/// The kind of value a port produces or consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortKind {
    F32Raster,
    U8Raster,
    U16Raster,
    GradientRaster,
    Scalar,
    Seed,
}

/// A raster of `f32` samples over a `width x height` grid, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterF32 {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f32>,
}

impl RasterF32 {
    pub fn filled(width: usize, height: usize, value: f32) -> Self {
        Self { width, height, data: vec![value; width * height] }
    }

    pub fn get(&self, x: usize, z: usize) -> f32 {
        self.data[z * self.width + x]
    }

    pub fn set(&mut self, x: usize, z: usize, value: f32) {
        self.data[z * self.width + x] = value;
    }
}

/// A raster of `u8` samples, used for biome/river masks.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterU8 {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl RasterU8 {
    pub fn filled(width: usize, height: usize, value: u8) -> Self {
        Self { width, height, data: vec![value; width * height] }
    }

    pub fn get(&self, x: usize, z: usize) -> u8 {
        self.data[z * self.width + x]
    }

    pub fn set(&mut self, x: usize, z: usize, value: u8) {
        self.data[z * self.width + x] = value;
    }
}

/// A raster of `u16` samples, used for block ids.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterU16 {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u16>,
}

impl RasterU16 {
    pub fn filled(width: usize, height: usize, value: u16) -> Self {
        Self { width, height, data: vec![value; width * height] }
    }

    pub fn get(&self, x: usize, z: usize) -> u16 {
        self.data[z * self.width + x]
    }

    pub fn set(&mut self, x: usize, z: usize, value: u16) {
        self.data[z * self.width + x] = value;
    }
}

/// A raster of 2D gradient vectors, one per cell.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterGradient {
    pub width: usize,
    pub height: usize,
    pub data: Vec<(f32, f32)>,
}

/// A value carried on a graph edge or produced at a sink.
#[derive(Debug, Clone)]
pub enum PortValue {
    F32Raster(RasterF32),
    U8Raster(RasterU8),
    U16Raster(RasterU16),
    GradientRaster(RasterGradient),
    Scalar(f32),
    Seed(u64),
}

impl PortValue {
    pub fn kind(&self) -> PortKind {
        match self {
            PortValue::F32Raster(_) => PortKind::F32Raster,
            PortValue::U8Raster(_) => PortKind::U8Raster,
            PortValue::U16Raster(_) => PortKind::U16Raster,
            PortValue::GradientRaster(_) => PortKind::GradientRaster,
            PortValue::Scalar(_) => PortKind::Scalar,
            PortValue::Seed(_) => PortKind::Seed,
        }
    }

    pub fn as_f32_raster(&self) -> Option<&RasterF32> {
        match self {
            PortValue::F32Raster(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_u8_raster(&self) -> Option<&RasterU8> {
        match self {
            PortValue::U8Raster(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_u16_raster(&self) -> Option<&RasterU16> {
        match self {
            PortValue::U16Raster(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<f32> {
        match self {
            PortValue::Scalar(s) => Some(*s),
            _ => None,
        }
    }

    pub fn as_seed(&self) -> Option<u64> {
        match self {
            PortValue::Seed(s) => Some(*s),
            _ => None,
        }
    }
}
