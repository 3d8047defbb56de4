//! Material palette and the transparency rule used to derive the opaque
//! SVDAG from the material SVDAG.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub const AIR: u16 = 0;

/// Transparent material ids default to this threshold unless the world's
/// material table overrides them explicitly.
const DEFAULT_TRANSPARENCY: f32 = 0.0;

/// Material id 6 is transparent by default, matching the convention used
/// throughout the voxel profile fill rule for glass/foliage-adjacent ids
/// that didn't get an explicit table entry.
const DEFAULT_TRANSPARENT_MATERIAL: u16 = 6;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialEntry {
    pub id: u16,
    pub name: String,
    /// `[r, g, b]`, world config's external display color (spec.md §6.4);
    /// the core doesn't read it, only carries it through to the manifest.
    #[serde(default = "default_color")]
    pub color: [u8; 3],
    #[serde(default)]
    pub transparency: f32,
}

fn default_color() -> [u8; 3] {
    [255, 255, 255]
}

/// Maps material id to opacity. A material counts as transparent when its
/// `transparency` exceeds `0.5`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaterialTable {
    entries: HashMap<u16, MaterialEntry>,
}

impl MaterialTable {
    pub fn new(entries: Vec<MaterialEntry>) -> Self {
        Self { entries: entries.into_iter().map(|e| (e.id, e)).collect() }
    }

    pub fn entries(&self) -> impl Iterator<Item = &MaterialEntry> {
        self.entries.values()
    }

    pub fn transparency(&self, material: u16) -> f32 {
        if material == AIR {
            return 1.0;
        }
        match self.entries.get(&material) {
            Some(entry) => entry.transparency,
            None if material == DEFAULT_TRANSPARENT_MATERIAL => 1.0,
            None => DEFAULT_TRANSPARENCY,
        }
    }

    pub fn is_transparent(&self, material: u16) -> bool {
        self.transparency(material) > 0.5
    }
}
