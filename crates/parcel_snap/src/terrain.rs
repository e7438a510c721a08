use bevy::prelude::*;
use fastnoise_lite::{FastNoiseLite, NoiseType};

use crate::config::{CELL_SIZE, TERRAIN_BASE_FREQUENCY, TERRAIN_HEIGHT_SCALE, WATER_LEVEL_Y};

/// Ground height lookup used for vertical placement and road height checks.
pub trait HeightSampler {
    /// Ground height under `position`. Over water this is the water surface.
    fn sample_height(&self, position: Vec3) -> f32;
}

/// Procedural height field built on OpenSimplex2 noise.
pub struct NoiseTerrain {
    noise: FastNoiseLite,
}

impl NoiseTerrain {
    pub fn new(seed: i32) -> Self {
        let mut noise = FastNoiseLite::with_seed(seed);
        noise.set_noise_type(Some(NoiseType::OpenSimplex2));
        noise.set_frequency(Some(TERRAIN_BASE_FREQUENCY));
        Self { noise }
    }

    /// Land surface height, ignoring water.
    pub fn ground_height(&self, x: f32, z: f32) -> f32 {
        let raw = self.noise.get_noise_2d(x / CELL_SIZE, z / CELL_SIZE);
        let elevation = (raw + 1.0) * 0.5; // normalize to 0..1
        elevation * TERRAIN_HEIGHT_SCALE
    }
}

impl HeightSampler for NoiseTerrain {
    fn sample_height(&self, position: Vec3) -> f32 {
        self.ground_height(position.x, position.z).max(WATER_LEVEL_Y)
    }
}

/// Terrain the resolver samples heights from.
#[derive(Resource)]
pub enum TerrainSurface {
    Flat { height: f32 },
    Noise(NoiseTerrain),
}

impl Default for TerrainSurface {
    fn default() -> Self {
        TerrainSurface::Flat { height: 0.0 }
    }
}

impl TerrainSurface {
    pub fn noise(seed: i32) -> Self {
        TerrainSurface::Noise(NoiseTerrain::new(seed))
    }
}

impl HeightSampler for TerrainSurface {
    fn sample_height(&self, position: Vec3) -> f32 {
        match self {
            TerrainSurface::Flat { height } => *height,
            TerrainSurface::Noise(terrain) => terrain.sample_height(position),
        }
    }
}
