//! Render-side data
//!
//! The page owns the GPU context. This module supplies what it uploads: the
//! water shader, its uniform block, the water grid and asset slot state.

pub mod assets;
pub mod water;

pub use assets::{Assets, ModelSlot};
pub use water::{WaterUniforms, water_grid, water_shader_source};
