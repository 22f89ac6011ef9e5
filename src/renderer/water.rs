//! Water surface shader and its uniform block
//!
//! The WGSL wave function is generated from `sim::wave::WAVE_TERMS` so the
//! vertex displacement can never drift from the surface gameplay tests against.

use std::fmt::Write as _;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::consts::RIPPLE_RADIUS;
use crate::sim::Snapshot;
use crate::sim::wave::{
    RIPPLE_AMPLITUDE, RIPPLE_ANGULAR_SPEED, RIPPLE_SPATIAL_FREQ, WAVE_TERMS, WaveAxis,
};

/// Vertical field of view (degrees)
pub const FOV_Y_DEGREES: f32 = 60.0;
pub const Z_NEAR: f32 = 0.1;
pub const Z_FAR: f32 = 5000.0;

/// 0x001e36
pub const COLOR_DEEP: [f32; 3] = [0.0, 30.0 / 255.0, 54.0 / 255.0];
/// 0x006994
pub const COLOR_SHALLOW: [f32; 3] = [0.0, 105.0 / 255.0, 148.0 / 255.0];
/// Directional light position, normalised in the shader
pub const SUN_POSITION: [f32; 3] = [100.0, 200.0, 50.0];

// ============================================================================
// GPU DATA STRUCTURES (must match shader)
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WaterUniforms {
    pub view_proj: [[f32; 4]; 4], // offset 0
    pub camera_pos: [f32; 3],     // offset 64
    pub time: f32,                // offset 76
    pub ripple_center: [f32; 2],  // offset 80
    pub ripple_radius: f32,       // offset 88
    pub underwater: u32,          // offset 92
    pub color_deep: [f32; 3],     // offset 96
    pub _pad0: f32,
    pub color_shallow: [f32; 3],  // offset 112
    pub _pad1: f32,
    pub sun_position: [f32; 3],   // offset 128
    pub _pad2: f32,               // 144 bytes total
}

impl WaterUniforms {
    /// Uniforms for one frame of the chase camera view
    pub fn from_snapshot(snapshot: &Snapshot, aspect: f32) -> Self {
        let camera = &snapshot.camera;
        let view = Mat4::look_at_rh(camera.pos, camera.look_at, Vec3::Y);
        let proj = Mat4::perspective_rh(FOV_Y_DEGREES.to_radians(), aspect.max(1e-3), Z_NEAR, Z_FAR);
        Self {
            view_proj: (proj * view).to_cols_array_2d(),
            camera_pos: camera.pos.to_array(),
            time: snapshot.time,
            ripple_center: snapshot.ripple_center.to_array(),
            ripple_radius: RIPPLE_RADIUS,
            underwater: u32::from(camera.underwater),
            color_deep: COLOR_DEEP,
            _pad0: 0.0,
            color_shallow: COLOR_SHALLOW,
            _pad1: 0.0,
            sun_position: SUN_POSITION,
            _pad2: 0.0,
        }
    }
}

/// WGSL float literal (always carries a decimal point)
fn lit(v: f32) -> String {
    format!("{v:?}")
}

/// `fn wave_height(p: vec2<f32>, t: f32) -> f32` built from the term table
pub fn wave_height_wgsl() -> String {
    let mut src = String::from("fn wave_height(p: vec2<f32>, t: f32) -> f32 {\n    var y = 0.0;\n");
    for term in &WAVE_TERMS {
        let (func, coord) = match term.axis {
            WaveAxis::X => ("sin", "p.x"),
            WaveAxis::Z => ("cos", "p.y"),
        };
        // Writing to a String cannot fail
        let _ = writeln!(
            src,
            "    y += {func}({coord} * {} + t * {}) * {};",
            lit(term.frequency),
            lit(term.speed),
            lit(term.amplitude)
        );
    }
    src.push_str("    return y;\n}\n");
    src
}

fn ripple_wgsl() -> String {
    format!(
        "fn wake_ripple(p: vec2<f32>, t: f32) -> f32 {{
    let d = distance(p, u.ripple_center);
    if (d >= u.ripple_radius) {{
        return 0.0;
    }}
    let intensity = 1.0 - d / u.ripple_radius;
    return sin(d * {} - t * {}) * {} * intensity;
}}
",
        lit(RIPPLE_SPATIAL_FREQ),
        lit(RIPPLE_ANGULAR_SPEED),
        lit(RIPPLE_AMPLITUDE)
    )
}

const UNIFORMS_WGSL: &str = "struct WaterUniforms {
    view_proj: mat4x4<f32>,
    camera_pos: vec3<f32>,
    time: f32,
    ripple_center: vec2<f32>,
    ripple_radius: f32,
    underwater: u32,
    color_deep: vec3<f32>,
    color_shallow: vec3<f32>,
    sun_position: vec3<f32>,
};

@group(0) @binding(0) var<uniform> u: WaterUniforms;

struct VertexOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) world: vec3<f32>,
    @location(1) height: f32,
};
";

const STAGES_WGSL: &str = "@vertex
fn vs_main(@location(0) grid: vec2<f32>) -> VertexOut {
    let h = wave_height(grid, u.time) + wake_ripple(grid, u.time);
    let world = vec3<f32>(grid.x, h, grid.y);
    var out: VertexOut;
    out.clip = u.view_proj * vec4<f32>(world, 1.0);
    out.world = world;
    out.height = h;
    return out;
}

fn hash(p: vec2<f32>) -> f32 {
    return fract(sin(dot(p, vec2<f32>(12.9898, 78.233))) * 43758.5453);
}

fn noise(p: vec2<f32>) -> f32 {
    let i = floor(p);
    var f = fract(p);
    f = f * f * (3.0 - 2.0 * f);
    return mix(mix(hash(i), hash(i + vec2<f32>(1.0, 0.0)), f.x),
               mix(hash(i + vec2<f32>(0.0, 1.0)), hash(i + vec2<f32>(1.0, 1.0)), f.x), f.y);
}

@fragment
fn fs_main(in: VertexOut) -> @location(0) vec4<f32> {
    var normal = normalize(cross(dpdx(in.world), dpdy(in.world)));
    let n = noise(in.world.xz * 0.2 + u.time * 0.5);
    normal = normalize(normal + vec3<f32>((n - 0.5) * 0.2, 0.0, (n - 0.5) * 0.2));

    let view_dir = normalize(u.camera_pos - in.world);
    var color = mix(u.color_deep, u.color_shallow, smoothstep(-5.0, 5.0, in.height));

    let half_vec = normalize(normalize(u.sun_position) + view_dir);
    let specular = pow(max(0.0, dot(normal, half_vec)), 100.0);
    let fresnel = pow(1.0 - max(0.0, dot(view_dir, normal)), 3.0);
    color = mix(color, vec3<f32>(0.8, 0.9, 1.0), fresnel * 0.6);
    color += vec3<f32>(specular * 0.8);

    if (u.underwater == 1u) {
        color = mix(color, u.color_deep, 0.5);
    }
    return vec4<f32>(color, 0.85);
}
";

/// Complete water shader module
pub fn water_shader_source() -> String {
    let mut src = String::from(UNIFORMS_WGSL);
    src.push('\n');
    src.push_str(&wave_height_wgsl());
    src.push('\n');
    src.push_str(&ripple_wgsl());
    src.push('\n');
    src.push_str(STAGES_WGSL);
    src
}

/// Flat grid of `(x, z)` vertices centred on the origin, triangle-list indexed
pub fn water_grid(size: f32, divisions: u32) -> (Vec<[f32; 2]>, Vec<u32>) {
    let divisions = divisions.max(1);
    let step = size / divisions as f32;
    let half = size * 0.5;
    let row = divisions + 1;

    let vertices = (0..row)
        .flat_map(|j| (0..row).map(move |i| [i as f32 * step - half, j as f32 * step - half]))
        .collect();

    let mut indices = Vec::with_capacity((divisions * divisions * 6) as usize);
    for j in 0..divisions {
        for i in 0..divisions {
            let a = j * row + i;
            let b = a + 1;
            let c = a + row;
            let d = c + 1;
            indices.extend_from_slice(&[a, c, b, b, c, d]);
        }
    }
    (vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{RaceConfig, new_race};

    #[test]
    fn test_uniform_layout() {
        assert_eq!(std::mem::size_of::<WaterUniforms>(), 144);
        assert_eq!(std::mem::offset_of!(WaterUniforms, camera_pos), 64);
        assert_eq!(std::mem::offset_of!(WaterUniforms, ripple_center), 80);
        assert_eq!(std::mem::offset_of!(WaterUniforms, color_deep), 96);
        assert_eq!(std::mem::offset_of!(WaterUniforms, sun_position), 128);
    }

    #[test]
    fn test_shader_uses_every_wave_term() {
        let src = water_shader_source();
        for term in &WAVE_TERMS {
            let expected = format!(
                "{} + t * {}) * {};",
                lit(term.frequency),
                lit(term.speed),
                lit(term.amplitude)
            );
            assert!(src.contains(&expected), "missing `{expected}`");
        }
        assert_eq!(src.matches("y += sin(p.x").count(), 3);
        assert_eq!(src.matches("y += cos(p.y").count(), 3);
        assert!(src.contains("@vertex") && src.contains("@fragment"));
        // Float literals only
        assert!(src.contains("* 3.0;"));
    }

    #[test]
    fn test_uniforms_follow_snapshot() {
        let race = new_race(RaceConfig::default(), 2).unwrap();
        let snapshot = Snapshot::capture(&race, true);
        let uniforms = WaterUniforms::from_snapshot(&snapshot, 16.0 / 9.0);
        assert_eq!(uniforms.ripple_center, [race.player.pos.x, race.player.pos.z]);
        assert_eq!(uniforms.ripple_radius, RIPPLE_RADIUS);
        assert_eq!(uniforms.camera_pos, race.camera.pos.to_array());
        assert!(uniforms.view_proj.iter().flatten().all(|v| v.is_finite()));
        assert_eq!(bytemuck::bytes_of(&uniforms).len(), 144);
    }

    #[test]
    fn test_water_grid() {
        let (vertices, indices) = water_grid(100.0, 4);
        assert_eq!(vertices.len(), 25);
        assert_eq!(indices.len(), 4 * 4 * 6);
        assert_eq!(vertices[0], [-50.0, -50.0]);
        assert_eq!(vertices[24], [50.0, 50.0]);
        assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
    }
}
