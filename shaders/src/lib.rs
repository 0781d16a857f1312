#![cfg_attr(target_arch = "spirv", no_std)]
// HACK(eddyb) can't easily see warnings otherwise from `spirv-builder` builds.
#![deny(warnings)]

use spirv_std::{
    glam::{vec2, vec3, Vec2, Vec3, Vec4},
    spirv,
};

/// Vertex shader for the hard-coded triangle
///
/// There is no vertex buffer: `vertex_index` (0, 1 or 2) selects one of three
/// clip-space positions, listed clockwise as seen on screen, and a red, green
/// or blue color that the rasterizer interpolates across the face.
#[spirv(vertex)]
pub fn main_vs(
    #[spirv(vertex_index)] vert_idx: i32,
    #[spirv(position)] builtin_pos: &mut Vec4,
    frag_color: &mut Vec3,
) {
    let (pos, color): (Vec2, Vec3) = match vert_idx {
        0 => (vec2(0.0, -0.5), vec3(1.0, 0.0, 0.0)),
        1 => (vec2(0.5, 0.5), vec3(0.0, 1.0, 0.0)),
        _ => (vec2(-0.5, 0.5), vec3(0.0, 0.0, 1.0)),
    };

    *builtin_pos = pos.extend(0.0).extend(1.0);
    *frag_color = color;
}

/// Fragment shader writing the interpolated vertex color, fully opaque.
#[spirv(fragment)]
pub fn main_fs(frag_color: Vec3, output: &mut Vec4) {
    *output = frag_color.extend(1.0);
}
