use bytemuck::{Pod, Zeroable};

use crate::render::Splat;
use crate::visuals::{FillStyle, Marker};

pub const SPLAT_SOURCE: &str = include_str!("gpu/splat.wgsl");

/// One instanced splat as laid out in the vertex buffer.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct SplatInstance {
    pub center: [f32; 2],
    pub radius: f32,
    pub glow: f32,
    pub color: [f32; 4],
    pub marker: u32,
    pub _pad: [u32; 3],
}

impl SplatInstance {
    pub fn new(splat: &Splat, style: &FillStyle, marker: Marker) -> Self {
        Self {
            center: splat.center.to_array(),
            radius: splat.radius,
            glow: style.glow,
            color: [style.color.x, style.color.y, style.color.z, style.alpha],
            marker: marker.shader_index(),
            _pad: [0; 3],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct FrameUniforms {
    pub viewport: [f32; 2],
    pub _pad: [f32; 2],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_layout() {
        assert_eq!(std::mem::size_of::<SplatInstance>(), 48);
        assert_eq!(std::mem::size_of::<FrameUniforms>(), 16);
    }

    #[test]
    fn test_splat_shader_validates() {
        let module = naga::front::wgsl::parse_str(SPLAT_SOURCE).expect("WGSL parse error");
        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        validator.validate(&module).expect("WGSL validation error");
    }
}
