use crate::render::MaterialBucket;

/// Fixed-function state a bucket is drawn with.
///
/// All nature surfaces are double sided and blended; the buckets only differ in
/// how they treat the depth buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawState {
    pub depth_test: bool,
    pub depth_write: bool,
    pub blend: Option<wgpu::BlendState>,
    pub cull_mode: Option<wgpu::Face>,
}

impl DrawState {
    pub fn for_bucket(bucket: MaterialBucket) -> Self {
        let blended = DrawState {
            depth_test: true,
            depth_write: true,
            blend: Some(wgpu::BlendState::ALPHA_BLENDING),
            cull_mode: None,
        };
        match bucket {
            MaterialBucket::Shadow => DrawState {
                depth_test: false,
                depth_write: false,
                ..blended
            },
            MaterialBucket::Alpha => DrawState {
                depth_test: false,
                ..blended
            },
            MaterialBucket::Opaque | MaterialBucket::AlphaTest => blended,
        }
    }

    pub fn depth_compare(&self) -> wgpu::CompareFunction {
        if self.depth_test {
            wgpu::CompareFunction::Less
        } else {
            wgpu::CompareFunction::Always
        }
    }
}

/// Water is blended on top of the depth buffer without writing to it.
pub fn water_draw_state() -> DrawState {
    DrawState {
        depth_test: true,
        depth_write: false,
        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
        cull_mode: None,
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct NatureUniform {
    pub time: f32,
    // Due to uniforms requiring 16 byte (4 float) spacing, we need to use a padding field here
    _padding: [f32; 3],
}

impl NatureUniform {
    pub fn new(time: f32) -> Self {
        Self {
            time,
            _padding: [0.0; 3],
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct WaterUniform {
    pub time: f32,
    _padding: f32,
    pub direction: [f32; 2],
}

impl WaterUniform {
    pub fn new(time: f32, direction: [f32; 2]) -> Self {
        Self {
            time,
            _padding: 0.0,
            direction,
        }
    }
}
