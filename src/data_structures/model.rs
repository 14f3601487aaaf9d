//! GPU vertex layouts for archive geometry.

use crate::data_structures::archive::VertexBuffer;

/// Anything that can describe its own vertex buffer layout to a pipeline.
pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

/// Interleaved vertex as uploaded for nature meshes.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct NatureVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [u8; 4],
    pub tex_coords: [f32; 2],
}

impl NatureVertex {
    /// Interleaves the parallel arrays of a parsed buffer.
    pub fn interleave(buffer: &VertexBuffer) -> Vec<NatureVertex> {
        (0..buffer.len())
            .map(|i| NatureVertex {
                position: [
                    buffer.positions[i * 3],
                    buffer.positions[i * 3 + 1],
                    buffer.positions[i * 3 + 2],
                ],
                normal: [
                    buffer.normals[i * 3],
                    buffer.normals[i * 3 + 1],
                    buffer.normals[i * 3 + 2],
                ],
                color: [
                    buffer.colors[i * 4],
                    buffer.colors[i * 4 + 1],
                    buffer.colors[i * 4 + 2],
                    buffer.colors[i * 4 + 3],
                ],
                tex_coords: [buffer.uv[i * 2], buffer.uv[i * 2 + 1]],
            })
            .collect()
    }
}

impl Vertex for NatureVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<NatureVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // Colors stay 0-255 on the CPU side, the GPU normalizes them
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Unorm8x4,
                },
                wgpu::VertexAttribute {
                    offset: (mem::size_of::<[f32; 6]>() + mem::size_of::<[u8; 4]>())
                        as wgpu::BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interleave_keeps_vertex_order() {
        let buffer = VertexBuffer {
            num_vertices: 2,
            positions: vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0],
            normals: vec![0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
            colors: vec![255, 0, 0, 255, 0, 255, 0, 128],
            uv: vec![0.0, 0.5, 1.0, 1.0],
        };
        let vertices = NatureVertex::interleave(&buffer);
        assert_eq!(vertices.len(), 2);
        assert_eq!(vertices[1].position, [3.0, 4.0, 5.0]);
        assert_eq!(vertices[1].color, [0, 255, 0, 128]);
        assert_eq!(vertices[0].tex_coords, [0.0, 0.5]);
        assert_eq!(std::mem::size_of::<NatureVertex>(), 36);
    }
}
