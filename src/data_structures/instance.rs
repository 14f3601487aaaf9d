//! Instance transformation data for GPU rendering.
//!
//! Placement records coming from a mission's object list are turned into
//! [`Instance`]s, composed with the mesh-local static transform of their model
//! and finally flattened into [`InstanceRaw`] rows for multi-draw instancing.

use std::ops::Mul;

use cgmath::{Matrix, One, Rotation3, SquareMatrix};

use crate::data_structures::{archive::Transform, model, name::ResourceName};

/// An external instruction to draw one copy of a named model.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacementRecord {
    pub name: String,
    pub position: [f32; 3],
    /// Yaw in radians about the up (y) axis.
    pub orientation: f32,
}

impl PlacementRecord {
    pub fn new(name: impl Into<String>, position: [f32; 3], orientation: f32) -> Self {
        Self {
            name: name.into(),
            position,
            orientation,
        }
    }

    pub fn model(&self) -> ResourceName {
        ResourceName::new(&self.name)
    }

    /// Value along the depth axis used for back-to-front ordering.
    pub fn depth(&self) -> f32 {
        self.position[2]
    }
}

/// Per-instance transformation: position, rotation (as quaternion), and scale.
#[derive(Clone, Debug)]
pub struct Instance {
    pub position: cgmath::Vector3<f32>,
    pub rotation: cgmath::Quaternion<f32>,
    pub scale: cgmath::Vector3<f32>,
}

impl Instance {
    /// Create a new instance with identity transformation (no move, rotate, or scale).
    pub fn new() -> Self {
        Self {
            position: cgmath::Vector3::new(0.0, 0.0, 0.0),
            // `Quaternion::one()` is the identity quaternion (no rotation)
            rotation: cgmath::Quaternion::one(),
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.position)
            * cgmath::Matrix4::from(self.rotation)
            * cgmath::Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    pub fn to_raw(&self) -> InstanceRaw {
        InstanceRaw::from_matrix(self.to_matrix())
    }
}

impl<'a, 'b> Mul<&'b Instance> for &'a Instance {
    type Output = Instance;

    /// `self` placed in world space after `rhs` was applied in local space.
    fn mul(self, rhs: &'b Instance) -> Self::Output {
        let new_rotation = self.rotation * rhs.rotation;

        let new_scale = cgmath::Vector3::new(
            self.scale.x * rhs.scale.x,
            self.scale.y * rhs.scale.y,
            self.scale.z * rhs.scale.z,
        );
        let scaled_rhs_pos = cgmath::Vector3::new(
            self.scale.x * rhs.position.x,
            self.scale.y * rhs.position.y,
            self.scale.z * rhs.position.z,
        );
        let new_position = self.position + (self.rotation * scaled_rhs_pos);

        Instance {
            position: new_position,
            rotation: new_rotation,
            scale: new_scale,
        }
    }
}

impl From<&PlacementRecord> for Instance {
    fn from(record: &PlacementRecord) -> Self {
        Instance {
            position: record.position.into(),
            rotation: cgmath::Quaternion::from_angle_y(cgmath::Rad(record.orientation)),
            ..Default::default()
        }
    }
}

impl From<&Transform> for Instance {
    fn from(transform: &Transform) -> Self {
        Instance {
            position: transform.translation.into(),
            rotation: transform.quaternion(),
            ..Default::default()
        }
    }
}

impl From<cgmath::Vector3<f32>> for Instance {
    fn from(position: cgmath::Vector3<f32>) -> Self {
        Instance {
            position,
            ..Default::default()
        }
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

/**
 * The raw instance is the actual data stored on the GPU
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    model: [[f32; 4]; 4],
    normal: [[f32; 3]; 3],
    handedness: f32,
}

impl InstanceRaw {
    /// Packs a composed world matrix. The normal matrix is the inverse
    /// transpose of the upper 3x3, falling back to the plain 3x3 when singular.
    pub fn from_matrix(world: cgmath::Matrix4<f32>) -> Self {
        let upper = cgmath::Matrix3::from_cols(
            world.x.truncate(),
            world.y.truncate(),
            world.z.truncate(),
        );
        let normal = upper.invert().map(|m| m.transpose()).unwrap_or(upper);
        InstanceRaw {
            model: world.into(),
            normal: normal.into(),
            handedness: world.determinant().signum(),
        }
    }

    pub fn model(&self) -> [[f32; 4]; 4] {
        self.model
    }

    pub fn handedness(&self) -> f32 {
        self.handedness
    }
}

/**
 * As we store vertex data directly in the GPU memory we need to tell what the bytes refer to:
 *
 * offset: zero as we want to use the full space.
 * stride: length of an instance row
 *
 * Stride layout here: world matrix as four 4d vectors, normal matrix as three 3d vectors, handedness
 */
impl model::Vertex for InstanceRaw {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            // Shaders advance to the next row once per instance, not per vertex
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // A mat4 takes up 4 vertex slots as it is technically 4 vec4s.
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 8,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 16]>() as wgpu::BufferAddress,
                    shader_location: 9,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 19]>() as wgpu::BufferAddress,
                    shader_location: 10,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 22]>() as wgpu::BufferAddress,
                    shader_location: 11,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 25]>() as wgpu::BufferAddress,
                    shader_location: 12,
                    format: wgpu::VertexFormat::Float32,
                },
            ],
        }
    }
}
