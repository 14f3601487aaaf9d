//! Model archive (`.pba`) parser.
//!
//! # Layout
//! ```text
//! format        u32            1 = legacy (no alternate textures)
//! frame         u32 len        archive body
//!   name        string
//!   frame       u32 len        scene
//!     transforms  u32 count, then { name, parent i32, rotation 4xf32 (w,x,y,z), translation 3xf32 }
//!     textures    u32 count, then string
//!     frame       u32 len      mesh list
//!       meshes    u32 count, then one frame per mesh:
//!         type u32, name, sphere 4xf32, geometry (rigid / animated, anything else skipped)
//! ```
//! Strings are a `u32` byte length followed by the bytes.

use log::info;

use crate::{
    data_structures::archive::{
        Archive, Geometry, LEGACY_FORMAT, MaterialFlags, Mesh, MeshKind, Surface, Transform,
        VertexBuffer,
    },
    resources::cursor::{ByteCursor, ParseError, ParseResult},
};

/// On-disk size of one vertex: position, normal, rgba, uv.
const VERTEX_STRIDE: usize = 3 * 4 + 3 * 4 + 4 + 2 * 4;

/// Parses one archive. Pure over its input; the cursor never outlives the call.
pub fn parse_archive(bytes: &[u8]) -> ParseResult<Archive> {
    let mut cursor = ByteCursor::new(bytes);

    let format = cursor.read_u32()?;

    cursor.push()?;
    let name = cursor.read_string()?;

    cursor.push()?;
    let transforms = read_list(&mut cursor, read_transform)?;
    let textures = read_list(&mut cursor, ByteCursor::read_string)?;

    cursor.push()?;
    let num_meshes = cursor.read_u32()?;
    let mut meshes = Vec::new();
    for _ in 0..num_meshes {
        meshes.push(read_mesh(&mut cursor, format)?);
    }

    // mesh list, scene, body
    for _ in 0..3 {
        cursor.skip()?;
    }

    Ok(Archive {
        format,
        name,
        transforms,
        textures,
        meshes,
    })
}

fn read_list<'a, T>(
    cursor: &mut ByteCursor<'a>,
    mut read: impl FnMut(&mut ByteCursor<'a>) -> ParseResult<T>,
) -> ParseResult<Vec<T>> {
    let count = cursor.read_u32()?;
    // counts come from untrusted bytes; let the reads fail instead of preallocating
    let mut out = Vec::new();
    for _ in 0..count {
        out.push(read(cursor)?);
    }
    Ok(out)
}

fn read_transform(cursor: &mut ByteCursor) -> ParseResult<Transform> {
    Ok(Transform {
        name: cursor.read_string()?,
        parent: cursor.read_i32()?,
        rotation: cursor.read_f32s()?,
        translation: cursor.read_f32s()?,
    })
}

fn read_vertices(cursor: &mut ByteCursor) -> ParseResult<VertexBuffer> {
    let num_vertices = cursor.read_u32()?;
    // refuse counts the frame cannot hold before allocating for them
    let wanted = (num_vertices as usize).saturating_mul(VERTEX_STRIDE);
    if wanted > cursor.remaining() {
        return Err(ParseError::UnexpectedEof {
            offset: cursor.offset(),
            wanted,
            limit: cursor.limit(),
        });
    }
    let mut buffer = VertexBuffer::with_capacity(num_vertices);
    for _ in 0..num_vertices {
        buffer.positions.extend(cursor.read_f32s::<3>()?);
        buffer.normals.extend(cursor.read_f32s::<3>()?);
        for _ in 0..4 {
            buffer.colors.push(cursor.read_u8()?);
        }
        buffer.uv.extend(cursor.read_f32s::<2>()?);
    }
    Ok(buffer)
}

fn read_surface(cursor: &mut ByteCursor, format: u32, animated: bool) -> ParseResult<Surface> {
    let texture_id = cursor.read_i32()?;
    let material = MaterialFlags::from(cursor.read_u32()?);
    let num_vertices = if animated {
        Some(cursor.read_u32()?)
    } else {
        None
    };
    let indices = read_list(cursor, ByteCursor::read_u16)?;
    let alternate_textures = if format == LEGACY_FORMAT {
        Vec::new()
    } else {
        read_list(cursor, ByteCursor::read_string)?
    };
    Ok(Surface {
        texture_id,
        material,
        num_vertices,
        indices,
        alternate_textures,
    })
}

fn read_rigid(cursor: &mut ByteCursor, format: u32) -> ParseResult<Geometry> {
    let surfaces = read_list(cursor, |c| read_surface(c, format, false))?;
    let mut vertices = Vec::with_capacity(surfaces.len());
    for _ in 0..surfaces.len() {
        vertices.push(read_vertices(cursor)?);
    }
    Ok(Geometry::Rigid { surfaces, vertices })
}

fn read_animated(cursor: &mut ByteCursor, format: u32) -> ParseResult<Geometry> {
    let vertices = read_vertices(cursor)?;
    let surfaces = read_list(cursor, |c| read_surface(c, format, true))?;
    Ok(Geometry::Animated { vertices, surfaces })
}

fn read_mesh(cursor: &mut ByteCursor, format: u32) -> ParseResult<Mesh> {
    cursor.push()?;

    let kind = MeshKind::from(cursor.read_u32()?);
    let name = cursor.read_string()?;
    let sphere = cursor.read_f32s()?;

    let geometry = match kind {
        MeshKind::Rigid => read_rigid(cursor, format)?,
        MeshKind::Animated => read_animated(cursor, format)?,
        other => {
            info!("Skipping geometry of mesh {name:?}: {other:?} meshes are not decodable");
            Geometry::Unknown
        }
    };
    cursor.skip()?;

    Ok(Mesh {
        kind,
        name,
        sphere,
        geometry,
    })
}
