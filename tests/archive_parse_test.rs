use flow_nature::{
    data_structures::archive::{Geometry, MaterialFlags, MeshKind},
    resources::{cursor::ParseError, pba::parse_archive},
};

use crate::common::test_utils::{
    ALPHA, ALPHA_TEST, ArchiveWriter, FLEXIBLE, NONE, SHADOW, SurfaceSpec, init_logger,
    tree_archive,
};

mod common;

#[test]
fn parses_tree_archive() {
    init_logger();
    let archive = parse_archive(&tree_archive()).unwrap();

    assert_eq!(archive.format, 2);
    assert!(!archive.is_legacy());
    assert_eq!(archive.name, "Tree");
    assert_eq!(archive.textures, vec!["bark", "leaf"]);
    assert_eq!(archive.transforms.len(), 1);
    assert!(archive.transforms[0].is_root());
    assert_eq!(archive.transforms[0].rotation, [1.0, 0.0, 0.0, 0.0]);

    let mesh = &archive.meshes[0];
    assert_eq!(mesh.kind, MeshKind::Rigid);
    assert_eq!(mesh.name, "Tree");
    assert_eq!(mesh.sphere, [0.0, 1.0, 0.0, 2.5]);

    let Geometry::Rigid { surfaces, vertices } = &mesh.geometry else {
        panic!("expected rigid geometry, got {:?}", mesh.geometry);
    };
    assert_eq!(surfaces.len(), vertices.len());
    assert_eq!(surfaces[0].material, MaterialFlags::None);
    assert_eq!(surfaces[1].material, MaterialFlags::AlphaTest);
    assert_eq!(surfaces[1].texture_id, 1);
    assert_eq!(surfaces[0].indices, vec![0, 1, 2]);
    assert_eq!(surfaces[0].num_vertices, None);
    assert_eq!(vertices[0].num_vertices, 3);
    assert_eq!(vertices[1].num_vertices, 4);
    for buffer in vertices {
        assert!(buffer.is_consistent());
    }
    assert_eq!(&vertices[1].positions[9..12], &[3.0, 0.0, 0.0]);
    assert_eq!(&vertices[0].colors[..4], &[255, 128, 64, 32]);
}

#[test]
fn parsing_is_deterministic() {
    let bytes = tree_archive();
    assert_eq!(parse_archive(&bytes).unwrap(), parse_archive(&bytes).unwrap());
}

#[test]
fn legacy_format_has_no_alternate_textures() {
    let bytes = ArchiveWriter::new(1, "bush")
        .texture("bush")
        .rigid_mesh("bush", &[SurfaceSpec::new(0, SHADOW).alternates(&["ignored"])])
        .build();
    let archive = parse_archive(&bytes).unwrap();

    assert!(archive.is_legacy());
    let surface = &archive.meshes[0].geometry.surfaces()[0];
    assert!(surface.alternate_textures.is_empty());
    assert_eq!(surface.material, MaterialFlags::Shadow);
}

#[test]
fn current_format_keeps_alternate_textures() {
    let bytes = ArchiveWriter::new(2, "bush")
        .texture("bush")
        .rigid_mesh(
            "bush",
            &[SurfaceSpec::new(0, NONE).alternates(&["bush_winter", "bush_dry"])],
        )
        .build();
    let archive = parse_archive(&bytes).unwrap();

    assert_eq!(
        archive.meshes[0].geometry.surfaces()[0].alternate_textures,
        vec!["bush_winter", "bush_dry"]
    );
}

#[test]
fn animated_mesh_shares_one_buffer() {
    let bytes = ArchiveWriter::new(2, "flag")
        .texture("cloth")
        .animated_mesh(
            "flag",
            6,
            &[
                SurfaceSpec::new(0, ALPHA).vertices(4),
                SurfaceSpec::new(0, NONE).vertices(2),
            ],
        )
        .build();
    let archive = parse_archive(&bytes).unwrap();
    let geometry = &archive.meshes[0].geometry;

    let Geometry::Animated { vertices, surfaces } = geometry else {
        panic!("expected animated geometry, got {geometry:?}");
    };
    assert_eq!(vertices.num_vertices, 6);
    assert!(vertices.is_consistent());
    assert_eq!(surfaces[0].num_vertices, Some(4));
    assert_eq!(surfaces[1].num_vertices, Some(2));
    assert!(std::ptr::eq(
        geometry.vertices_for(0).unwrap(),
        geometry.vertices_for(1).unwrap()
    ));
    assert!(geometry.vertices_for(2).is_none());
}

#[test]
fn undecodable_mesh_does_not_disturb_its_neighbours() {
    let bytes = ArchiveWriter::new(2, "camp")
        .texture("tent")
        .rigid_mesh("pole", &[SurfaceSpec::new(0, NONE)])
        .opaque_mesh(FLEXIBLE, "canvas", &[0xff; 37])
        .rigid_mesh("peg", &[SurfaceSpec::new(0, ALPHA_TEST)])
        .build();
    let archive = parse_archive(&bytes).unwrap();

    let names: Vec<_> = archive.meshes.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, ["pole", "canvas", "peg"]);
    assert_eq!(archive.meshes[1].kind, MeshKind::Flexible);
    assert!(archive.meshes[1].geometry.is_unknown());
    assert_eq!(archive.meshes[1].sphere, [0.0, 1.0, 0.0, 2.5]);
    assert_eq!(
        archive.meshes[2].geometry.surfaces()[0].material,
        MaterialFlags::AlphaTest
    );
}

#[test]
fn unknown_trailing_mesh_fields_are_skipped() {
    let bytes = ArchiveWriter::new(2, "rock")
        .texture("stone")
        .rigid_mesh_with_trailer("rock", &[SurfaceSpec::new(0, NONE)], &[1, 2, 3, 4, 5])
        .rigid_mesh("pebble", &[SurfaceSpec::new(0, NONE)])
        .build();
    let archive = parse_archive(&bytes).unwrap();

    assert_eq!(archive.meshes.len(), 2);
    assert_eq!(archive.meshes[1].name, "pebble");
}

#[test]
fn truncated_archive_is_a_framing_error() {
    let bytes = tree_archive();
    let err = parse_archive(&bytes[..bytes.len() - 1]).unwrap_err();
    assert!(matches!(err, ParseError::FrameOverrun { .. }), "{err}");
}

#[test]
fn empty_buffer_is_a_framing_error() {
    assert_eq!(
        parse_archive(&[]),
        Err(ParseError::UnexpectedEof {
            offset: 0,
            wanted: 4,
            limit: 0
        })
    );
}
