//! Integration checks over the scene descriptor table and the CPU-side
//! geometry it references. No GPU required.

use cgmath::{EuclideanSpace, Matrix4, Point3, Transform};
use tabletop::{
    resources::primitives::{self, Shape},
    scene::{tabletop_objects, Finish, TextureSlot},
};

#[test]
fn every_referenced_shape_has_geometry() {
    let objects = tabletop_objects();
    for desc in &objects {
        let data = primitives::generate(desc.shape);
        assert!(
            !data.indices.is_empty(),
            "{} references an empty mesh",
            desc.name
        );
    }
}

#[test]
fn all_objects_sit_on_or_above_the_table() {
    // The table top is at y = 0.8; everything else rests on it.
    let objects = tabletop_objects();
    for desc in &objects {
        assert!(
            desc.translation[1] >= 0.8,
            "{} is below the table",
            desc.name
        );
    }
}

#[test]
fn transforms_compose_translation_last() {
    let objects = tabletop_objects();
    let table = objects.iter().find(|d| d.name == "table").unwrap();
    let matrix: Matrix4<f32> = table.to_instance().to_matrix();
    // The mesh origin lands exactly at the descriptor's translation.
    let origin = matrix.transform_point(Point3::origin());
    assert_eq!(
        [origin.x, origin.y, origin.z],
        table.translation,
        "translation must apply after scale and rotation"
    );
    // The plane spans 8 units in x once scaled.
    let corner = matrix.transform_point(Point3::new(1.0, 0.0, 0.0));
    assert!((corner.x - 8.0).abs() < 1e-5);
}

#[test]
fn laptop_parts_cluster_around_the_laptop_base() {
    let objects = tabletop_objects();
    let base = objects.iter().find(|d| d.name == "laptop_base").unwrap();
    for name in ["laptop_screen", "logo_disc_left", "logo_disc_right", "logo_bar"] {
        let part = objects.iter().find(|d| d.name == name).unwrap();
        let dx = part.translation[0] - base.translation[0];
        let dz = part.translation[2] - base.translation[2];
        assert!(
            dx.abs() <= 4.0 && dz.abs() <= 2.0,
            "{} strayed from the laptop",
            name
        );
    }
}

#[test]
fn lamp_hardware_shares_one_material() {
    // Stands and bases all use the mouse texture, so the batcher can fold
    // them into two batches (one per shape).
    let objects = tabletop_objects();
    let lamp_parts = objects
        .iter()
        .filter(|d| d.name.starts_with("lamp_"))
        .collect::<Vec<_>>();
    assert_eq!(lamp_parts.len(), 4);
    for part in lamp_parts {
        assert_eq!(part.finish, Finish::Textured(TextureSlot::Mouse));
    }
}

#[test]
fn texture_files_have_unique_names() {
    for (i, a) in TextureSlot::ALL.iter().enumerate() {
        for b in &TextureSlot::ALL[i + 1..] {
            assert_ne!(a.file_name(), b.file_name());
        }
    }
}

#[test]
fn shape_catalog_is_fully_exercised() {
    // Every shape except the lamp pyramid appears in the static table; the
    // pyramid is drawn by the lamp pass.
    let objects = tabletop_objects();
    for shape in Shape::ALL {
        if shape == Shape::Pyramid {
            assert!(objects.iter().all(|d| d.shape != Shape::Pyramid));
        } else {
            assert!(
                objects.iter().any(|d| d.shape == shape),
                "{} is never drawn",
                shape.name()
            );
        }
    }
}
