use glam::Vec3;
use pcbench_data::{DEFAULT_COLOR, DataError, Point, PointCloud, load_folder, load_ply, write_ply};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_ascii_ply(path: &Path, header_props: &[&str], rows: &[&str]) {
    let mut text = String::from("ply\nformat ascii 1.0\n");
    text.push_str(&format!("element vertex {}\n", rows.len()));
    for prop in header_props {
        text.push_str(&format!("property {prop}\n"));
    }
    text.push_str("end_header\n");
    for row in rows {
        text.push_str(row);
        text.push('\n');
    }
    fs::write(path, text).unwrap();
}

#[test]
fn test_load_colored_ply() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("frame.ply");
    write_ascii_ply(
        &path,
        &[
            "float x",
            "float y",
            "float z",
            "uchar red",
            "uchar green",
            "uchar blue",
        ],
        &["0 0 0 255 0 0", "1 2 3 0 128 255"],
    );

    let mesh = load_ply(&path).unwrap();
    assert_eq!(mesh.cloud.len(), 2);
    assert_eq!(mesh.cloud.points[1].position, Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(mesh.cloud.points[1].color, [0, 128, 255]);
    assert_eq!(mesh.face_count, 0);
    assert!(mesh.has_field("red"));
}

#[test]
fn test_load_uncolored_ply_uses_default() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("plain.ply");
    write_ascii_ply(&path, &["float x", "float y", "float z"], &["0.5 0.25 1"]);

    let mesh = load_ply(&path).unwrap();
    assert_eq!(mesh.cloud.points[0].color, DEFAULT_COLOR);
}

#[test]
fn test_load_packed_float_rgb() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pcl.ply");
    let red = f32::from_bits(0x00ff_0000);
    let mixed = f32::from_bits(0x00ff_8040);
    write_ascii_ply(
        &path,
        &["float x", "float y", "float z", "float rgb"],
        &[&format!("0 0 0 {red:e}"), &format!("1 1 1 {mixed:e}")],
    );

    let mesh = load_ply(&path).unwrap();
    assert!(mesh.has_field("rgb"));
    assert_eq!(mesh.cloud.points[0].color, [255, 0, 0]);
    assert_eq!(mesh.cloud.points[1].color, [255, 128, 64]);
}

#[test]
fn test_load_packed_uint_rgba_ignores_alpha() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pcl_rgba.ply");
    let packed = 0xff10_2030u32;
    write_ascii_ply(
        &path,
        &["float x", "float y", "float z", "uint rgba"],
        &[&format!("0.5 0.5 0.5 {packed}")],
    );

    let mesh = load_ply(&path).unwrap();
    assert_eq!(mesh.cloud.points[0].color, [0x10, 0x20, 0x30]);
}

#[test]
fn test_write_then_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out.ply");
    let cloud = PointCloud::new(vec![
        Point::new(Vec3::new(0.125, 0.5, 0.75), [10, 20, 30]),
        Point::new(Vec3::new(1.0, 0.0, 0.25), [200, 100, 0]),
    ]);

    write_ply(&path, &cloud).unwrap();
    let loaded = load_ply(&path).unwrap();
    assert_eq!(loaded.cloud, cloud);
}

#[test]
fn test_load_folder_sorted_and_filtered() {
    let dir = tempdir().unwrap();
    let props = ["float x", "float y", "float z"];
    write_ascii_ply(&dir.path().join("frame_002.ply"), &props, &["2 2 2"]);
    write_ascii_ply(&dir.path().join("frame_000.ply"), &props, &["0 0 0"]);
    write_ascii_ply(&dir.path().join("frame_001.ply"), &props, &["1 1 1", "1 1 1"]);
    fs::write(dir.path().join("notes.txt"), "not a cloud").unwrap();

    let folder = load_folder(dir.path()).unwrap();
    assert_eq!(folder.len(), 3);
    assert_eq!(folder.frames[0].points[0].position, Vec3::ZERO);
    assert_eq!(folder.frames[1].len(), 2);
    assert_eq!(folder.frames[2].points[0].position, Vec3::splat(2.0));
    assert_eq!(folder.metadata[0].original_file_name, "frame_000.ply");
    assert!(folder.metadata[0].original_file_size > 0);
    assert!(folder.metadata[0].has_coords);
    assert!(!folder.metadata[0].has_colors);
}

#[test]
fn test_metadata_detects_normals() {
    let dir = tempdir().unwrap();
    write_ascii_ply(
        &dir.path().join("n.ply"),
        &[
            "float x",
            "float y",
            "float z",
            "float normal_x",
            "float normal_y",
            "float normal_z",
        ],
        &["0 0 0 0 0 1"],
    );

    let folder = load_folder(dir.path()).unwrap();
    assert!(folder.metadata[0].has_normals);
    assert!(!folder.metadata[0].has_colors);
}

#[test]
fn test_load_folder_not_a_directory() {
    let result = load_folder(Path::new("/non/existent/path"));
    assert!(matches!(result, Err(DataError::NotADirectory(_))));
}

#[test]
fn test_load_folder_without_ply_files() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("readme.md"), "nothing here").unwrap();
    let result = load_folder(dir.path());
    assert!(matches!(result, Err(DataError::EmptyFolder(_))));
}
