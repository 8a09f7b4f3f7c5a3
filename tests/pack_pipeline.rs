use image::{Rgba, RgbaImage};
use sprite_packer::atlas::{self, AtlasManifest, CellSizePolicy, PackConfig};
use sprite_packer::meta::read_cell_tags;
use std::fs;
use std::path::Path;

fn write_sprite(dir: &Path, name: &str, w: u32, h: u32, px: [u8; 4]) {
    RgbaImage::from_pixel(w, h, Rgba(px)).save(dir.join(name)).unwrap();
}

fn cfg_for(dir: &Path) -> PackConfig {
    PackConfig {
        input_dir: dir.to_path_buf(),
        cell_size_policy: CellSizePolicy::Min,
        out_png: None,
        out_json: None,
        write_manifest: false,
    }
}

#[test]
fn packs_directory_end_to_end() {
    let tmp = tempfile::tempdir().unwrap();
    write_sprite(tmp.path(), "face01.png", 6, 6, [255, 0, 0, 255]);
    write_sprite(tmp.path(), "face02.png", 6, 6, [0, 255, 0, 255]);
    let cfg = cfg_for(tmp.path());
    let artifact = atlas::pack_directory(&cfg).unwrap();
    atlas::write_outputs(&artifact, &cfg).unwrap();

    let out = tmp.path().join("faceatlas.png");
    assert!(out.exists(), "derived output name should be faceatlas.png");
    let sheet = image::open(&out).unwrap().to_rgba8();
    assert_eq!(sheet.dimensions(), (12, 12));
    assert_eq!(sheet.get_pixel(0, 0), &Rgba([255, 0, 0, 255]));
    assert_eq!(sheet.get_pixel(6, 0), &Rgba([0, 255, 0, 255]));
    assert_eq!(sheet.get_pixel(0, 6)[3], 0);
    assert_eq!(read_cell_tags(&out).unwrap(), Some((6, 6)));
}

#[test]
fn replaces_previous_atlas_instead_of_packing_it() {
    let tmp = tempfile::tempdir().unwrap();
    write_sprite(tmp.path(), "face01.png", 6, 6, [255, 0, 0, 255]);
    // Stale output from an earlier run, with different dimensions.
    write_sprite(tmp.path(), "faceatlas.png", 3, 3, [0, 0, 255, 255]);
    let cfg = cfg_for(tmp.path());
    let artifact = atlas::pack_directory(&cfg).unwrap();
    atlas::write_outputs(&artifact, &cfg).unwrap();

    let out = tmp.path().join("faceatlas.png");
    let sheet = image::open(&out).unwrap().to_rgba8();
    // Old content is gone: single 6x6 input means a 6x6 one-cell atlas.
    assert_eq!(sheet.dimensions(), (6, 6));
    assert_eq!(sheet.get_pixel(0, 0), &Rgba([255, 0, 0, 255]));
    assert_eq!(read_cell_tags(&out).unwrap(), Some((6, 6)));
}

#[test]
fn empty_directory_fails_before_any_output() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = cfg_for(tmp.path());
    assert!(atlas::pack_directory(&cfg).is_err());
    assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
}

#[test]
fn manifest_sidecar_describes_every_frame() {
    let tmp = tempfile::tempdir().unwrap();
    write_sprite(tmp.path(), "run1.png", 4, 4, [255, 0, 0, 255]);
    write_sprite(tmp.path(), "run2.png", 4, 4, [0, 255, 0, 255]);
    let mut cfg = cfg_for(tmp.path());
    cfg.write_manifest = true;
    let artifact = atlas::pack_directory(&cfg).unwrap();
    atlas::write_outputs(&artifact, &cfg).unwrap();

    let json = fs::read_to_string(tmp.path().join("runatlas.json")).unwrap();
    let manifest: AtlasManifest = serde_json::from_str(&json).unwrap();
    assert_eq!(manifest.cell_width, 4);
    assert_eq!(manifest.cell_height, 4);
    assert_eq!(manifest.grid_size, 2);
    assert_eq!((manifest.atlas_width, manifest.atlas_height), (8, 8));
    assert_eq!(manifest.frames.len(), 2);
    assert_eq!(manifest.frames[0].name, "run1");
    assert_eq!(manifest.frames[1].name, "run2");
    assert_eq!((manifest.frames[1].px.x, manifest.frames[1].px.y), (4, 0));
}

#[test]
fn inspect_recovers_geometry_and_occupancy() {
    let tmp = tempfile::tempdir().unwrap();
    write_sprite(tmp.path(), "tile01.png", 5, 5, [10, 20, 30, 255]);
    write_sprite(tmp.path(), "tile02.png", 5, 5, [40, 50, 60, 255]);
    let cfg = cfg_for(tmp.path());
    let artifact = atlas::pack_directory(&cfg).unwrap();
    atlas::write_outputs(&artifact, &cfg).unwrap();

    let res = atlas::inspect(&tmp.path().join("tileatlas.png")).unwrap();
    assert_eq!(res.atlas_dim, (10, 10));
    assert_eq!(res.cell, Some((5, 5)));
    assert_eq!(res.grid_size, Some(2));
    assert_eq!(res.total_cells, 4);
    assert_eq!(res.occupied, 2);
}

#[test]
fn explicit_output_path_is_honored() {
    let tmp = tempfile::tempdir().unwrap();
    write_sprite(tmp.path(), "gem1.png", 4, 4, [200, 0, 200, 255]);
    let mut cfg = cfg_for(tmp.path());
    cfg.out_png = Some(tmp.path().join("custom.png"));
    let artifact = atlas::pack_directory(&cfg).unwrap();
    atlas::write_outputs(&artifact, &cfg).unwrap();
    assert!(tmp.path().join("custom.png").exists());
    assert!(!tmp.path().join("gematlas.png").exists());
}
