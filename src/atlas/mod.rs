//! Grid atlas packing & inspection.
//!
//! Combines a set of same-format sprites into one square-grid sheet sized to
//! a uniform cell, and derives the geometry a consumer needs to slice the
//! sheet apart again. Pure packing (`pack_images`) is separated from path
//! policy and writes (`pack_directory` / `write_outputs`) so the core can be
//! fed in-memory images directly.

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use image::{imageops, RgbaImage};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::meta;

/// Literal appended to the digit-stripped stem when deriving the output name.
pub const ATLAS_SUFFIX: &str = "atlas";

#[derive(Clone, Debug)]
pub struct PackConfig {
    pub input_dir: PathBuf,
    pub cell_size_policy: CellSizePolicy,
    pub out_png: Option<PathBuf>,
    pub out_json: Option<PathBuf>,
    pub write_manifest: bool,
}

/// How the uniform cell is sized from the input dimensions.
///
/// `Min` sizes the cell to the smallest input: larger sprites overflow into
/// neighboring cells (later pastes overwrite the spill). `Max` sizes the
/// cell to fit every sprite.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum CellSizePolicy {
    Min,
    Max,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GridDescriptor {
    pub grid_size: u32,
    pub cell_width: u32,
    pub cell_height: u32,
}

/// One decoded input, normalized to RGBA8. `name` is the file stem.
pub struct SourceImage {
    pub name: String,
    pub image: RgbaImage,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RectPx { pub x: u32, pub y: u32, pub w: u32, pub h: u32 }
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UvRect { pub u0: f32, pub v0: f32, pub u1: f32, pub v1: f32 }
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FrameEntry { pub name: String, pub index: u32, pub px: RectPx, pub uv: UvRect }
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AtlasManifest {
    pub version: u32,
    pub cell_width: u32,
    pub cell_height: u32,
    pub grid_size: u32,
    pub atlas_width: u32,
    pub atlas_height: u32,
    pub frames: Vec<FrameEntry>,
}

pub struct AtlasArtifact {
    pub image: RgbaImage,
    pub descriptor: GridDescriptor,
    pub manifest: AtlasManifest,
    pub png_path: PathBuf,
    pub json_path: PathBuf,
}

pub struct Inspection {
    pub atlas_dim: (u32, u32),
    pub cell: Option<(u32, u32)>,
    pub grid_size: Option<u32>,
    pub occupied: u32,
    pub total_cells: u32,
}

/// Smallest `g >= 1` with `g*g >= count`.
pub fn grid_size_for(count: usize) -> u32 {
    let mut g: u32 = 1;
    while (g as usize) * (g as usize) < count {
        g += 1;
    }
    g
}

pub fn cell_size(images: &[SourceImage], policy: CellSizePolicy) -> (u32, u32) {
    let dims = images.iter().map(|s| s.image.dimensions());
    match policy {
        CellSizePolicy::Min => dims.fold((u32::MAX, u32::MAX), |(w, h), (iw, ih)| (w.min(iw), h.min(ih))),
        CellSizePolicy::Max => dims.fold((0, 0), |(w, h), (iw, ih)| (w.max(iw), h.max(ih))),
    }
}

/// Output name derived from an input name: stem with every digit character
/// removed, then the `atlas` suffix and the `.png` extension.
pub fn derive_atlas_filename(sample: &Path) -> String {
    let stem = sample.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    let base: String = stem.chars().filter(|c| !c.is_ascii_digit()).collect();
    format!("{base}{ATLAS_SUFFIX}.png")
}

/// Sorted `.png` paths directly under `dir`.
pub fn collect_inputs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("list inputs in {}", dir.display()))? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().map_or(false, |e| e.eq_ignore_ascii_case("png")) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn load_images(paths: &[PathBuf]) -> Result<Vec<SourceImage>> {
    let mut sources = Vec::with_capacity(paths.len());
    for path in paths {
        let image = image::open(path)
            .with_context(|| format!("decode {}", path.display()))?
            .to_rgba8();
        let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default().to_string();
        sources.push(SourceImage { name, image });
    }
    Ok(sources)
}

/// Core packing step: square grid, uniform cell, row-major placement.
///
/// Pastes overwrite destination pixels including alpha (no blending), in
/// index order, so an oversized sprite's spill is overwritten by the next
/// cell's paste. Cells past the last input stay transparent.
pub fn pack_images(images: &[SourceImage], policy: CellSizePolicy) -> Result<(RgbaImage, GridDescriptor)> {
    if images.is_empty() {
        bail!("no images to pack");
    }
    let grid_size = grid_size_for(images.len());
    let (cell_width, cell_height) = cell_size(images, policy);
    let mut canvas = RgbaImage::new(cell_width * grid_size, cell_height * grid_size);
    for (i, src) in images.iter().enumerate() {
        let (w, h) = src.image.dimensions();
        if w > cell_width || h > cell_height {
            eprintln!(
                "warning: sprite '{}' {}x{} exceeds cell {}x{}, overflowing into neighbors",
                src.name, w, h, cell_width, cell_height
            );
        }
        let col = i as u32 % grid_size;
        let row = i as u32 / grid_size;
        imageops::replace(&mut canvas, &src.image, (col * cell_width) as i64, (row * cell_height) as i64);
    }
    Ok((canvas, GridDescriptor { grid_size, cell_width, cell_height }))
}

pub fn build_manifest(images: &[SourceImage], desc: GridDescriptor) -> AtlasManifest {
    let (g, cw, ch) = (desc.grid_size, desc.cell_width, desc.cell_height);
    let (atlas_width, atlas_height) = (cw * g, ch * g);
    let frames = images
        .iter()
        .enumerate()
        .map(|(i, src)| {
            let x = i as u32 % g * cw;
            let y = i as u32 / g * ch;
            FrameEntry {
                name: src.name.clone(),
                index: i as u32,
                px: RectPx { x, y, w: cw, h: ch },
                uv: UvRect {
                    u0: x as f32 / atlas_width as f32,
                    v0: y as f32 / atlas_height as f32,
                    u1: (x + cw) as f32 / atlas_width as f32,
                    v1: (y + ch) as f32 / atlas_height as f32,
                },
            }
        })
        .collect();
    AtlasManifest { version: 1, cell_width: cw, cell_height: ch, grid_size: g, atlas_width, atlas_height, frames }
}

/// Scan, decode, and pack a directory of sprites. Performs no writes; the
/// derived output path is excluded from the inputs so a previous atlas is
/// never packed into its replacement.
pub fn pack_directory(cfg: &PackConfig) -> Result<AtlasArtifact> {
    let mut paths = collect_inputs(&cfg.input_dir)?;
    if paths.is_empty() {
        bail!("no .png inputs in {}", cfg.input_dir.display());
    }
    let png_path = cfg
        .out_png
        .clone()
        .unwrap_or_else(|| cfg.input_dir.join(derive_atlas_filename(&paths[0])));
    let json_path = cfg.out_json.clone().unwrap_or_else(|| png_path.with_extension("json"));
    paths.retain(|p| *p != png_path);
    if paths.is_empty() {
        bail!("only a previous atlas found in {}", cfg.input_dir.display());
    }
    let sources = load_images(&paths)?;
    let (image, descriptor) = pack_images(&sources, cfg.cell_size_policy)?;
    let manifest = build_manifest(&sources, descriptor);
    Ok(AtlasArtifact { image, descriptor, manifest, png_path, json_path })
}

/// Last-writer-wins: a pre-existing file at the output path is deleted before
/// the new atlas (and optional manifest sidecar) is written.
pub fn write_outputs(artifact: &AtlasArtifact, cfg: &PackConfig) -> Result<()> {
    if artifact.png_path.exists() {
        fs::remove_file(&artifact.png_path)
            .with_context(|| format!("remove previous atlas {}", artifact.png_path.display()))?;
    }
    let d = artifact.descriptor;
    meta::save_with_cell_tags(&artifact.png_path, &artifact.image, (d.cell_width, d.cell_height))?;
    if cfg.write_manifest {
        let json = serde_json::to_string_pretty(&artifact.manifest)?;
        fs::write(&artifact.json_path, json)
            .with_context(|| format!("write manifest {}", artifact.json_path.display()))?;
    }
    Ok(())
}

fn cell_occupied(img: &RgbaImage, x0: u32, y0: u32, cw: u32, ch: u32) -> bool {
    for y in y0..y0 + ch {
        for x in x0..x0 + cw {
            if img.get_pixel(x, y)[3] != 0 {
                return true;
            }
        }
    }
    false
}

/// Read-back half of the metadata contract: recover cell tags from an atlas
/// and report the implied grid plus how many cells hold any opaque pixel.
pub fn inspect(png_path: &Path) -> Result<Inspection> {
    let cell = meta::read_cell_tags(png_path)?;
    let img = image::open(png_path)
        .with_context(|| format!("decode {}", png_path.display()))?
        .to_rgba8();
    let (w, h) = img.dimensions();
    let mut grid_size = None;
    let mut occupied = 0;
    let mut total_cells = 0;
    if let Some((cw, ch)) = cell {
        if cw > 0 && ch > 0 {
            grid_size = Some(w / cw);
            for row in 0..h / ch {
                for col in 0..w / cw {
                    total_cells += 1;
                    if cell_occupied(&img, col * cw, row * ch, cw, ch) {
                        occupied += 1;
                    }
                }
            }
        }
    }
    Ok(Inspection { atlas_dim: (w, h), cell, grid_size, occupied, total_cells })
}
