//! PNG cell-tag boundary.
//!
//! The grid geometry travels with the atlas as a pair of `tEXt` chunks,
//! keyed `CellWidth` / `CellLength` (the generic metadata schema's
//! cell-dimension tag pair). The `image` crate's PNG encoder cannot attach
//! text chunks, so the write path drives the `png` encoder directly; input
//! decoding stays on `image`.

use anyhow::{Context, Result};
use image::RgbaImage;
use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

pub const CELL_WIDTH_KEY: &str = "CellWidth";
pub const CELL_LENGTH_KEY: &str = "CellLength";

/// Encode `image` as RGBA8 PNG at `path` with the cell tags attached.
pub fn save_with_cell_tags(path: &Path, image: &RgbaImage, cell: (u32, u32)) -> Result<()> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), image.width(), image.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.add_text_chunk(CELL_WIDTH_KEY.into(), cell.0.to_string())?;
    encoder.add_text_chunk(CELL_LENGTH_KEY.into(), cell.1.to_string())?;
    let mut writer = encoder
        .write_header()
        .with_context(|| format!("encode {}", path.display()))?;
    writer.write_image_data(image.as_raw())?;
    writer.finish()?;
    Ok(())
}

/// Recover the cell tag pair from a PNG without decoding pixel data.
/// `None` when either tag is absent or unparseable.
pub fn read_cell_tags(path: &Path) -> Result<Option<(u32, u32)>> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let reader = png::Decoder::new(BufReader::new(file))
        .read_info()
        .with_context(|| format!("read {}", path.display()))?;
    let mut width = None;
    let mut height = None;
    for chunk in &reader.info().uncompressed_latin1_text {
        match chunk.keyword.as_str() {
            CELL_WIDTH_KEY => width = chunk.text.parse().ok(),
            CELL_LENGTH_KEY => height = chunk.text.parse().ok(),
            _ => {}
        }
    }
    Ok(width.zip(height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn cell_tags_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("tagged.png");
        let img = RgbaImage::from_pixel(4, 4, Rgba([1, 2, 3, 255]));
        save_with_cell_tags(&path, &img, (3, 5)).unwrap();
        assert_eq!(read_cell_tags(&path).unwrap(), Some((3, 5)));
        // Tags ride along without disturbing the pixel payload.
        let decoded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (4, 4));
        assert_eq!(decoded.get_pixel(0, 0), &Rgba([1, 2, 3, 255]));
    }

    #[test]
    fn untagged_png_reads_as_none() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("plain.png");
        RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255])).save(&path).unwrap();
        assert_eq!(read_cell_tags(&path).unwrap(), None);
    }
}
