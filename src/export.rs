// export.rs - BMP snapshots of rendered frames
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use image::codecs::bmp::BmpEncoder;
use image::{ExtendedColorType, ImageEncoder};
use log::info;

use crate::core::target::{Resolution, TargetBuffer};
use crate::math::unpack;

/// File name of the `index`-th snapshot: `mandel0001.bmp`, `mandel0002.bmp`, …
pub fn snapshot_name(index: u32) -> String {
    format!("mandel{:04}.bmp", index)
}

/// Write packed `0x00RRGGBB` pixels as a 24-bit BMP.
///
/// `pixels` is row-major, top row first; BMP stores rows bottom-up and the
/// encoder takes care of the flip.
pub fn export_bmp(path: &Path, pixels: &[u32], resolution: Resolution) -> Result<()> {
    if resolution.is_empty() {
        bail!("Cannot export an empty {}x{} image", resolution.width, resolution.height);
    }
    if pixels.len() != resolution.pixel_count() {
        bail!(
            "Pixel buffer holds {} pixels, {}x{} needs {}",
            pixels.len(),
            resolution.width,
            resolution.height,
            resolution.pixel_count()
        );
    }

    let rgb: Vec<u8> = pixels.iter().flat_map(|&p| unpack(p)).collect();

    let file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    BmpEncoder::new(&mut writer)
        .write_image(
            &rgb,
            resolution.width,
            resolution.height,
            ExtendedColorType::Rgb8,
        )
        .with_context(|| format!("Failed to encode {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Numbered snapshot writer
#[derive(Debug, Clone)]
pub struct Exporter {
    dir: PathBuf,
    next: u32,
    scratch: Vec<u32>,
}

impl Exporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            next: 1,
            scratch: Vec::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of snapshots written so far
    pub fn count(&self) -> u32 {
        self.next - 1
    }

    /// Save `frame` under the next free number and return its path
    pub fn save(&mut self, frame: &TargetBuffer) -> Result<PathBuf> {
        let path = self.dir.join(snapshot_name(self.next));
        frame.copy_into(&mut self.scratch);
        export_bmp(&path, &self.scratch, frame.resolution())?;
        self.next += 1;
        info!("Exported {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_names_are_zero_padded() {
        assert_eq!(snapshot_name(1), "mandel0001.bmp");
        assert_eq!(snapshot_name(42), "mandel0042.bmp");
        assert_eq!(snapshot_name(12345), "mandel12345.bmp");
    }

    #[test]
    fn size_mismatch_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.bmp");
        assert!(export_bmp(&path, &[0; 5], Resolution::new(2, 2)).is_err());
        assert!(export_bmp(&path, &[], Resolution::new(0, 2)).is_err());
    }

    #[test]
    fn exporter_numbers_files() {
        let dir = tempfile::tempdir().unwrap();
        let frame = TargetBuffer::new(Resolution::new(2, 1));
        frame.write_row(0, 1, &[0, 0x00FF_FFFF]);

        let mut exporter = Exporter::new(dir.path());
        let first = exporter.save(&frame).unwrap();
        let second = exporter.save(&frame).unwrap();
        assert!(first.ends_with("mandel0001.bmp"));
        assert!(second.ends_with("mandel0002.bmp"));
        assert!(second.exists());
        assert_eq!(exporter.count(), 2);
    }
}
