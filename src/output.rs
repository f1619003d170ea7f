//! # Figure Output Module
//!
//! Creates the `<root>/<tipo>/<var>/<stat>` directory tree for a figure and
//! writes the rendered PNG into it.

use image::{ImageFormat, RgbaImage};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::figname::FigureName;

/// Creates (if needed) the directory a figure is stored in and returns it.
///
/// Creating an existing tree is not an error.
pub fn create_tree(root: &Path, name: &FigureName) -> Result<PathBuf> {
    let dir = name.output_dir(root);
    fs::create_dir_all(&dir)?;
    debug!("Output directory: {}", dir.display());
    Ok(dir)
}

/// Full path of a figure under `root`, without touching the filesystem
pub fn figure_path(root: &Path, name: &FigureName) -> PathBuf {
    name.output_dir(root).join(name.file_name())
}

/// Writes `image` as a PNG file, replacing any existing file.
pub fn save_png(image: &RgbaImage, path: &Path) -> Result<()> {
    debug!(
        "Writing {}x{} PNG to {}",
        image.width(),
        image.height(),
        path.display()
    );
    image.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{BLACK, WHITE};
    use tempfile::tempdir;

    #[test]
    fn test_create_tree_is_idempotent() {
        let dir = tempdir().unwrap();
        let name = FigureName::parse("F3_mensual_salinidad_media_50m_M07").unwrap();

        let out = create_tree(dir.path(), &name).unwrap();
        assert_eq!(out, dir.path().join("mensual").join("salinidad").join("media"));
        assert!(out.is_dir());
        assert_eq!(create_tree(dir.path(), &name).unwrap(), out);
        assert_eq!(
            figure_path(dir.path(), &name),
            out.join("F3_mensual_salinidad_media_50m_M07.png")
        );
    }

    #[test]
    fn test_save_png_overwrites() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fig.png");

        let mut img = RgbaImage::from_pixel(4, 3, WHITE);
        save_png(&img, &path).unwrap();
        img.put_pixel(1, 1, BLACK);
        save_png(&img, &path).unwrap();

        let read = image::open(&path).unwrap().to_rgba8();
        assert_eq!(read.dimensions(), (4, 3));
        assert_eq!(*read.get_pixel(1, 1), BLACK);
    }
}
